//! Enterprise policy link / unlink.
//!
//! The backend reports transient `Failed` lifecycle states for these mutations,
//! so both opt into resubmission.

use super::{ApiEndpoint, PresetError};
use crate::http::Method;
use crate::lro::{OperationRequest, TerminalRule};
use serde::Serialize;

pub const ENTERPRISE_POLICY_API_VERSION: &str = "2019-10-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    Link,
    Unlink,
}

impl PolicyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::Link => "link",
            PolicyAction::Unlink => "unlink",
        }
    }
}

#[derive(Debug, Serialize)]
struct LinkEnterprisePolicyDto<'a> {
    #[serde(rename = "SystemId")]
    system_id: &'a str,
}

/// Link or unlink policy `system_id` of `policy_type` (e.g. `NetworkInjection`)
/// on an environment.
pub fn policy_operation(
    endpoint: &ApiEndpoint,
    environment_id: &str,
    policy_type: &str,
    system_id: &str,
    action: PolicyAction,
) -> Result<OperationRequest, PresetError> {
    let url = endpoint.url(
        &[
            "providers",
            "Microsoft.BusinessAppPlatform",
            "environments",
            environment_id,
            "enterprisePolicies",
            policy_type,
            action.as_str(),
        ],
        Some(ENTERPRISE_POLICY_API_VERSION),
    )?;
    Ok(OperationRequest::new(Method::Post, url)
        .json(&LinkEnterprisePolicyDto { system_id })?
        .accept([202, 409])
        .completion(TerminalRule::lifecycle())
        .resubmit_on_failure(true))
}
