//! Tenant isolation policy PUT. Completion is signalled by status alone:
//! the operation URL answers 202 while running and 200 when done, after which
//! the policy itself is re-read.

use super::{ApiEndpoint, PresetError};
use crate::http::Method;
use crate::lro::{FollowUp, OperationRequest, TerminalRule};
use serde_json::Value;

pub fn policy_url(endpoint: &ApiEndpoint, tenant_id: &str) -> Result<String, PresetError> {
    Ok(endpoint.url(
        &[
            "providers",
            "PowerPlatform.Governance",
            "v1",
            "tenants",
            tenant_id,
            "tenantIsolationPolicy",
        ],
        None,
    )?)
}

pub fn put(
    endpoint: &ApiEndpoint,
    tenant_id: &str,
    policy: &Value,
) -> Result<OperationRequest, PresetError> {
    let url = policy_url(endpoint, tenant_id)?;
    Ok(OperationRequest::new(Method::Put, url.clone())
        .json(policy)?
        .accept([200, 202])
        .completion(TerminalRule::StatusOnly)
        .follow_up(FollowUp::get(url)))
}
