//! Managed environment enable / disable through the governance configuration endpoint.

use super::{ApiEndpoint, PresetError};
use crate::http::Method;
use crate::lro::{OperationRequest, TerminalRule};
use serde_json::{json, Value};

pub const GOVERNANCE_API_VERSION: &str = "2021-04-01";

fn governance_url(endpoint: &ApiEndpoint, environment_id: &str) -> Result<String, PresetError> {
    Ok(endpoint.url(
        &[
            "providers",
            "Microsoft.BusinessAppPlatform",
            "environments",
            environment_id,
            "governanceConfiguration",
        ],
        Some(GOVERNANCE_API_VERSION),
    )?)
}

/// Enable managed environment with the given governance settings
/// (`protectionLevel` is forced to `Standard`).
pub fn enable(
    endpoint: &ApiEndpoint,
    environment_id: &str,
    settings: Value,
) -> Result<OperationRequest, PresetError> {
    let mut body = match settings {
        Value::Object(map) => Value::Object(map),
        _ => json!({}),
    };
    body["protectionLevel"] = json!("Standard");
    Ok(OperationRequest::new(Method::Post, governance_url(endpoint, environment_id)?)
        .json(&body)?
        .accept([202, 204, 409])
        .completion(TerminalRule::lifecycle())
        .resubmit_on_failure(true))
}

pub fn disable(endpoint: &ApiEndpoint, environment_id: &str) -> Result<OperationRequest, PresetError> {
    Ok(OperationRequest::new(Method::Post, governance_url(endpoint, environment_id)?)
        .json(&json!({ "protectionLevel": "Basic" }))?
        .accept([202, 409])
        .completion(TerminalRule::lifecycle())
        .resubmit_on_failure(true))
}
