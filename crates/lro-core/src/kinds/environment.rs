//! Environment lifecycle mutations against the admin scope of the business
//! application platform.

use super::{ApiEndpoint, PresetError};
use crate::http::Method;
use crate::lro::{FollowUp, OperationRequest, StateVocabulary, TerminalRule};
use serde::Serialize;
use serde_json::Value;

pub const CREATE_API_VERSION: &str = "2023-06-01";
pub const UPDATE_API_VERSION: &str = "2021-04-01";

const PROVIDER: &str = "Microsoft.BusinessAppPlatform";

/// Reason code sent with a delete: "7" is "Application".
pub const DELETE_REASON_CODE: &str = "7";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct EnvironmentDeleteDto<'a> {
    code: &'a str,
    message: &'a str,
}

pub fn environment_url(
    endpoint: &ApiEndpoint,
    environment_id: &str,
    api_version: &str,
) -> Result<String, PresetError> {
    Ok(endpoint.url(
        &["providers", PROVIDER, "scopes", "admin", "environments", environment_id],
        Some(api_version),
    )?)
}

/// Management state an updated environment must reach before it is usable.
pub fn management_ready() -> TerminalRule {
    TerminalRule::StateField(
        StateVocabulary::new("properties.states.management.id", &["Ready"], &[])
            .strict_running(&["Running"]),
    )
}

/// A synchronous create answer has nothing left to poll: only `Succeeded` passes.
pub fn created_provisioning() -> TerminalRule {
    TerminalRule::StateField(
        StateVocabulary::new("properties.provisioningState", &["Succeeded"], &[])
            .strict_running(&[]),
    )
}

/// A 201 answers synchronously with the provisioned resource; a 202 is tracked
/// through the lifecycle operation. Either way the new environment is then read
/// back by the id the answer names.
pub fn create(endpoint: &ApiEndpoint, environment: &Value) -> Result<OperationRequest, PresetError> {
    let url = endpoint.url(&["providers", PROVIDER, "environments"], Some(CREATE_API_VERSION))?;
    let collection = endpoint.url(
        &["providers", PROVIDER, "scopes", "admin", "environments"],
        Some(CREATE_API_VERSION),
    )?;
    Ok(OperationRequest::new(Method::Post, url)
        .json(environment)?
        .accept([201, 202, 409])
        .completion(TerminalRule::lifecycle())
        .sync_rule(created_provisioning())
        .follow_up(FollowUp::id_from_body(
            &["links.environment.path", "name"],
            collection,
        )))
}

/// Patch an environment, then wait for its management state to settle.
pub fn update(
    endpoint: &ApiEndpoint,
    environment_id: &str,
    patch: &Value,
) -> Result<OperationRequest, PresetError> {
    let url = environment_url(endpoint, environment_id, UPDATE_API_VERSION)?;
    Ok(OperationRequest::new(Method::Patch, url.clone())
        .json(patch)?
        .accept([200, 202, 409])
        .completion(TerminalRule::lifecycle())
        .resubmit_on_failure(true)
        .follow_up(FollowUp::until_ready(url, management_ready())))
}

/// Delete an environment. A 404 answer means it is already gone.
pub fn delete(endpoint: &ApiEndpoint, environment_id: &str) -> Result<OperationRequest, PresetError> {
    let url = environment_url(endpoint, environment_id, CREATE_API_VERSION)?;
    let body = EnvironmentDeleteDto {
        code: DELETE_REASON_CODE,
        message: "Deleted using lro",
    };
    Ok(OperationRequest::new(Method::Delete, url)
        .json(&body)?
        .accept([202, 204, 404, 409])
        .completion(TerminalRule::lifecycle())
        .resubmit_on_failure(true))
}

/// Provision a Dataverse instance into an existing environment. The operation
/// resource reports `LinkedDatabaseProvisioning` until it settles; any other
/// state than that or `Succeeded` is a failure.
pub fn add_dataverse(
    endpoint: &ApiEndpoint,
    environment_id: &str,
    metadata: &Value,
) -> Result<OperationRequest, PresetError> {
    let url = endpoint.url(
        &["providers", PROVIDER, "environments", environment_id, "provisionInstance"],
        Some(UPDATE_API_VERSION),
    )?;
    let completion = TerminalRule::StateField(
        StateVocabulary::new("properties.provisioningState", &["Succeeded"], &[])
            .strict_running(&["LinkedDatabaseProvisioning"]),
    );
    Ok(OperationRequest::new(Method::Post, url)
        .json(metadata)?
        .accept([202, 409])
        .completion(completion))
}
