//! `lro preset <kind>` – run a built-in resource-kind operation.

use super::drive::{drive, print_completed, read_json_file};
use crate::cli::PresetKind;
use anyhow::Result;
use lro_core::config::LroConfig;
use lro_core::kinds::enterprise_policy::{policy_operation, PolicyAction};
use lro_core::kinds::{environment, managed_environment, tenant_isolation_policy, ApiEndpoint};
use lro_core::lro::OperationRequest;

pub(crate) fn build_preset(endpoint: &ApiEndpoint, kind: &PresetKind) -> Result<OperationRequest> {
    let req = match kind {
        PresetKind::CreateEnvironment { body } => {
            environment::create(endpoint, &read_json_file(body)?)?
        }
        PresetKind::UpdateEnvironment {
            environment_id,
            body,
        } => environment::update(endpoint, environment_id, &read_json_file(body)?)?,
        PresetKind::DeleteEnvironment { environment_id } => {
            environment::delete(endpoint, environment_id)?
        }
        PresetKind::AddDataverse {
            environment_id,
            body,
        } => environment::add_dataverse(endpoint, environment_id, &read_json_file(body)?)?,
        PresetKind::LinkPolicy {
            environment_id,
            policy_type,
            system_id,
        } => policy_operation(
            endpoint,
            environment_id,
            policy_type,
            system_id,
            PolicyAction::Link,
        )?,
        PresetKind::UnlinkPolicy {
            environment_id,
            policy_type,
            system_id,
        } => policy_operation(
            endpoint,
            environment_id,
            policy_type,
            system_id,
            PolicyAction::Unlink,
        )?,
        PresetKind::EnableManaged {
            environment_id,
            body,
        } => {
            let settings = match body {
                Some(path) => read_json_file(path)?,
                None => serde_json::json!({}),
            };
            managed_environment::enable(endpoint, environment_id, settings)?
        }
        PresetKind::DisableManaged { environment_id } => {
            managed_environment::disable(endpoint, environment_id)?
        }
        PresetKind::TenantIsolation { tenant_id, body } => {
            tenant_isolation_policy::put(endpoint, tenant_id, &read_json_file(body)?)?
        }
    };
    Ok(req)
}

pub async fn run_preset(cfg: &LroConfig, host: &str, kind: &PresetKind) -> Result<()> {
    let req = build_preset(&ApiEndpoint::new(host), kind)?;
    tracing::info!(method = %req.method, url = %req.url, "running preset");
    let completed = drive(cfg, req).await?;
    print_completed(&completed);
    Ok(())
}
