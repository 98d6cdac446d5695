//! CLI for driving management API operations to completion.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lro_core::config;
use lro_core::http::Method;
use lro_core::kinds::DEFAULT_BAPI_HOST;
use std::path::PathBuf;

use commands::{run_config, run_execute, run_preset};

#[derive(Debug, Parser)]
#[command(name = "lro")]
#[command(about = "Submit a management API mutation and wait for it to finish", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Submit an arbitrary mutation and track it to a terminal state.
    Execute(ExecuteArgs),

    /// Run a built-in resource-kind operation.
    Preset {
        /// Management API host.
        #[arg(long, default_value = DEFAULT_BAPI_HOST)]
        host: String,

        #[command(subcommand)]
        kind: PresetKind,
    },

    /// Show the config file path and effective settings.
    Config,
}

#[derive(Debug, Args)]
pub struct ExecuteArgs {
    /// HTTP method of the mutation.
    #[arg(long, default_value = "POST")]
    pub method: Method,

    /// Absolute URL of the mutation.
    #[arg(long)]
    pub url: String,

    /// File whose contents are sent as the JSON request body.
    #[arg(long, value_name = "FILE")]
    pub body: Option<PathBuf>,

    /// Extra request header, repeatable. Also sent on polls.
    #[arg(long = "header", value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Acceptable initial status, repeatable (default 200, 201, 202, 204, 409).
    #[arg(long = "accept", value_name = "STATUS")]
    pub accept: Vec<u16>,

    /// Dot path of the state field in poll responses.
    #[arg(long, default_value = "state.id", value_name = "PATH")]
    pub state_path: String,

    /// State value meaning success, repeatable.
    #[arg(long = "success", value_name = "STATE", default_value = "Succeeded")]
    pub success: Vec<String>,

    /// State value meaning failure, repeatable.
    #[arg(long = "failure", value_name = "STATE", default_value = "Failed")]
    pub failure: Vec<String>,

    /// Only these states mean "still running"; any other unknown state fails.
    #[arg(long = "running", value_name = "STATE")]
    pub running: Vec<String>,

    /// Ignore poll bodies: 202 is running, 200 is done.
    #[arg(long)]
    pub status_only: bool,

    /// Resubmit the mutation when it ends in a failed state.
    #[arg(long)]
    pub resubmit_on_failure: bool,

    /// Resource URL to GET once the operation succeeds.
    #[arg(long, value_name = "URL")]
    pub follow_up: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum PresetKind {
    /// Create an environment from a JSON definition.
    CreateEnvironment {
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },

    /// Patch an environment and wait until it is ready again.
    UpdateEnvironment {
        environment_id: String,
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },

    /// Delete an environment.
    DeleteEnvironment { environment_id: String },

    /// Provision Dataverse into an existing environment.
    AddDataverse {
        environment_id: String,
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },

    /// Link an enterprise policy to an environment.
    LinkPolicy {
        environment_id: String,
        /// Policy type, e.g. NetworkInjection or Encryption.
        policy_type: String,
        system_id: String,
    },

    /// Unlink an enterprise policy from an environment.
    UnlinkPolicy {
        environment_id: String,
        policy_type: String,
        system_id: String,
    },

    /// Turn an environment into a managed environment.
    EnableManaged {
        environment_id: String,
        /// Governance settings as JSON.
        #[arg(long, value_name = "FILE")]
        body: Option<PathBuf>,
    },

    /// Turn managed environment off.
    DisableManaged { environment_id: String },

    /// Replace the tenant isolation policy.
    TenantIsolation {
        tenant_id: String,
        #[arg(long, value_name = "FILE")]
        body: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Execute(args) => run_execute(&cfg, &args).await?,
            CliCommand::Preset { host, kind } => run_preset(&cfg, &host, &kind).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
