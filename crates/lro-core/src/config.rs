use crate::http::CurlOptions;
use crate::lro::{BackoffScheduler, OrchestratorConfig};
use crate::retry::{ConflictCodes, RetryPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Transport-level retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per exchange (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 1.0,
            max_delay_secs: 30,
        }
    }
}

fn default_conflict_codes() -> Vec<String> {
    vec![
        "OperationInProgress".to_string(),
        "OperationNotStartable".to_string(),
    ]
}

/// Global configuration loaded from `~/.config/lro/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LroConfig {
    /// First poll delay when the server sends no `Retry-After`, and the wait
    /// before resubmitting a mutation.
    pub default_delay_secs: u64,
    /// Lower bound for every inter-poll delay.
    pub min_poll_delay_secs: u64,
    /// Upper bound for every inter-poll delay.
    pub max_poll_delay_secs: u64,
    /// Ceiling on whole-mutation resubmissions (retryable conflicts and failed states).
    pub max_resubmissions: u32,
    /// 409 error codes that mean "another operation is running".
    #[serde(default = "default_conflict_codes")]
    pub retryable_conflict_codes: Vec<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Optional transport retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Environment variable holding a bearer token for the management API.
    #[serde(default)]
    pub bearer_token_env: Option<String>,
}

impl Default for LroConfig {
    fn default() -> Self {
        Self {
            default_delay_secs: 5,
            min_poll_delay_secs: 2,
            max_poll_delay_secs: 60,
            max_resubmissions: 10,
            retryable_conflict_codes: default_conflict_codes(),
            connect_timeout_secs: 15,
            request_timeout_secs: 120,
            retry: None,
            bearer_token_env: None,
        }
    }
}

impl LroConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            default_delay: Duration::from_secs(self.default_delay_secs),
            backoff: BackoffScheduler::new(
                Duration::from_secs(self.min_poll_delay_secs),
                Duration::from_secs(self.max_poll_delay_secs),
            ),
            max_resubmissions: self.max_resubmissions,
            conflict_codes: ConflictCodes::new(self.retryable_conflict_codes.iter().cloned()),
            transport_retry: self
                .retry
                .as_ref()
                .map(RetryPolicy::from)
                .unwrap_or_default(),
        }
    }

    /// libcurl options; reads the bearer token from the configured env var, if any.
    pub fn curl_options(&self) -> CurlOptions {
        let bearer_token = self
            .bearer_token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|t| !t.is_empty());
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            bearer_token,
            ..CurlOptions::default()
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("lro")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<LroConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` but at an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<LroConfig> {
    if !path.exists() {
        let default_cfg = LroConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: LroConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
