//! Resource-kind presets.
//!
//! Each builder produces an `OperationRequest` carrying the URL, body, accepted
//! statuses, completion vocabulary and resubmission flag for one mutation kind.
//! None of them contain orchestration logic.

pub mod enterprise_policy;
pub mod environment;
pub mod managed_environment;
pub mod tenant_isolation_policy;

use url::Url;

pub const DEFAULT_BAPI_HOST: &str = "api.bap.microsoft.com";
pub const API_VERSION_PARAM: &str = "api-version";

/// Host of the management API that the presets target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub host: String,
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_BAPI_HOST.to_string(),
        }
    }
}

impl ApiEndpoint {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// `https://<host><path>?api-version=<version>`, with path segments escaped.
    pub fn url(&self, segments: &[&str], api_version: Option<&str>) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!("https://{}/", self.host))?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithoutBase)?
            .pop_if_empty()
            .extend(segments);
        if let Some(version) = api_version {
            url.query_pairs_mut().append_pair(API_VERSION_PARAM, version);
        }
        Ok(url.into())
    }
}

/// Errors building a preset request.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("serializing request body: {0}")]
    Body(#[from] serde_json::Error),
}
