//! Response classifier: what does the initial mutation response mean?

use super::request::OperationRequest;
use crate::error::{OperationError, ProtocolViolation};
use crate::http::{HttpResponse, HEADER_LOCATION, HEADER_OPERATION_LOCATION, HEADER_RETRY_AFTER};
use crate::retry::ConflictCodes;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Completed (or rejected in an accepted way, e.g. 404 on delete) without tracking.
    SyncResult { status: u16, body: Vec<u8> },
    /// Accepted; poll `poll_url` after `initial_delay`.
    AsyncPending { poll_url: Url, initial_delay: Duration },
    /// 409 from a transient collision; resubmit later.
    ConflictRetryable { code: String, message: String },
    /// 409 that will not clear by waiting.
    ConflictPermanent { code: String, message: String },
}

/// Parse a `Retry-After` value as integer seconds.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Resolve a tracking header value against the submitted request URL.
///
/// Absolute values are used as-is; relative ones are joined onto `base`.
pub fn resolve_tracking_url(base: &str, value: &str) -> Result<Url, ProtocolViolation> {
    let invalid = |reason: String| ProtocolViolation::InvalidTrackingUrl {
        value: value.to_string(),
        reason,
    };
    match Url::parse(value) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .and_then(|b| b.join(value))
            .map_err(|e| invalid(e.to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn tracking_header(resp: &HttpResponse) -> Option<&str> {
    resp.header(HEADER_LOCATION)
        .or_else(|| resp.header(HEADER_OPERATION_LOCATION))
}

/// Classify the initial response to `req`.
///
/// `default_delay` is the first poll delay when `Retry-After` is absent or
/// unparsable. A status outside `req.expected_statuses` is a protocol error.
pub fn classify(
    req: &OperationRequest,
    resp: &HttpResponse,
    default_delay: Duration,
    conflicts: &ConflictCodes,
) -> Result<Classification, OperationError> {
    if !req.expected_statuses.contains(&resp.status) {
        return Err(OperationError::UnexpectedStatus {
            method: req.method,
            url: req.url.clone(),
            status: resp.status,
            body: resp.body_text(),
        });
    }

    match resp.status {
        409 => {
            let (retryable, err) = conflicts.classify(&resp.body);
            Ok(if retryable {
                Classification::ConflictRetryable {
                    code: err.code,
                    message: err.message,
                }
            } else {
                Classification::ConflictPermanent {
                    code: err.code,
                    message: err.message,
                }
            })
        }
        202 | 201 => match tracking_header(resp) {
            Some(value) => {
                let poll_url = resolve_tracking_url(&req.url, value)?;
                let initial_delay = resp
                    .header(HEADER_RETRY_AFTER)
                    .and_then(parse_retry_after)
                    .unwrap_or(default_delay);
                Ok(Classification::AsyncPending {
                    poll_url,
                    initial_delay,
                })
            }
            None if resp.status == 202 => Err(ProtocolViolation::MissingTrackingHeader {
                status: resp.status,
            }
            .into()),
            None => Ok(Classification::SyncResult {
                status: resp.status,
                body: resp.body.clone(),
            }),
        },
        status => Ok(Classification::SyncResult {
            status,
            body: resp.body.clone(),
        }),
    }
}
