//! Backend error bodies and the retryable-conflict code table.
//!
//! Not every 409 is retryable. A collision with another running operation on
//! the same target clears by itself; capacity or validation failures do not and
//! must reach the caller on the first attempt.

use serde::Deserialize;
use std::collections::BTreeSet;

/// Machine code and human message from a backend error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub code: String,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Wrapped { error: ErrorDetail },
    Flat(ErrorDetail),
}

/// Parse `{"error":{"code","message"}}` or a flat `{"code","message"}` body.
///
/// Returns `None` when the body is not JSON or carries no code.
pub fn parse_error_body(body: &[u8]) -> Option<BackendError> {
    let detail = match serde_json::from_slice::<ErrorEnvelope>(body).ok()? {
        ErrorEnvelope::Wrapped { error } => error,
        ErrorEnvelope::Flat(detail) => detail,
    };
    let code = detail.code.filter(|c| !c.is_empty())?;
    Some(BackendError {
        message: detail.message.unwrap_or_else(|| code.clone()),
        code,
    })
}

/// Error codes whose 409 means "another operation is running, try again".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCodes {
    retryable: BTreeSet<String>,
}

impl Default for ConflictCodes {
    fn default() -> Self {
        Self::new(["OperationInProgress", "OperationNotStartable"])
    }
}

impl ConflictCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            retryable: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_retryable(&self, code: &str) -> bool {
        self.retryable.iter().any(|c| c.eq_ignore_ascii_case(code))
    }

    /// Interpret a 409 body. Returns whether it is retryable and the error to report.
    ///
    /// Bodies that are not structured JSON are scanned for a retryable code;
    /// anything else is permanent with the raw body as the message.
    pub fn classify(&self, body: &[u8]) -> (bool, BackendError) {
        if let Some(err) = parse_error_body(body) {
            return (self.is_retryable(&err.code), err);
        }
        let text = String::from_utf8_lossy(body);
        if text.trim().is_empty() {
            return (
                false,
                BackendError {
                    code: "Conflict".to_string(),
                    message: "HTTP 409 with no body in response".to_string(),
                },
            );
        }
        if let Some(code) = self.retryable.iter().find(|c| text.contains(c.as_str())) {
            return (
                true,
                BackendError {
                    code: code.clone(),
                    message: text.into_owned(),
                },
            );
        }
        (
            false,
            BackendError {
                code: "Conflict".to_string(),
                message: text.into_owned(),
            },
        )
    }
}
