//! Error taxonomy surfaced by `Orchestrator::execute`.
//!
//! Transient conditions (retryable conflicts, failed states eligible for
//! resubmission, throttled polls) are handled internally and only appear here
//! as `RetriesExhausted` once the resubmission budget runs out.

use crate::cancel::Cancelled;
use crate::http::{Method, TransportError};

/// The backend violated the wire contract. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    #[error("HTTP {status} response carried no Location or Operation-Location header")]
    MissingTrackingHeader { status: u16 },
    #[error("tracking URL {value:?} is not usable: {reason}")]
    InvalidTrackingUrl { value: String, reason: String },
    #[error("{context} body is not valid JSON: {reason}")]
    MalformedBody { context: &'static str, reason: String },
    #[error("state field `{path}` missing from completed poll response")]
    MissingStateField { path: String },
    #[error("succeeded body names no resource id in any of: {fields}")]
    MissingResourceId { fields: String },
    #[error("poll loop ended without a terminal state")]
    NotTerminal,
}

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// Status outside the acceptable set that transport-level retry gave up on.
    #[error("unexpected HTTP status {status} from {method} {url}; body: {body}")]
    UnexpectedStatus {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    /// Permanent conflict or terminal failure, with the backend's code and message.
    #[error("operation failed with {code}: {message}")]
    PermanentDomain { code: String, message: String },

    #[error("operation still failing after {resubmissions} resubmission(s); last error {code}: {message}")]
    RetriesExhausted {
        resubmissions: u32,
        code: String,
        message: String,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: TransportError,
    },
}

impl OperationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OperationError::Cancelled(_))
    }

    /// Backend error code, when the failure carries one.
    pub fn code(&self) -> Option<&str> {
        match self {
            OperationError::PermanentDomain { code, .. }
            | OperationError::RetriesExhausted { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Backend message, when the failure carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            OperationError::PermanentDomain { message, .. }
            | OperationError::RetriesExhausted { message, .. } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_domain_keeps_backend_code_in_message() {
        let err = OperationError::PermanentDomain {
            code: "InsufficientCapacity_StorageDriven".into(),
            message: "not enough storage".into(),
        };
        assert_eq!(err.code(), Some("InsufficientCapacity_StorageDriven"));
        assert!(err.to_string().contains("InsufficientCapacity_StorageDriven"));
        assert!(err.to_string().contains("not enough storage"));
    }

    #[test]
    fn cancelled_is_distinguishable() {
        let err = OperationError::from(Cancelled::DeadlineExceeded);
        assert!(err.is_cancelled());
        assert_eq!(err.code(), None);
    }

    #[test]
    fn protocol_violation_converts() {
        let err: OperationError = ProtocolViolation::MissingTrackingHeader { status: 202 }.into();
        assert!(matches!(err, OperationError::Protocol(_)));
        assert!(err.to_string().contains("202"));
    }
}
