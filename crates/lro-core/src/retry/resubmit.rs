//! Whole-mutation resubmission: the operation-level retry loop's budget.

use super::policy::RetryDecision;
use std::fmt;
use std::time::Duration;

/// Why the orchestrator wants to submit the original request again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResubmitReason {
    /// A 409 whose code marks a transient collision.
    Conflict { code: String, message: String },
    /// The operation reached a failed state and the request opted into resubmission.
    FailedState { state: String, message: String },
}

impl ResubmitReason {
    pub fn code(&self) -> &str {
        match self {
            ResubmitReason::Conflict { code, .. } => code,
            ResubmitReason::FailedState { state, .. } => state,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ResubmitReason::Conflict { message, .. }
            | ResubmitReason::FailedState { message, .. } => message,
        }
    }
}

impl fmt::Display for ResubmitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResubmitReason::Conflict { code, .. } => write!(f, "conflict {}", code),
            ResubmitReason::FailedState { state, .. } => write!(f, "terminal state {}", state),
        }
    }
}

/// Fixed-delay resubmission with an attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResubmitPolicy {
    pub max_resubmissions: u32,
    pub delay: Duration,
}

impl ResubmitPolicy {
    /// `done` is the number of resubmissions already made for this call.
    pub fn decide(&self, done: u32) -> RetryDecision {
        if done >= self.max_resubmissions {
            RetryDecision::NoRetry
        } else {
            RetryDecision::RetryAfter(self.delay)
        }
    }
}
