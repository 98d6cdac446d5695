//! Long-running operation orchestration.
//!
//! Leaf first: `classify` decides what an initial mutation response means,
//! `backoff` bounds poll delays, `terminal` interprets a poll body against a
//! per-call vocabulary, `poll` drives the wait, and `orchestrator` composes them
//! with the resubmission policy into a single `execute` call.

mod backoff;
mod classify;
mod orchestrator;
mod poll;
mod request;
mod terminal;

pub use backoff::BackoffScheduler;
pub use classify::{classify, parse_retry_after, resolve_tracking_url, Classification};
pub use orchestrator::{Completed, Orchestrator, OrchestratorConfig};
pub use poll::{PollLoop, Polled};
pub use request::{FollowUp, OperationRequest, ResourceTarget, DEFAULT_EXPECTED_STATUSES};
pub use terminal::{StateVocabulary, TerminalOutcome, TerminalRule};
