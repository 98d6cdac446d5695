//! Retry policy at two levels.
//!
//! Transport level: throttling, 5xx and connection failures on a single
//! exchange are re-sent with backoff (`classify`, `policy`, `run`).
//! Operation level: retryable conflicts and failed terminal states resubmit the
//! whole mutation under an explicit ceiling (`conflict`, `resubmit`).

mod classify;
mod conflict;
mod policy;
mod resubmit;
mod run;

pub use classify::{classify_curl_error, classify_http_status, classify_transport_error};
pub use conflict::{parse_error_body, BackendError, ConflictCodes};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use resubmit::{ResubmitPolicy, ResubmitReason};
pub use run::RetryingTransport;
