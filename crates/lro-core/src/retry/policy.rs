use crate::config::RetryConfig;
use std::time::Duration;

/// High-level classification of a failed exchange for retry purposes.
///
/// Callers map HTTP status codes and curl errors into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read, or HTTP 408/504).
    Timeout,
    /// Server asked us to slow down (429, 503, 425).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Any other error (not retried).
    Other,
}

/// Decision returned by a retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps, for single exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay, including server-provided `Retry-After`.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }
}

impl RetryPolicy {
    /// Compute the next delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). A server hint (`Retry-After`)
    /// replaces the exponential delay but is kept within `[base_delay, max_delay]`.
    pub fn decide(
        &self,
        attempt: u32,
        kind: ErrorKind,
        server_hint: Option<Duration>,
    ) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Timeout
            | ErrorKind::Connection
            | ErrorKind::Throttled
            | ErrorKind::Http5xx(_) => {
                if let Some(hint) = server_hint {
                    let bounded = hint.max(self.base_delay).min(self.max_delay);
                    return RetryDecision::RetryAfter(bounded);
                }
                // base * 2^(attempt-1), capped.
                let exp = 1u32 << attempt.saturating_sub(1).min(8);
                let raw = self.base_delay.saturating_mul(exp);
                RetryDecision::RetryAfter(raw.min(self.max_delay))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(d: RetryDecision) -> Duration {
        match d {
            RetryDecision::RetryAfter(d) => d,
            RetryDecision::NoRetry => panic!("expected retry"),
        }
    }

    #[test]
    fn no_retry_for_other() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Other, None), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 20;
        let d1 = delay(p.decide(1, ErrorKind::Timeout, None));
        let d2 = delay(p.decide(2, ErrorKind::Timeout, None));
        assert!(d2 >= d1);
        let d_last = delay(p.decide(10, ErrorKind::Timeout, None));
        assert_eq!(d_last, p.max_delay);
    }

    #[test]
    fn server_hint_wins_but_is_capped() {
        let p = RetryPolicy::default();
        assert_eq!(
            delay(p.decide(1, ErrorKind::Throttled, Some(Duration::from_secs(7)))),
            Duration::from_secs(7)
        );
        assert_eq!(
            delay(p.decide(1, ErrorKind::Throttled, Some(Duration::from_secs(600)))),
            p.max_delay
        );
    }

    #[test]
    fn zero_server_hint_waits_at_least_base_delay() {
        let p = RetryPolicy::default();
        assert_eq!(
            delay(p.decide(1, ErrorKind::Throttled, Some(Duration::ZERO))),
            p.base_delay
        );
    }

    #[test]
    fn respects_max_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert!(matches!(
            p.decide(1, ErrorKind::Http5xx(502), None),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::Connection, None),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(
            p.decide(3, ErrorKind::Throttled, None),
            RetryDecision::NoRetry
        );
    }

    #[test]
    fn built_from_config_section() {
        let cfg = RetryConfig {
            max_attempts: 0,
            base_delay_secs: 0.5,
            max_delay_secs: 10,
        };
        let p = RetryPolicy::from(&cfg);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.base_delay, Duration::from_millis(500));
        assert_eq!(p.max_delay, Duration::from_secs(10));
    }
}
