use std::time::Duration;

/// Bounds every inter-poll delay to `[min, max]`.
///
/// No jitter and no growth of its own: the server's `Retry-After` drives the
/// delay, and without a hint the previous delay is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffScheduler {
    pub min: Duration,
    pub max: Duration,
}

impl Default for BackoffScheduler {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2),
            max: Duration::from_secs(60),
        }
    }
}

impl BackoffScheduler {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn clamp(&self, delay: Duration) -> Duration {
        delay.clamp(self.min, self.max)
    }

    /// Delay before the next poll, given the latest server hint and the delay used last.
    pub fn next_delay(&self, server_hint: Option<Duration>, previous: Duration) -> Duration {
        self.clamp(server_hint.unwrap_or(previous))
    }
}
