//! The only suspension point of an operation: the wait before a poll or a resubmission.
//!
//! `ThreadSleeper` blocks the calling thread on the cancel token. `RecordingSleeper`
//! is a virtual clock for tests: it never blocks, records each requested delay,
//! and can fire the cancel token on a chosen sleep.

use crate::cancel::{CancelToken, Cancelled};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Waits for a delay unless the operation is cancelled first.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Result<(), Cancelled>;
}

/// Real-time sleeper backed by `CancelToken::wait_timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        cancel.check()?;
        cancel.wait_timeout(delay)
    }
}

/// Mocked clock. Each call to `sleep` advances virtual time by the delay.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
    cancel_on: Option<usize>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token when the `n`th sleep (1-based) begins, instead of sleeping.
    pub fn cancel_on_sleep(n: usize) -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            cancel_on: Some(n),
        }
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total virtual time elapsed.
    pub fn elapsed(&self) -> Duration {
        self.delays().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration, cancel: &CancelToken) -> Result<(), Cancelled> {
        cancel.check()?;
        let mut delays = self.delays.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel_on == Some(delays.len() + 1) {
            cancel.cancel();
            return Err(Cancelled::ByCaller);
        }
        delays.push(delay);
        Ok(())
    }
}
