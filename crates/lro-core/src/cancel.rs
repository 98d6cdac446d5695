//! Cancellation for a running operation: a shared token with an optional deadline.
//!
//! The orchestrator checks the token before every submission and waits on it
//! during every pre-poll sleep. The CLI flips it from a Ctrl-C handler; library
//! callers can attach a deadline instead.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Why an operation stopped before reaching a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancelled {
    /// `CancelToken::cancel` was called.
    ByCaller,
    /// The token's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cancelled::ByCaller => write!(f, "operation cancelled by caller"),
            Cancelled::DeadlineExceeded => write!(f, "operation deadline exceeded"),
        }
    }
}

impl std::error::Error for Cancelled {}

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    cond: Condvar,
    deadline: Option<Instant>,
}

/// Cloneable cancellation signal shared between the caller and one `execute` call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that reports `DeadlineExceeded` once `deadline` has passed.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                deadline: Some(deadline),
                ..Inner::default()
            }),
        }
    }

    /// Token that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Request cancellation and wake any thread waiting in `wait_timeout`.
    pub fn cancel(&self) {
        let mut flag = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *flag = true;
        self.inner.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// The cancellation reason, if the token has fired.
    pub fn reason(&self) -> Option<Cancelled> {
        let flag = *self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if flag {
            return Some(Cancelled::ByCaller);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cancelled::DeadlineExceeded),
            _ => None,
        }
    }

    /// `Err` if the token has fired.
    pub fn check(&self) -> Result<(), Cancelled> {
        match self.reason() {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    /// Block for up to `timeout`, returning early if the token fires.
    ///
    /// Returns `Err` with the reason when cancellation (or the deadline) ended the wait.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<(), Cancelled> {
        let started = Instant::now();
        let mut end = started + timeout;
        if let Some(deadline) = self.inner.deadline {
            end = end.min(deadline);
        }
        let mut flag = self
            .inner
            .cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        loop {
            if *flag {
                return Err(Cancelled::ByCaller);
            }
            let now = Instant::now();
            if now >= end {
                break;
            }
            let (guard, _) = self
                .inner
                .cond
                .wait_timeout(flag, end - now)
                .unwrap_or_else(PoisonError::into_inner);
            flag = guard;
        }
        drop(flag);
        self.check()
    }
}
