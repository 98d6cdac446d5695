//! The poll loop: sleep, GET the tracking URL, interpret, repeat.

use super::backoff::BackoffScheduler;
use super::classify::parse_retry_after;
use super::terminal::{TerminalOutcome, TerminalRule};
use crate::cancel::CancelToken;
use crate::error::OperationError;
use crate::http::{Headers, HttpRequest, Transport, HEADER_RETRY_AFTER};
use crate::retry::RetryingTransport;
use crate::sleep::Sleeper;
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

/// Terminal result of one poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polled {
    /// `Succeeded` or `Failed`; never `StillRunning`.
    pub outcome: TerminalOutcome,
    /// Wire status of the final poll response.
    pub status: u16,
    /// GETs issued, including the final one.
    pub polls: u32,
}

/// Lives for one wait; dropped when `await_terminal` returns.
struct PollState {
    poll_url: Url,
    attempts: u32,
    last_delay: Duration,
}

pub struct PollLoop<'a, T: ?Sized, S: ?Sized> {
    pub http: RetryingTransport<'a, T, S>,
    pub backoff: BackoffScheduler,
    /// Sent with every poll GET.
    pub headers: Headers,
}

impl<'a, T, S> PollLoop<'a, T, S>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
{
    /// Poll `poll_url` until `rule` reports a terminal state.
    ///
    /// Every GET is preceded by a cancellable sleep; the first one lasts
    /// `initial_delay` (clamped), later ones follow the poll responses' `Retry-After`.
    pub fn await_terminal(
        &self,
        poll_url: &Url,
        initial_delay: Duration,
        rule: &TerminalRule,
        cancel: &CancelToken,
    ) -> Result<Polled, OperationError> {
        let acceptable: BTreeSet<u16> = [200, 202].into_iter().collect();
        let mut state = PollState {
            poll_url: poll_url.clone(),
            attempts: 0,
            last_delay: self.backoff.clamp(initial_delay),
        };

        loop {
            self.http.sleeper.sleep(state.last_delay, cancel)?;

            let request = HttpRequest::get(state.poll_url.as_str(), self.headers.clone());
            let resp = self.http.send(&request, &acceptable, cancel)?;
            state.attempts += 1;

            let outcome = rule.interpret(resp.status, &resp.body)?;
            tracing::debug!(
                url = %state.poll_url,
                attempt = state.attempts,
                status = resp.status,
                state = outcome_label(&outcome),
                "poll"
            );

            if outcome != TerminalOutcome::StillRunning {
                return Ok(Polled {
                    outcome,
                    status: resp.status,
                    polls: state.attempts,
                });
            }

            let hint = resp.header(HEADER_RETRY_AFTER).and_then(parse_retry_after);
            state.last_delay = self.backoff.next_delay(hint, state.last_delay);
        }
    }
}

fn outcome_label(outcome: &TerminalOutcome) -> &str {
    match outcome {
        TerminalOutcome::Succeeded(_) => "Succeeded",
        TerminalOutcome::Failed { state, .. } => state,
        TerminalOutcome::StillRunning => "Running",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, TransportError};
    use crate::retry::RetryPolicy;
    use crate::sleep::RecordingSleeper;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Script {
        responses: Mutex<Vec<HttpResponse>>,
        gets: Mutex<u32>,
    }

    impl Script {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                gets: Mutex::new(0),
            }
        }
    }

    impl Transport for Script {
        fn send(
            &self,
            _request: &HttpRequest,
            _cancel: &CancelToken,
        ) -> Result<HttpResponse, TransportError> {
            *self.gets.lock().unwrap() += 1;
            Ok(self.responses.lock().unwrap().remove(0))
        }
    }

    fn reply(status: u16, state: &str, retry_after: Option<&str>) -> HttpResponse {
        let mut r = HttpResponse::new(status);
        r.body = format!(r#"{{"state":{{"id":"{}"}}}}"#, state).into_bytes();
        if let Some(v) = retry_after {
            r.headers.insert("Retry-After", v);
        }
        r
    }

    fn poll(
        script: &Script,
        sleeper: &RecordingSleeper,
        cancel: &CancelToken,
    ) -> Result<Polled, OperationError> {
        let policy = RetryPolicy::default();
        let pl = PollLoop {
            http: RetryingTransport {
                transport: script,
                sleeper,
                policy: &policy,
            },
            backoff: BackoffScheduler::default(),
            headers: Headers::new(),
        };
        pl.await_terminal(
            &Url::parse("https://api.example/op/1").unwrap(),
            Duration::from_secs(5),
            &TerminalRule::lifecycle(),
            cancel,
        )
    }

    #[test]
    fn n_running_then_success_takes_n_plus_one_gets() {
        let n = 4;
        let mut responses: Vec<_> = (0..n).map(|_| reply(202, "Running", None)).collect();
        responses.push(reply(200, "Succeeded", None));
        let script = Script::new(responses);
        let sleeper = RecordingSleeper::new();
        let polled = poll(&script, &sleeper, &CancelToken::new()).unwrap();
        assert!(matches!(polled.outcome, TerminalOutcome::Succeeded(_)));
        assert_eq!(polled.polls, n + 1);
        assert_eq!(*script.gets.lock().unwrap(), n + 1);
        assert_eq!(sleeper.delays().len() as u32, n + 1);
    }

    #[test]
    fn server_hint_is_followed_then_reused() {
        let script = Script::new(vec![
            reply(202, "Running", Some("11")),
            reply(202, "Running", None),
            reply(200, "Succeeded", None),
        ]);
        let sleeper = RecordingSleeper::new();
        poll(&script, &sleeper, &CancelToken::new()).unwrap();
        let secs: Vec<u64> = sleeper.delays().iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![5, 11, 11]);
    }

    #[test]
    fn hints_are_clamped() {
        let script = Script::new(vec![
            reply(202, "Running", Some("0")),
            reply(202, "Running", Some("900")),
            reply(200, "Succeeded", None),
        ]);
        let sleeper = RecordingSleeper::new();
        poll(&script, &sleeper, &CancelToken::new()).unwrap();
        let secs: Vec<u64> = sleeper.delays().iter().map(Duration::as_secs).collect();
        assert_eq!(secs, vec![5, 2, 60]);
    }

    #[test]
    fn failed_state_is_terminal() {
        let script = Script::new(vec![reply(200, "Failed", None)]);
        let sleeper = RecordingSleeper::new();
        let polled = poll(&script, &sleeper, &CancelToken::new()).unwrap();
        assert!(matches!(polled.outcome, TerminalOutcome::Failed { .. }));
        assert_eq!(polled.polls, 1);
    }

    #[test]
    fn cancel_during_sleep_skips_the_get() {
        let script = Script::new(vec![reply(200, "Succeeded", None)]);
        let sleeper = RecordingSleeper::cancel_on_sleep(1);
        let cancel = CancelToken::new();
        let err = poll(&script, &sleeper, &cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(*script.gets.lock().unwrap(), 0);
    }
}
