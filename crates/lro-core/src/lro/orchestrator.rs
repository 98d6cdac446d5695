//! `execute`: submit, classify, poll, resubmit, follow up.
//!
//! Resubmission is an explicit loop with a counter, not recursion. Both retryable
//! conflicts and opted-in failed states draw from the same `max_resubmissions`
//! budget and wait `default_delay` before going again.

use super::backoff::BackoffScheduler;
use super::classify::{classify, Classification};
use super::poll::PollLoop;
use super::request::OperationRequest;
use super::terminal::{TerminalOutcome, TerminalRule};
use crate::cancel::CancelToken;
use crate::error::{OperationError, ProtocolViolation};
use crate::http::{Headers, HttpRequest, Transport};
use crate::retry::{
    ConflictCodes, ResubmitPolicy, ResubmitReason, RetryDecision, RetryPolicy, RetryingTransport,
};
use crate::sleep::{Sleeper, ThreadSleeper};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::time::Duration;

/// Tunables that would otherwise be hidden literals.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// First poll delay without `Retry-After`, and the wait before each resubmission.
    pub default_delay: Duration,
    pub backoff: BackoffScheduler,
    /// Ceiling on whole-mutation resubmissions per `execute` call.
    pub max_resubmissions: u32,
    pub conflict_codes: ConflictCodes,
    /// Retry policy for individual exchanges (throttling, 5xx, connection errors).
    pub transport_retry: RetryPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_delay: Duration::from_secs(5),
            backoff: BackoffScheduler::default(),
            max_resubmissions: 10,
            conflict_codes: ConflictCodes::default(),
            transport_retry: RetryPolicy::default(),
        }
    }
}

/// Final result of a successful `execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// Status of the response the body came from.
    pub status: u16,
    pub body: Vec<u8>,
    /// Poll GETs issued across all submissions (readiness polls included).
    pub polls: u32,
    /// Times the mutation went on the wire.
    pub submissions: u32,
}

impl Completed {
    /// Deserialize the final body. An empty body yields `None`.
    pub fn json<D: DeserializeOwned>(&self) -> Result<Option<D>, OperationError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&self.body)
            .map(Some)
            .map_err(|e| {
                ProtocolViolation::MalformedBody {
                    context: "final resource",
                    reason: e.to_string(),
                }
                .into()
            })
    }
}

/// Drives one `OperationRequest` to a terminal result.
///
/// Holds no per-operation state: concurrent `execute` calls on a shared
/// orchestrator each keep their own counters and poll state.
pub struct Orchestrator<T, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    config: OrchestratorConfig,
}

impl<T: Transport> Orchestrator<T, ThreadSleeper> {
    pub fn new(transport: T, config: OrchestratorConfig) -> Self {
        Self::with_sleeper(transport, ThreadSleeper, config)
    }
}

impl<T: Transport, S: Sleeper> Orchestrator<T, S> {
    pub fn with_sleeper(transport: T, sleeper: S, config: OrchestratorConfig) -> Self {
        Self {
            transport,
            sleeper,
            config,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn http(&self) -> RetryingTransport<'_, T, S> {
        RetryingTransport {
            transport: &self.transport,
            sleeper: &self.sleeper,
            policy: &self.config.transport_retry,
        }
    }

    fn poller(&self, headers: Headers) -> PollLoop<'_, T, S> {
        PollLoop {
            http: self.http(),
            backoff: self.config.backoff,
            headers,
        }
    }

    /// Run `req` to completion and deserialize the final body into `D`.
    pub fn execute_into<D: DeserializeOwned>(
        &self,
        req: &OperationRequest,
        cancel: &CancelToken,
    ) -> Result<(Completed, Option<D>), OperationError> {
        let completed = self.execute(req, cancel)?;
        let value = completed.json()?;
        Ok((completed, value))
    }

    /// Run `req` to completion.
    pub fn execute(
        &self,
        req: &OperationRequest,
        cancel: &CancelToken,
    ) -> Result<Completed, OperationError> {
        let resubmit = ResubmitPolicy {
            max_resubmissions: self.config.max_resubmissions,
            delay: self.config.default_delay,
        };
        let submission = req.to_http();
        let poll_headers = forwarded_headers(&req.headers);
        let http = self.http();
        let mut submissions = 0u32;
        let mut polls = 0u32;

        loop {
            cancel.check()?;
            submissions += 1;
            tracing::debug!(
                method = %req.method,
                url = %req.url,
                submission = submissions,
                "submitting operation"
            );
            let resp = http.send(&submission, &req.expected_statuses, cancel)?;

            let reason = match classify(
                req,
                &resp,
                self.config.default_delay,
                &self.config.conflict_codes,
            )? {
                Classification::SyncResult { status, body } => {
                    check_sync_body(req.sync_rule.as_ref(), status, &body)?;
                    return self.finish(req, status, body, polls, submissions, cancel);
                }
                Classification::AsyncPending {
                    poll_url,
                    initial_delay,
                } => {
                    tracing::debug!(
                        url = %poll_url,
                        delay_ms = initial_delay.as_millis() as u64,
                        "operation accepted, polling"
                    );
                    let polled = self.poller(poll_headers.clone()).await_terminal(
                        &poll_url,
                        initial_delay,
                        &req.completion,
                        cancel,
                    )?;
                    polls += polled.polls;
                    match polled.outcome {
                        TerminalOutcome::Succeeded(body) => {
                            return self.finish(req, polled.status, body, polls, submissions, cancel)
                        }
                        TerminalOutcome::Failed { state, message } if req.resubmit_on_failure => {
                            ResubmitReason::FailedState { state, message }
                        }
                        TerminalOutcome::Failed { state, message } => {
                            return Err(OperationError::PermanentDomain {
                                code: state,
                                message,
                            })
                        }
                        TerminalOutcome::StillRunning => {
                            return Err(ProtocolViolation::NotTerminal.into())
                        }
                    }
                }
                Classification::ConflictRetryable { code, message } => {
                    ResubmitReason::Conflict { code, message }
                }
                Classification::ConflictPermanent { code, message } => {
                    return Err(OperationError::PermanentDomain { code, message })
                }
            };

            let done = submissions - 1;
            match resubmit.decide(done) {
                RetryDecision::NoRetry => {
                    return Err(OperationError::RetriesExhausted {
                        resubmissions: done,
                        code: reason.code().to_string(),
                        message: reason.message().to_string(),
                    })
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::info!(
                        method = %req.method,
                        url = %req.url,
                        reason = %reason,
                        resubmission = done + 1,
                        delay_ms = delay.as_millis() as u64,
                        "resubmitting operation"
                    );
                    self.sleeper.sleep(delay, cancel)?;
                }
            }
        }
    }

    /// Issue the follow-up GET (and readiness wait) if the request asked for one.
    fn finish(
        &self,
        req: &OperationRequest,
        status: u16,
        body: Vec<u8>,
        polls: u32,
        submissions: u32,
        cancel: &CancelToken,
    ) -> Result<Completed, OperationError> {
        let follow_up = match &req.follow_up {
            Some(f) if (200..300).contains(&status) => f,
            _ => {
                tracing::info!(url = %req.url, status, submissions, polls, "operation completed");
                return Ok(Completed {
                    status,
                    body,
                    polls,
                    submissions,
                });
            }
        };

        let url = follow_up.resource_url(&req.url, &body)?;
        let headers = forwarded_headers(&req.headers);
        let completed = match &follow_up.readiness {
            None => {
                let ok: BTreeSet<u16> = [200].into_iter().collect();
                let resp = self
                    .http()
                    .send(&HttpRequest::get(url.as_str(), headers), &ok, cancel)?;
                Completed {
                    status: resp.status,
                    body: resp.body,
                    polls,
                    submissions,
                }
            }
            Some(rule) => {
                let polled = self.poller(headers).await_terminal(
                    &url,
                    self.config.default_delay,
                    rule,
                    cancel,
                )?;
                match polled.outcome {
                    TerminalOutcome::Succeeded(body) => Completed {
                        status: polled.status,
                        body,
                        polls: polls + polled.polls,
                        submissions,
                    },
                    TerminalOutcome::Failed { state, message } => {
                        return Err(OperationError::PermanentDomain {
                            code: state,
                            message,
                        })
                    }
                    TerminalOutcome::StillRunning => {
                        return Err(ProtocolViolation::NotTerminal.into())
                    }
                }
            }
        };
        tracing::info!(
            url = %req.url,
            resource = %url,
            status = completed.status,
            submissions,
            polls = completed.polls,
            "operation completed"
        );
        Ok(completed)
    }
}

/// A synchronous 2xx body that reports a failed state is a domain failure.
fn check_sync_body(
    rule: Option<&TerminalRule>,
    status: u16,
    body: &[u8],
) -> Result<(), OperationError> {
    let Some(rule) = rule else {
        return Ok(());
    };
    if !(200..300).contains(&status) || status == 204 {
        return Ok(());
    }
    match rule.interpret(status, body)? {
        TerminalOutcome::Failed { state, message } => {
            Err(OperationError::PermanentDomain { code: state, message })
        }
        _ => Ok(()),
    }
}

/// Submission headers that also belong on polls and follow-up GETs.
fn forwarded_headers(headers: &Headers) -> Headers {
    headers
        .iter()
        .filter(|(k, _)| {
            !k.eq_ignore_ascii_case("content-type") && !k.eq_ignore_ascii_case("content-length")
        })
        .collect()
}
