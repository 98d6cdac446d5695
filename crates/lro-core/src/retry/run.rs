//! Transport-level retry loop: re-send one exchange until its status is acceptable
//! or the policy says stop.

use super::classify::{classify_http_status, classify_transport_error};
use super::policy::{RetryDecision, RetryPolicy};
use crate::cancel::CancelToken;
use crate::error::OperationError;
use crate::http::{HttpRequest, HttpResponse, Transport, TransportError, HEADER_RETRY_AFTER};
use crate::lro::parse_retry_after;
use crate::sleep::Sleeper;
use std::collections::BTreeSet;

/// A transport wrapped with a retry policy and a cancellable sleeper.
pub struct RetryingTransport<'a, T: ?Sized, S: ?Sized> {
    pub transport: &'a T,
    pub sleeper: &'a S,
    pub policy: &'a RetryPolicy,
}

impl<'a, T, S> RetryingTransport<'a, T, S>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
{
    /// Send `request` until it returns a status in `acceptable`.
    ///
    /// Retryable statuses and connection failures are re-sent after the server's
    /// `Retry-After` or exponential backoff. Anything else is returned as an error
    /// with the response body preserved.
    pub fn send(
        &self,
        request: &HttpRequest,
        acceptable: &BTreeSet<u16>,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, OperationError> {
        let mut attempt = 1u32;
        loop {
            cancel.check()?;
            let decision = match self.transport.send(request, cancel) {
                Ok(resp) if acceptable.contains(&resp.status) => return Ok(resp),
                Ok(resp) => {
                    let hint = resp.header(HEADER_RETRY_AFTER).and_then(parse_retry_after);
                    let kind = classify_http_status(resp.status);
                    match self.policy.decide(attempt, kind, hint) {
                        RetryDecision::NoRetry => {
                            return Err(OperationError::UnexpectedStatus {
                                method: request.method,
                                url: request.url.clone(),
                                status: resp.status,
                                body: resp.body_text(),
                            })
                        }
                        RetryDecision::RetryAfter(d) => {
                            tracing::warn!(
                                method = %request.method,
                                url = %request.url,
                                status = resp.status,
                                attempt,
                                delay_ms = d.as_millis() as u64,
                                "retryable HTTP status, re-sending"
                            );
                            d
                        }
                    }
                }
                Err(TransportError::Aborted) => {
                    return Err(cancel
                        .reason()
                        .unwrap_or(crate::cancel::Cancelled::ByCaller)
                        .into())
                }
                Err(e) => match self.policy.decide(attempt, classify_transport_error(&e), None) {
                    RetryDecision::NoRetry => {
                        return Err(OperationError::Transport {
                            method: request.method,
                            url: request.url.clone(),
                            source: e,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            method = %request.method,
                            url = %request.url,
                            attempt,
                            error = %e,
                            "transport failure, re-sending"
                        );
                        d
                    }
                },
            };
            self.sleeper.sleep(decision, cancel)?;
            attempt += 1;
        }
    }
}
