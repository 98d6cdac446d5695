//! In-memory transport that answers from a per-URL script.

use lro_core::cancel::CancelToken;
use lro_core::http::{HttpRequest, HttpResponse, Method, Transport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub fn reply(status: u16, body: &str) -> HttpResponse {
    let mut resp = HttpResponse::new(status);
    resp.body = body.as_bytes().to_vec();
    resp
}

pub fn reply_with(status: u16, headers: &[(&str, &str)], body: &str) -> HttpResponse {
    let mut resp = reply(status, body);
    resp.headers = headers.iter().copied().collect();
    resp
}

/// Replies are keyed by `"<METHOD> <url>"` and consumed in order. The last reply
/// for a key is repeated once the queue would otherwise run dry.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, url: &str, replies: Vec<HttpResponse>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, url), replies.into());
        self
    }

    pub fn sent(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, url: &str) -> usize {
        self.sent()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: &HttpRequest,
        _cancel: &CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        let key = format!("{} {}", request.method, request.url);
        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .get_mut(&key)
            .unwrap_or_else(|| panic!("no script for {}", key));
        let resp = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or_else(|| panic!("empty script for {}", key))
        };
        Ok(resp)
    }
}
