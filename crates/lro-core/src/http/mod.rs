//! HTTP exchange types and the `Transport` seam.
//!
//! The orchestrator never talks to libcurl directly; it sends an `HttpRequest`
//! through a `Transport` and gets back a fully-read `HttpResponse`. `CurlTransport`
//! is the production implementation; tests plug in scripted transports.

mod parse;
mod transport;

pub use transport::{CurlOptions, CurlTransport};
pub use parse::parse_header_lines;

use crate::cancel::CancelToken;
use std::fmt;
use std::str::FromStr;

pub const HEADER_LOCATION: &str = "Location";
pub const HEADER_OPERATION_LOCATION: &str = "Operation-Location";
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// HTTP verbs used by management API mutations and polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// Response headers in arrival order. Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// First value for `name`, ignoring case. Empty values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(name) && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Headers(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One request on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Bodyless GET carrying the given headers (used for polls and follow-ups).
    pub fn get(url: impl Into<String>, headers: Headers) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers,
            body: None,
        }
    }
}

/// A fully-read response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Body as lossy UTF-8, for error messages and logs.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete an exchange at all (no HTTP status to look at).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0}")]
    Curl(#[from] ::curl::Error),
    #[error("request aborted by cancellation")]
    Aborted,
}

/// Performs a single request/response exchange.
///
/// Implementations must return promptly with `TransportError::Aborted` when they
/// notice `cancel` has fired; noticing it at all is optional.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest, cancel: &CancelToken)
        -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        (**self).send(request, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let headers: Headers = [("Operation-Location", "https://x/op/1")].into_iter().collect();
        assert_eq!(
            headers.get("operation-location"),
            Some("https://x/op/1")
        );
        assert_eq!(headers.get("location"), None);
    }

    #[test]
    fn empty_header_value_is_absent() {
        let headers: Headers = [("Location", ""), ("Location", "https://x/op/2")]
            .into_iter()
            .collect();
        assert_eq!(headers.get("Location"), Some("https://x/op/2"));
    }

    #[test]
    fn method_parses_case_insensitively() {
        assert_eq!("patch".parse::<Method>(), Ok(Method::Patch));
        assert!("TRACE".parse::<Method>().is_err());
    }
}
