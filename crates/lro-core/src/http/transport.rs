//! Blocking libcurl transport.
//!
//! One `Easy` handle per request: set method, headers and body, collect header
//! lines and body bytes, then read the response code.
//! A progress callback aborts the transfer when the cancel token fires.

use super::{parse_header_lines, HttpRequest, HttpResponse, Method, Transport, TransportError};
use crate::cancel::CancelToken;
use std::str;
use std::time::Duration;

/// Tuning for the libcurl handles used by `CurlTransport`.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Whole-request timeout (connect + transfer).
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Sent as `Authorization: Bearer <token>` unless the request sets its own.
    pub bearer_token: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("lro/{}", env!("CARGO_PKG_VERSION")),
            bearer_token: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }

    fn header_list(&self, request: &HttpRequest) -> Result<::curl::easy::List, TransportError> {
        let mut list = ::curl::easy::List::new();
        let mut has_content_type = false;
        let mut has_authorization = false;
        for (k, v) in request.headers.iter() {
            has_content_type |= k.eq_ignore_ascii_case("content-type");
            has_authorization |= k.eq_ignore_ascii_case("authorization");
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        if request.body.is_some() && !has_content_type {
            list.append("Content-Type: application/json")?;
        }
        if !has_authorization {
            if let Some(token) = &self.options.bearer_token {
                list.append(&format!("Authorization: Bearer {}", token))?;
            }
        }
        list.append("Accept: application/json")?;
        Ok(list)
    }
}

impl Transport for CurlTransport {
    fn send(
        &self,
        request: &HttpRequest,
        cancel: &CancelToken,
    ) -> Result<HttpResponse, TransportError> {
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = ::curl::easy::Easy::new();
        easy.url(&request.url).map_err(|e| TransportError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.timeout(self.options.request_timeout)?;
        easy.useragent(&self.options.user_agent)?;

        match (&request.body, request.method) {
            (Some(bytes), method) => {
                easy.post(true)?;
                easy.post_fields_copy(bytes)?;
                if method != Method::Post {
                    easy.custom_request(method.as_str())?;
                }
            }
            (None, Method::Get) => easy.get(true)?,
            (None, Method::Post) => {
                easy.post(true)?;
                easy.post_field_size(0)?;
            }
            (None, method) => easy.custom_request(method.as_str())?,
        }

        easy.http_headers(self.header_list(request)?)?;
        easy.progress(true)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.perform()
        };
        if let Err(e) = performed {
            if e.is_aborted_by_callback() {
                return Err(TransportError::Aborted);
            }
            return Err(TransportError::Curl(e));
        }

        let code = easy.response_code()?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = code,
            bytes = body.len(),
            "http exchange"
        );

        Ok(HttpResponse {
            status: code as u16,
            headers: parse_header_lines(&header_lines),
            body,
        })
    }
}
