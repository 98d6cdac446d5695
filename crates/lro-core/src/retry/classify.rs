//! Classify HTTP statuses and transport failures into retry policy error kinds.

use crate::http::TransportError;
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status that fell outside the caller's acceptable set.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        408 | 504 => ErrorKind::Timeout,
        425 | 429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code),
        _ => ErrorKind::Other,
    }
}

/// Classify a curl error for retry decisions.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

/// Classify a transport failure. Aborts and bad URLs are never retried.
pub fn classify_transport_error(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Curl(ce) => classify_curl_error(ce),
        TransportError::InvalidUrl { .. } | TransportError::Aborted => ErrorKind::Other,
    }
}
