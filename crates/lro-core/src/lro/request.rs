use super::classify::resolve_tracking_url;
use super::terminal::{dot_pointer, TerminalRule};
use crate::error::ProtocolViolation;
use crate::http::{Headers, HttpRequest, Method};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use url::Url;

/// Initial statuses accepted when the caller does not narrow them.
pub const DEFAULT_EXPECTED_STATUSES: [u16; 5] = [200, 201, 202, 204, 409];

/// Where the follow-up GET goes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceTarget {
    /// Known at submit time; relative values resolve against the request URL.
    Url(String),
    /// Named by the succeeded body. The first of `fields` (dot paths) that holds
    /// a string supplies the id, or a path whose last segment is the id; the id
    /// is appended as a path segment to `collection`, keeping its query.
    IdFromBody {
        fields: Vec<String>,
        collection: String,
    },
}

/// GET issued after the operation succeeds, to read the resource's final state.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    pub target: ResourceTarget,
    /// When set, the resource is polled until this rule reports success
    /// (e.g. an environment's management state reaching `Ready`).
    pub readiness: Option<TerminalRule>,
}

impl FollowUp {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            target: ResourceTarget::Url(url.into()),
            readiness: None,
        }
    }

    pub fn until_ready(url: impl Into<String>, readiness: TerminalRule) -> Self {
        Self {
            target: ResourceTarget::Url(url.into()),
            readiness: Some(readiness),
        }
    }

    /// GET `collection/<id>`, with the id read from the succeeded body.
    pub fn id_from_body(fields: &[&str], collection: impl Into<String>) -> Self {
        Self {
            target: ResourceTarget::IdFromBody {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                collection: collection.into(),
            },
            readiness: None,
        }
    }

    /// Resource URL for this follow-up, given the request URL and the body the
    /// operation succeeded with.
    pub fn resource_url(&self, base: &str, body: &[u8]) -> Result<Url, ProtocolViolation> {
        let (fields, collection) = match &self.target {
            ResourceTarget::Url(url) => return resolve_tracking_url(base, url),
            ResourceTarget::IdFromBody { fields, collection } => (fields, collection),
        };

        let doc: Value =
            serde_json::from_slice(body).map_err(|e| ProtocolViolation::MalformedBody {
                context: "final operation",
                reason: e.to_string(),
            })?;
        let id = fields
            .iter()
            .filter_map(|f| doc.pointer(&dot_pointer(f)).and_then(Value::as_str))
            .find_map(|v| v.rsplit('/').find(|seg| !seg.is_empty()))
            .ok_or_else(|| ProtocolViolation::MissingResourceId {
                fields: fields.join(", "),
            })?;

        let mut url = resolve_tracking_url(base, collection)?;
        url.path_segments_mut()
            .map_err(|_| ProtocolViolation::InvalidTrackingUrl {
                value: collection.clone(),
                reason: "URL cannot take path segments".to_string(),
            })?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

/// One mutation to drive to completion. Built once per call, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
    /// Initial statuses that are part of the protocol; anything else is an error.
    pub expected_statuses: BTreeSet<u16>,
    /// How to read completion out of a poll response.
    pub completion: TerminalRule,
    /// Checked against a synchronous (non-tracked) response body, when set.
    pub sync_rule: Option<TerminalRule>,
    /// Treat a failed terminal state as transient and resubmit the mutation.
    pub resubmit_on_failure: bool,
    pub follow_up: Option<FollowUp>,
}

impl OperationRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            expected_statuses: DEFAULT_EXPECTED_STATUSES.into_iter().collect(),
            completion: TerminalRule::lifecycle(),
            sync_rule: None,
            resubmit_on_failure: false,
            follow_up: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON request body.
    pub fn json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(value)?;
        Ok(self.body(bytes))
    }

    /// Replace the acceptable initial statuses.
    pub fn accept<I: IntoIterator<Item = u16>>(mut self, statuses: I) -> Self {
        self.expected_statuses = statuses.into_iter().collect();
        self
    }

    pub fn completion(mut self, rule: TerminalRule) -> Self {
        self.completion = rule;
        self
    }

    pub fn sync_rule(mut self, rule: TerminalRule) -> Self {
        self.sync_rule = Some(rule);
        self
    }

    pub fn resubmit_on_failure(mut self, enabled: bool) -> Self {
        self.resubmit_on_failure = enabled;
        self
    }

    pub fn follow_up(mut self, follow_up: FollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }

    /// The submission as it goes on the wire.
    pub fn to_http(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_accept_async_and_conflict() {
        let req = OperationRequest::new(Method::Post, "https://api/env");
        for code in [200, 201, 202, 204, 409] {
            assert!(req.expected_statuses.contains(&code));
        }
        assert!(!req.expected_statuses.contains(&404));
        assert!(!req.resubmit_on_failure);
        assert_eq!(req.completion, TerminalRule::lifecycle());
    }

    #[test]
    fn json_body_and_headers_reach_the_wire() {
        let req = OperationRequest::new(Method::Post, "https://api/link")
            .header("x-ms-client", "lro")
            .json(&serde_json::json!({ "SystemId": "abc" }))
            .unwrap();
        let http = req.to_http();
        assert_eq!(http.method, Method::Post);
        assert_eq!(http.headers.get("X-MS-Client"), Some("lro"));
        assert_eq!(http.body.as_deref(), Some(br#"{"SystemId":"abc"}"#.as_slice()));
    }

    #[test]
    fn follow_up_url_resolves_against_request() {
        let f = FollowUp::get("/envs/1");
        assert_eq!(
            f.resource_url("https://api.example/envs?v=1", b"").unwrap().as_str(),
            "https://api.example/envs/1"
        );
    }

    #[test]
    fn follow_up_id_from_link_path_or_name() {
        let f = FollowUp::id_from_body(
            &["links.environment.path", "name"],
            "https://api.example/scopes/admin/environments?api-version=2023-06-01",
        );
        let from_link = f
            .resource_url(
                "https://api.example/environments",
                br#"{"links":{"environment":{"path":"/providers/x/environments/env-9"}}}"#,
            )
            .unwrap();
        assert_eq!(
            from_link.as_str(),
            "https://api.example/scopes/admin/environments/env-9?api-version=2023-06-01"
        );
        let from_name = f
            .resource_url("https://api.example/environments", br#"{"name":"env 2"}"#)
            .unwrap();
        assert_eq!(
            from_name.as_str(),
            "https://api.example/scopes/admin/environments/env%202?api-version=2023-06-01"
        );
    }

    #[test]
    fn follow_up_without_id_is_protocol_error() {
        let f = FollowUp::id_from_body(&["name"], "https://api.example/envs");
        assert!(matches!(
            f.resource_url("https://api.example/envs", br#"{"state":{"id":"Succeeded"}}"#),
            Err(ProtocolViolation::MissingResourceId { .. })
        ));
        assert!(matches!(
            f.resource_url("https://api.example/envs", b""),
            Err(ProtocolViolation::MalformedBody { .. })
        ));
    }

    #[test]
    fn accept_replaces_statuses() {
        let req = OperationRequest::new(Method::Delete, "https://api/env/1").accept([202, 204, 404]);
        assert_eq!(req.expected_statuses.len(), 3);
        assert!(req.expected_statuses.contains(&404));
        assert!(!req.expected_statuses.contains(&409));
    }
}
