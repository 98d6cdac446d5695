//! Terminal state interpretation.
//!
//! Resource kinds disagree on how "done" is spelled: lifecycle operations report
//! `state.id`, Dataverse provisioning reports `properties.provisioningState`,
//! some endpoints report nothing and signal completion by switching from 202 to
//! 200. Each call supplies its own rule; the poll loop never knows which.

use crate::error::ProtocolViolation;
use serde_json::Value;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    Succeeded(Vec<u8>),
    Failed { state: String, message: String },
    StillRunning,
}

/// Field path plus the values that mean success and failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVocabulary {
    path: String,
    succeeded: BTreeSet<String>,
    failed: BTreeSet<String>,
    /// When set, only these values mean "still running"; anything unknown fails.
    running: Option<BTreeSet<String>>,
}

/// `a.b.c` as the JSON pointer `/a/b/c`.
pub(crate) fn dot_pointer(path: &str) -> String {
    path.split('.')
        .filter(|s| !s.is_empty())
        .fold(String::new(), |mut acc, seg| {
            acc.push('/');
            acc.push_str(&seg.replace('~', "~0").replace('/', "~1"));
            acc
        })
}

fn to_set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl StateVocabulary {
    /// `path` is dot-separated (`state.id`, `properties.provisioningState`).
    pub fn new(path: &str, succeeded: &[&str], failed: &[&str]) -> Self {
        Self {
            path: path.to_string(),
            succeeded: to_set(succeeded),
            failed: to_set(failed),
            running: None,
        }
    }

    /// Restrict "still running" to `values`; any other unrecognised state is a failure.
    pub fn strict_running(mut self, values: &[&str]) -> Self {
        self.running = Some(to_set(values));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn lookup<'v>(&self, doc: &'v Value) -> Option<&'v str> {
        doc.pointer(&dot_pointer(&self.path)).and_then(Value::as_str)
    }

    fn judge(&self, state: &str, doc: &Value, body: &[u8]) -> TerminalOutcome {
        if self.succeeded.contains(state) {
            return TerminalOutcome::Succeeded(body.to_vec());
        }
        let unknown = self
            .running
            .as_ref()
            .is_some_and(|running| !running.contains(state));
        if self.failed.contains(state) || unknown {
            return TerminalOutcome::Failed {
                state: state.to_string(),
                message: failure_message(doc, state),
            };
        }
        TerminalOutcome::StillRunning
    }
}

fn failure_message(doc: &Value, state: &str) -> String {
    ["/error/message", "/properties/error/message", "/message"]
        .iter()
        .find_map(|p| doc.pointer(p).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("operation reached state {}", state))
}

/// How a poll (or synchronous) response reports completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalRule {
    /// 202 means running; any other accepted status means done. The body is not read.
    StatusOnly,
    StateField(StateVocabulary),
}

impl TerminalRule {
    /// Lifecycle operations: `state.id` is `Succeeded` or `Failed`.
    pub fn lifecycle() -> Self {
        TerminalRule::StateField(StateVocabulary::new("state.id", &["Succeeded"], &["Failed"]))
    }

    /// Resource provisioning: `properties.provisioningState`.
    pub fn provisioning() -> Self {
        TerminalRule::StateField(StateVocabulary::new(
            "properties.provisioningState",
            &["Succeeded"],
            &["Failed", "Canceled"],
        ))
    }

    pub fn state_field(path: &str, succeeded: &[&str], failed: &[&str]) -> Self {
        TerminalRule::StateField(StateVocabulary::new(path, succeeded, failed))
    }

    /// Interpret a response body received with `status`.
    ///
    /// On 202 a missing or unreadable state means the operation is still running.
    /// On any other status the state field must be present.
    pub fn interpret(&self, status: u16, body: &[u8]) -> Result<TerminalOutcome, ProtocolViolation> {
        let vocab = match self {
            TerminalRule::StatusOnly if status == 202 => return Ok(TerminalOutcome::StillRunning),
            TerminalRule::StatusOnly => return Ok(TerminalOutcome::Succeeded(body.to_vec())),
            TerminalRule::StateField(vocab) => vocab,
        };

        let still_running = status == 202;
        let doc: Value = match serde_json::from_slice(body) {
            Ok(doc) => doc,
            Err(_) if still_running => return Ok(TerminalOutcome::StillRunning),
            Err(_) if body.iter().all(u8::is_ascii_whitespace) => {
                return Err(ProtocolViolation::MissingStateField {
                    path: vocab.path.clone(),
                })
            }
            Err(e) => {
                return Err(ProtocolViolation::MalformedBody {
                    context: "poll",
                    reason: e.to_string(),
                })
            }
        };

        match vocab.lookup(&doc) {
            Some(state) => Ok(vocab.judge(state, &doc, body)),
            None if still_running => Ok(TerminalOutcome::StillRunning),
            None => Err(ProtocolViolation::MissingStateField {
                path: vocab.path.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_vocabulary() {
        let rule = TerminalRule::lifecycle();
        assert_eq!(
            rule.interpret(202, br#"{"state":{"id":"Running"}}"#).unwrap(),
            TerminalOutcome::StillRunning
        );
        assert!(matches!(
            rule.interpret(200, br#"{"state":{"id":"Succeeded"}}"#).unwrap(),
            TerminalOutcome::Succeeded(_)
        ));
        assert_eq!(
            rule.interpret(200, br#"{"state":{"id":"Failed"},"error":{"message":"quota"}}"#)
                .unwrap(),
            TerminalOutcome::Failed {
                state: "Failed".into(),
                message: "quota".into()
            }
        );
    }

    #[test]
    fn unknown_state_keeps_running_by_default() {
        let rule = TerminalRule::lifecycle();
        assert_eq!(
            rule.interpret(200, br#"{"state":{"id":"Provisioning"}}"#).unwrap(),
            TerminalOutcome::StillRunning
        );
    }

    #[test]
    fn strict_running_fails_unknown_states() {
        let rule = TerminalRule::StateField(
            StateVocabulary::new("properties.provisioningState", &["Succeeded"], &[])
                .strict_running(&["LinkedDatabaseProvisioning"]),
        );
        assert_eq!(
            rule.interpret(
                200,
                br#"{"properties":{"provisioningState":"LinkedDatabaseProvisioning"}}"#
            )
            .unwrap(),
            TerminalOutcome::StillRunning
        );
        assert!(matches!(
            rule.interpret(200, br#"{"properties":{"provisioningState":"Deleting"}}"#)
                .unwrap(),
            TerminalOutcome::Failed { ref state, .. } if state == "Deleting"
        ));
    }

    #[test]
    fn accepted_without_body_is_running() {
        let rule = TerminalRule::lifecycle();
        assert_eq!(rule.interpret(202, b"").unwrap(), TerminalOutcome::StillRunning);
        assert_eq!(rule.interpret(202, b"{}").unwrap(), TerminalOutcome::StillRunning);
    }

    #[test]
    fn completed_without_state_is_protocol_error() {
        let rule = TerminalRule::lifecycle();
        assert!(matches!(
            rule.interpret(200, br#"{"id":"op"}"#),
            Err(ProtocolViolation::MissingStateField { .. })
        ));
        assert!(matches!(
            rule.interpret(200, b""),
            Err(ProtocolViolation::MissingStateField { .. })
        ));
        assert!(matches!(
            rule.interpret(200, b"not json"),
            Err(ProtocolViolation::MalformedBody { .. })
        ));
    }

    #[test]
    fn status_only_rule() {
        let rule = TerminalRule::StatusOnly;
        assert_eq!(rule.interpret(202, b"").unwrap(), TerminalOutcome::StillRunning);
        assert_eq!(
            rule.interpret(200, b"{}").unwrap(),
            TerminalOutcome::Succeeded(b"{}".to_vec())
        );
    }

    #[test]
    fn failure_message_falls_back_to_state() {
        let rule = TerminalRule::provisioning();
        assert_eq!(
            rule.interpret(200, br#"{"properties":{"provisioningState":"Canceled"}}"#)
                .unwrap(),
            TerminalOutcome::Failed {
                state: "Canceled".into(),
                message: "operation reached state Canceled".into()
            }
        );
    }
}
