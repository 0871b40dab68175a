//! Lifecycle events emitted by the orchestration collaborator during one request.
//!
//! The serde form of [`LifecycleEvent`] is the streaming wire message:
//! `{"type": "tool_call_start" | "tool_call_result" | "token" | "final" | "error", ...}`.
//! `Error.details` is kept for server-side logs and never serialized.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::logging;

/// Identifier pairing a tool call start with its result.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub String);

impl From<&str> for CallId {
    fn from(s: &str) -> Self {
        CallId(s.to_string())
    }
}

impl From<String> for CallId {
    fn from(s: String) -> Self {
        CallId(s)
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discriminant of a [`LifecycleEvent`], matching the wire `type` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    ToolCallStart,
    ToolCallResult,
    Token,
    Final,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ToolCallStart => "tool_call_start",
            EventKind::ToolCallResult => "tool_call_result",
            EventKind::Token => "token",
            EventKind::Final => "final",
            EventKind::Error => "error",
        }
    }
}

/// One step of an orchestration run.
///
/// Ordering contract per request: a `ToolCallStart` precedes the `ToolCallResult` with
/// the same `call_id`; exactly one `Final` or `Error` ends the sequence; nothing follows it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    ToolCallStart {
        call_id: CallId,
        tool_name: String,
        #[serde(default)]
        arguments: Value,
    },
    ToolCallResult {
        call_id: CallId,
        #[serde(default)]
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Token {
        text: String,
    },
    Final {
        response: String,
    },
    Error {
        message: String,
        #[serde(default, skip_serializing)]
        details: Option<String>,
    },
}

impl LifecycleEvent {
    pub fn tool_call_start(
        call_id: impl Into<CallId>,
        tool_name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        LifecycleEvent::ToolCallStart {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            arguments,
        }
    }

    pub fn tool_call_result(call_id: impl Into<CallId>, result: Value) -> Self {
        LifecycleEvent::ToolCallResult {
            call_id: call_id.into(),
            result,
            error: None,
        }
    }

    /// Result of a tool call that failed: null result plus the error text.
    pub fn tool_call_failed(call_id: impl Into<CallId>, error: impl Into<String>) -> Self {
        LifecycleEvent::ToolCallResult {
            call_id: call_id.into(),
            result: Value::Null,
            error: Some(error.into()),
        }
    }

    pub fn token(text: impl Into<String>) -> Self {
        LifecycleEvent::Token { text: text.into() }
    }

    pub fn final_response(response: impl Into<String>) -> Self {
        LifecycleEvent::Final {
            response: response.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        LifecycleEvent::Error {
            message: message.into(),
            details: None,
        }
    }

    pub fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        LifecycleEvent::Error {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::ToolCallStart { .. } => EventKind::ToolCallStart,
            LifecycleEvent::ToolCallResult { .. } => EventKind::ToolCallResult,
            LifecycleEvent::Token { .. } => EventKind::Token,
            LifecycleEvent::Final { .. } => EventKind::Final,
            LifecycleEvent::Error { .. } => EventKind::Error,
        }
    }

    /// True for `Final` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleEvent::Final { .. } | LifecycleEvent::Error { .. })
    }

    /// Wire JSON text for this event.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// What to do with an event coming off the producer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Forward,
    /// The sequence already terminated; the event is discarded.
    Drop,
}

/// Checks the producer's event stream against the ordering contract.
///
/// Events after the terminal one are dropped. A result whose call never started is
/// logged and still forwarded; adapters decide how to render it.
#[derive(Debug, Default)]
pub struct EventSequencer {
    started: HashSet<CallId>,
    terminated: bool,
    admitted: usize,
}

impl EventSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, event: &LifecycleEvent) -> Admission {
        if self.terminated {
            logging::log_sequence_violation("event after terminal event");
            return Admission::Drop;
        }
        match event {
            LifecycleEvent::ToolCallStart { call_id, .. } => {
                if !self.started.insert(call_id.clone()) {
                    logging::log_sequence_violation("duplicate tool_call_start");
                }
            }
            LifecycleEvent::ToolCallResult { call_id, .. } => {
                if !self.started.contains(call_id) {
                    logging::log_sequence_violation("tool_call_result without tool_call_start");
                }
            }
            LifecycleEvent::Final { .. } | LifecycleEvent::Error { .. } => {
                self.terminated = true;
            }
            LifecycleEvent::Token { .. } => {}
        }
        self.admitted += 1;
        Admission::Forward
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Number of events forwarded so far.
    pub fn admitted(&self) -> usize {
        self.admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: wire form carries the type tag and type-specific fields.
    #[test]
    fn wire_format_is_type_tagged() {
        let start = LifecycleEvent::tool_call_start("1", "a", json!({ "q": 1 }));
        let v: Value = serde_json::from_str(&start.to_wire().unwrap()).unwrap();
        assert_eq!(
            v,
            json!({ "type": "tool_call_start", "call_id": "1", "tool_name": "a", "arguments": { "q": 1 } })
        );

        let token: Value = serde_json::to_value(LifecycleEvent::token("hi")).unwrap();
        assert_eq!(token, json!({ "type": "token", "text": "hi" }));

        let ok: Value = serde_json::to_value(LifecycleEvent::tool_call_result("1", json!(42))).unwrap();
        assert_eq!(ok, json!({ "type": "tool_call_result", "call_id": "1", "result": 42 }));
    }

    /// **Scenario**: error details never reach the wire.
    #[test]
    fn error_details_are_not_serialized() {
        let e = LifecycleEvent::error_with_details("failed", "stack trace here");
        let wire = e.to_wire().unwrap();
        assert!(!wire.contains("stack trace"));
        assert_eq!(
            serde_json::from_str::<Value>(&wire).unwrap(),
            json!({ "type": "error", "message": "failed" })
        );
    }

    #[test]
    fn terminal_kinds() {
        assert!(LifecycleEvent::final_response("x").is_terminal());
        assert!(LifecycleEvent::error("x").is_terminal());
        assert!(!LifecycleEvent::token("x").is_terminal());
        assert_eq!(LifecycleEvent::final_response("x").kind().as_str(), "final");
    }

    /// **Scenario**: the sequencer drops everything after the terminal event.
    #[test]
    fn sequencer_drops_after_terminal() {
        let mut seq = EventSequencer::new();
        assert_eq!(seq.admit(&LifecycleEvent::token("a")), Admission::Forward);
        assert_eq!(seq.admit(&LifecycleEvent::final_response("done")), Admission::Forward);
        assert!(seq.is_terminated());
        assert_eq!(seq.admit(&LifecycleEvent::token("late")), Admission::Drop);
        assert_eq!(seq.admit(&LifecycleEvent::error("late")), Admission::Drop);
        assert_eq!(seq.admitted(), 2);
    }

    /// **Scenario**: a result without a start is forwarded, not dropped.
    #[test]
    fn sequencer_forwards_orphan_result() {
        let mut seq = EventSequencer::new();
        let orphan = LifecycleEvent::tool_call_result("9", json!(null));
        assert_eq!(seq.admit(&orphan), Admission::Forward);
        assert!(!seq.is_terminated());
    }
}
