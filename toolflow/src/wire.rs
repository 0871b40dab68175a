//! Request and response shapes exchanged with clients.
//!
//! [`AgentRequest`] is protocol-agnostic; [`AgentResponse`] is the single JSON envelope
//! written by the request/response adapter and used for errors raised before a session
//! opens.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::event::CallId;

fn default_protocol() -> String {
    "http".to_string()
}

/// Inbound request.
///
/// `protocol` and `mode` stay strings so an unknown value is reported as
/// `UNSUPPORTED_PROTOCOL` by dispatch rather than as a body parse failure. `mode` is
/// derived from the protocol when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    #[serde(alias = "query")]
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default = "default_protocol", alias = "protocol_type")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl AgentRequest {
    /// HTTP request with no filter, tags or params.
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            conversation_id: None,
            protocol: default_protocol(),
            mode: None,
            filter_strategy: None,
            tool_tags: Vec::new(),
            params: None,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_filter_strategy(mut self, name: impl Into<String>) -> Self {
        self.filter_strategy = Some(name.into());
        self
    }

    pub fn with_tool_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Outcome of one tool call in an aggregated response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Completed,
    Failed,
    /// No result arrived before the run terminated.
    Timeout,
}

/// A tool call paired with its result, in start order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub call_id: CallId,
    pub tool_name: String,
    pub arguments: Value,
    pub status: ToolCallStatus,
    /// Null when the call failed or timed out.
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub response: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// `{"status": "success" | "error", "data": {..}?, "error": {code, message}?}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Error code for a failure reported by the orchestration collaborator.
pub const CODE_EXECUTION_ERROR: &str = "EXECUTION_ERROR";

impl AgentResponse {
    pub fn success(response: impl Into<String>, tool_calls: Vec<ToolCallRecord>) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(ResponseData {
                response: response.into(),
                tool_calls,
            }),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// Error envelope for a gateway error (message only, no internal details).
    pub fn from_error(err: &GatewayError) -> Self {
        Self::error(err.code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }
}
