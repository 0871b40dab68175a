//! Dispatch and session errors.

use thiserror::Error;

use super::{ProtocolKind, ResponseMode};

/// Error selecting an adapter for a request. Raised before any session opens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("unsupported response mode: {0}")]
    UnsupportedMode(String),

    #[error("protocol {protocol} does not support {mode} responses")]
    IncompatibleMode {
        protocol: ProtocolKind,
        mode: ResponseMode,
    },

    #[error("protocol disabled: {0}")]
    ProtocolDisabled(ProtocolKind),

    /// The transport handed to `open_session` cannot carry the protocol.
    #[error("protocol {protocol} cannot use a {transport} transport")]
    TransportMismatch {
        protocol: ProtocolKind,
        transport: &'static str,
    },
}

/// Error rendering into a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session already reached `Closed`.
    #[error("session closed")]
    Closed,

    /// The client went away; the session is now `Closed`.
    #[error("client disconnected")]
    Disconnected,

    /// Duplex session has not received its request message yet.
    #[error("session is awaiting its request message")]
    AwaitingRequest,

    /// Duplex sessions carry one request.
    #[error("session already received a request")]
    RequestAlreadyReceived,

    #[error("invalid request message: {0}")]
    InvalidRequest(String),

    #[error("failed to encode event: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Encode(e.to_string())
    }
}
