//! Protocol adapters: render one request's lifecycle events onto a client transport.
//!
//! Three adapters share the [`ProtocolAdapter`] contract:
//!
//! - [`ResponseAdapter`] (`http`, sync): buffers events, writes one aggregated
//!   [`AgentResponse`](crate::wire::AgentResponse) on the terminal event.
//! - [`SseAdapter`] (`sse`, stream): one `data: {json}\n\n` frame per event.
//! - [`DuplexAdapter`] (`websocket`, stream): reads one request message, then one JSON
//!   text frame per event.
//!
//! Every session moves `Idle -> Open -> Draining -> Closed`, never backwards. Rendering
//! into a closed session is an error; a client disconnect closes the session at once.
//! [`ProtocolDispatcher`] maps a protocol id to the adapter for it.

mod dispatch;
mod duplex;
mod error;
mod response;
mod session;
mod sse;

pub use dispatch::{ProtocolDispatcher, Transport};
pub use duplex::DuplexAdapter;
pub use error::{DispatchError, SessionError};
pub use response::{assemble_response, ResponseAdapter};
pub use session::SessionState;
pub use sse::{sse_frame, SseAdapter};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::event::LifecycleEvent;

/// Client-facing protocol. Wire ids: `http`, `sse`, `websocket`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    Http,
    Sse,
    WebSocket,
}

impl ProtocolKind {
    pub const ALL: [ProtocolKind; 3] = [ProtocolKind::Http, ProtocolKind::Sse, ProtocolKind::WebSocket];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::Http => "http",
            ProtocolKind::Sse => "sse",
            ProtocolKind::WebSocket => "websocket",
        }
    }

    /// Response mode the protocol is fixed to.
    pub fn mode(&self) -> ResponseMode {
        match self {
            ProtocolKind::Http => ResponseMode::Sync,
            ProtocolKind::Sse | ProtocolKind::WebSocket => ResponseMode::Stream,
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolKind {
    type Err = DispatchError;

    /// Case-insensitive; `ws` is accepted for `websocket`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(ProtocolKind::Http),
            "sse" => Ok(ProtocolKind::Sse),
            "websocket" | "ws" => Ok(ProtocolKind::WebSocket),
            _ => Err(DispatchError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// Sync: one aggregated response. Stream: incremental messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Sync,
    Stream,
}

impl ResponseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseMode::Sync => "sync",
            ResponseMode::Stream => "stream",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(ResponseMode::Sync),
            "stream" => Ok(ResponseMode::Stream),
            _ => Err(DispatchError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Renders lifecycle events for one session onto its transport.
///
/// Implementations own the transport writer; the session ends when the terminal event
/// is rendered or [`cancel`](ProtocolAdapter::cancel) is called.
#[async_trait]
pub trait ProtocolAdapter: Send {
    fn kind(&self) -> ProtocolKind;

    fn state(&self) -> SessionState;

    /// Renders one event. Errors with [`SessionError::Closed`] once the session closed
    /// and [`SessionError::Disconnected`] when the client went away.
    async fn render(&mut self, event: LifecycleEvent) -> Result<(), SessionError>;

    /// Drops the transport writer and moves to `Closed`.
    fn cancel(&mut self);

    fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }
}
