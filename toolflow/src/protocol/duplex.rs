//! Duplex (WebSocket) adapter.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::session::{render_frame, FrameWriter, Session};
use super::{ProtocolAdapter, ProtocolKind, SessionError, SessionState};
use crate::event::LifecycleEvent;
use crate::wire::AgentRequest;

/// Reads one request message from the client, then writes one JSON text frame per event.
///
/// Events cannot be rendered before the request arrives. A malformed request message
/// leaves the session idle so the client can resend.
#[derive(Debug)]
pub struct DuplexAdapter {
    session: Session,
    writer: FrameWriter,
    request_received: bool,
}

impl DuplexAdapter {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            session: Session::new(ProtocolKind::WebSocket),
            writer: FrameWriter::new(tx),
            request_received: false,
        }
    }

    /// Parses the client's request message and opens the session.
    pub fn accept_request(&mut self, text: &str) -> Result<AgentRequest, SessionError> {
        if self.session.state() >= SessionState::Draining {
            return Err(SessionError::Closed);
        }
        if self.request_received {
            return Err(SessionError::RequestAlreadyReceived);
        }
        let request: AgentRequest = serde_json::from_str(text)
            .map_err(|e| SessionError::InvalidRequest(e.to_string()))?;
        self.request_received = true;
        self.session.open();
        Ok(request)
    }

    pub fn has_request(&self) -> bool {
        self.request_received
    }
}

#[async_trait]
impl ProtocolAdapter for DuplexAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::WebSocket
    }

    fn state(&self) -> SessionState {
        self.session.state()
    }

    async fn render(&mut self, event: LifecycleEvent) -> Result<(), SessionError> {
        if self.session.state() >= SessionState::Draining {
            return Err(SessionError::Closed);
        }
        if !self.request_received {
            return Err(SessionError::AwaitingRequest);
        }
        self.session.begin_render()?;
        if !self.writer.is_connected() {
            self.writer.finish();
            return Err(self.session.disconnected());
        }
        let frame = event.to_wire()?;
        render_frame(
            &mut self.session,
            &mut self.writer,
            frame,
            event.is_terminal(),
        )
        .await
    }

    fn cancel(&mut self) {
        self.writer.finish();
        self.session.close();
    }
}
