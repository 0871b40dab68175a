//! Session lifecycle bookkeeping shared by the adapters.

use std::fmt;

use tokio::sync::mpsc;

use super::{ProtocolKind, SessionError};
use crate::logging;

/// `Idle -> Open -> Draining -> Closed`; transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    Idle,
    Open,
    /// Terminal event received; flushing to the transport.
    Draining,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Open => "open",
            SessionState::Draining => "draining",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub(super) struct Session {
    kind: ProtocolKind,
    state: SessionState,
    rendered: usize,
}

impl Session {
    pub(super) fn new(kind: ProtocolKind) -> Self {
        Self {
            kind,
            state: SessionState::Idle,
            rendered: 0,
        }
    }

    pub(super) fn kind(&self) -> ProtocolKind {
        self.kind
    }

    pub(super) fn state(&self) -> SessionState {
        self.state
    }

    /// Rejects renders into a closed session; opens an idle one.
    pub(super) fn begin_render(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Closed | SessionState::Draining => Err(SessionError::Closed),
            SessionState::Idle => {
                self.open();
                Ok(())
            }
            SessionState::Open => Ok(()),
        }
    }

    pub(super) fn open(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Open;
            logging::log_session_opened(self.kind);
        }
    }

    pub(super) fn count_render(&mut self) {
        self.rendered += 1;
    }

    pub(super) fn drain(&mut self) {
        if self.state < SessionState::Draining {
            self.state = SessionState::Draining;
        }
    }

    pub(super) fn close(&mut self) {
        if self.state != SessionState::Closed {
            self.state = SessionState::Closed;
            logging::log_session_closed(self.kind, self.rendered);
        }
    }

    /// Closes after a disconnect and returns the error to hand back.
    pub(super) fn disconnected(&mut self) -> SessionError {
        logging::log_client_disconnected(self.kind);
        self.close();
        SessionError::Disconnected
    }
}

/// Writer half of a framed text transport (SSE body, WebSocket outbound queue).
#[derive(Debug)]
pub(super) struct FrameWriter {
    tx: Option<mpsc::Sender<String>>,
}

impl FrameWriter {
    pub(super) fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx: Some(tx) }
    }

    pub(super) fn is_connected(&self) -> bool {
        self.tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Sends one frame; `false` when the reader is gone.
    pub(super) async fn send(&self, frame: String) -> bool {
        match &self.tx {
            Some(tx) => tx.send(frame).await.is_ok(),
            None => false,
        }
    }

    /// Drops the sender so the reader sees end of stream.
    pub(super) fn finish(&mut self) {
        self.tx = None;
    }
}

/// Renders one frame through `writer`, closing the session on the terminal frame or on
/// disconnect.
pub(super) async fn render_frame(
    session: &mut Session,
    writer: &mut FrameWriter,
    frame: String,
    terminal: bool,
) -> Result<(), SessionError> {
    if terminal {
        session.drain();
    }
    if !writer.send(frame).await {
        writer.finish();
        return Err(session.disconnected());
    }
    session.count_render();
    if terminal {
        writer.finish();
        session.close();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: states only move forward; a closed session rejects renders.
    #[test]
    fn transitions_are_monotonic() {
        let mut s = Session::new(ProtocolKind::Http);
        assert_eq!(s.state(), SessionState::Idle);
        s.begin_render().unwrap();
        assert_eq!(s.state(), SessionState::Open);
        s.drain();
        assert_eq!(s.state(), SessionState::Draining);
        assert_eq!(s.begin_render(), Err(SessionError::Closed));
        s.close();
        s.open();
        assert_eq!(s.state(), SessionState::Closed);
        assert_eq!(s.begin_render(), Err(SessionError::Closed));
    }
}
