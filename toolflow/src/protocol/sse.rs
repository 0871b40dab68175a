//! Server-sent events adapter.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::session::{render_frame, FrameWriter, Session};
use super::{ProtocolAdapter, ProtocolKind, SessionError, SessionState};
use crate::event::LifecycleEvent;

/// `data: {json}\n\n` for one event.
pub fn sse_frame(event: &LifecycleEvent) -> Result<String, serde_json::Error> {
    Ok(format!("data: {}\n\n", event.to_wire()?))
}

/// Pushes one SSE frame per event into the response body channel.
///
/// The body stream ends when the terminal event is written (the sender is dropped).
#[derive(Debug)]
pub struct SseAdapter {
    session: Session,
    writer: FrameWriter,
}

impl SseAdapter {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self {
            session: Session::new(ProtocolKind::Sse),
            writer: FrameWriter::new(tx),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for SseAdapter {
    fn kind(&self) -> ProtocolKind {
        ProtocolKind::Sse
    }

    fn state(&self) -> SessionState {
        self.session.state()
    }

    async fn render(&mut self, event: LifecycleEvent) -> Result<(), SessionError> {
        self.session.begin_render()?;
        if !self.writer.is_connected() {
            self.writer.finish();
            return Err(self.session.disconnected());
        }
        let frame = sse_frame(&event)?;
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
