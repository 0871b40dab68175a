//! Request/response adapter: one aggregated JSON envelope per session.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use super::session::Session;
use super::{ProtocolAdapter, ProtocolKind, SessionError, SessionState};
use crate::event::{CallId, LifecycleEvent};
use crate::wire::{AgentResponse, ToolCallRecord, ToolCallStatus, CODE_EXECUTION_ERROR};

/// Folds a terminated event sequence into the response envelope.
///
/// Tool calls appear in start order, each paired with the result carrying the same
/// `call_id`. A call with no result gets status `timeout` and a null result; a result
/// with no start is ignored. `Error` yields an `EXECUTION_ERROR` envelope.
pub fn assemble_response(events: &[LifecycleEvent]) -> AgentResponse {
    let mut calls: Vec<ToolCallRecord> = Vec::new();
    let mut by_id: HashMap<&CallId, usize> = HashMap::new();

    for event in events {
        match event {
            LifecycleEvent::ToolCallStart {
                call_id,
                tool_name,
                arguments,
            } => {
                by_id.insert(call_id, calls.len());
                calls.push(ToolCallRecord {
                    call_id: call_id.clone(),
                    tool_name: tool_name.clone(),
                    arguments: arguments.clone(),
                    status: ToolCallStatus::Timeout,
                    result: Value::Null,
                    error: None,
                });
            }
            LifecycleEvent::ToolCallResult {
                call_id,
                result,
                error,
            } => {
                if let Some(&i) = by_id.get(call_id) {
                    let record = &mut calls[i];
                    record.status = if error.is_some() {
                        ToolCallStatus::Failed
                    } else {
                        ToolCallStatus::Completed
                    };
                    record.result = result.clone();
                    record.error = error.clone();
                }
            }
            LifecycleEvent::Token { .. } => {}
            LifecycleEvent::Final { response } => {
                return AgentResponse::success(response.clone(), calls);
            }
            LifecycleEvent::Error { message, .. } => {
                return AgentResponse::error(CODE_EXECUTION_ERROR, message.clone());
            }
        }
    }
    AgentResponse::error(
        CODE_EXECUTION_ERROR,
        "orchestration ended without a final response",
    )
}

/// Buffers events until the terminal one, then writes a single [`AgentResponse`].
#[derive(Debug)]
pub struct ResponseAdapter {
    session: Session,
    writer: Option<oneshot::Sender<AgentResponse>>,
    buffer: Vec<LifecycleEvent>,
}

impl ResponseAdapter {
    pub fn new(writer: oneshot::Sender<AgentResponse>) -> Self {
        Self {
            session: Session::new(ProtocolKind::Http),
            writer: Some(writer),
            buffer: Vec::new(),
        }
    }

    /// Adapter plus the receiver the aggregated response arrives on.
    pub fn channel() -> (Self, oneshot::Receiver<AgentResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ProtocolAdapter for ResponseAdapter {
    fn kind(&self) -> ProtocolKind {
        self.session.kind()
    }

    fn state(&self) -> SessionState {
        self.session.state()
    }

    async fn render(&mut self, event: LifecycleEvent) -> Result<(), SessionError> {
        self.session.begin_render()?;
        if self.writer.as_ref().map_or(true, |w| w.is_closed()) {
            self.buffer.clear();
            self.writer = None;
            return Err(self.session.disconnected());
        }

        let terminal = event.is_terminal();
        self.buffer.push(event);
        self.session.count_render();
        if !terminal {
            return Ok(());
        }

        self.session.drain();
        let response = assemble_response(&self.buffer);
        self.buffer.clear();
        let sent = match self.writer.take() {
            Some(writer) => writer.send(response).is_ok(),
            None => false,
        };
        if !sent {
            return Err(self.session.disconnected());
        }
        self.session.close();
        Ok(())
    }

    fn cancel(&mut self) {
        self.writer = None;
        self.buffer.clear();
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// **Scenario**: start, result and final fold into a success envelope.
    #[tokio::test]
    async fn aggregates_on_final() {
        let (mut adapter, rx) = ResponseAdapter::channel();
        adapter
            .render(LifecycleEvent::tool_call_start("1", "a", json!({})))
            .await
            .unwrap();
        assert_eq!(adapter.state(), SessionState::Open);
        adapter
            .render(LifecycleEvent::tool_call_result("1", json!(42)))
            .await
            .unwrap();
        adapter
            .render(LifecycleEvent::final_response("done"))
            .await
            .unwrap();
        assert_eq!(adapter.state(), SessionState::Closed);

        let response = serde_json::to_value(rx.await.unwrap()).unwrap();
        assert_eq!(response["status"], "success");
        assert_eq!(response["data"]["response"], "done");
        let call = &response["data"]["tool_calls"][0];
        assert_eq!(call["call_id"], "1");
        assert_eq!(call["tool_name"], "a");
        assert_eq!(call["result"], 42);
        assert_eq!(call["status"], "completed");
    }

    /// **Scenario**: a call with no result is reported with a null result.
    #[test]
    fn missing_result_is_null() {
        let response = assemble_response(&[
            LifecycleEvent::tool_call_start("1", "a", json!({})),
            LifecycleEvent::final_response("done"),
        ]);
        let v = serde_json::to_value(response).unwrap();
        let call = &v["data"]["tool_calls"][0];
        assert!(call["result"].is_null());
        assert_eq!(call["status"], "timeout");
    }

    /// **Scenario**: calls keep start order even when results arrive out of order;
    /// failed results and orphan results are handled.
    #[test]
    fn pairs_by_call_id() {
        let response = assemble_response(&[
            LifecycleEvent::tool_call_start("1", "a", json!({})),
            LifecycleEvent::tool_call_start("2", "b", json!({})),
            LifecycleEvent::tool_call_failed("2", "no network"),
            LifecycleEvent::tool_call_result("1", json!("ok")),
            LifecycleEvent::tool_call_result("9", json!("orphan")),
            LifecycleEvent::final_response("done"),
        ]);
        let data = response.data.unwrap();
        assert_eq!(data.tool_calls.len(), 2);
        assert_eq!(data.tool_calls[0].tool_name, "a");
        assert_eq!(data.tool_calls[0].status, ToolCallStatus::Completed);
        assert_eq!(data.tool_calls[1].status, ToolCallStatus::Failed);
        assert_eq!(data.tool_calls[1].error.as_deref(), Some("no network"));
        assert!(data.tool_calls[1].result.is_null());
    }

    /// **Scenario**: Error terminal yields the error envelope with EXECUTION_ERROR.
    #[tokio::test]
    async fn error_terminal_yields_error_envelope() {
        let (mut adapter, rx) = ResponseAdapter::channel();
        adapter
            .render(LifecycleEvent::error_with_details("model failed", "secret"))
            .await
            .unwrap();
        let response = rx.await.unwrap();
        assert!(!response.is_success());
        let err = response.error.unwrap();
        assert_eq!(err.code, "EXECUTION_ERROR");
        assert_eq!(err.message, "model failed");
    }

    /// **Scenario**: rendering after the terminal event fails with Closed.
    #[tokio::test]
    async fn render_after_terminal_is_closed() {
        let (mut adapter, _rx) = ResponseAdapter::channel();
        adapter
            .render(LifecycleEvent::final_response("done"))
            .await
            .unwrap();
        assert_eq!(
            adapter.render(LifecycleEvent::token("late")).await,
            Err(SessionError::Closed)
        );
    }

    /// **Scenario**: a dropped receiver is a disconnect; the session closes.
    #[tokio::test]
    async fn dropped_receiver_is_disconnect() {
        let (mut adapter, rx) = ResponseAdapter::channel();
        drop(rx);
        assert_eq!(
            adapter.render(LifecycleEvent::token("x")).await,
            Err(SessionError::Disconnected)
        );
        assert!(adapter.is_closed());
    }
}
