//! WebSocket route: one request per socket.
//!
//! The first valid text frame is the request. Malformed request frames get an `error`
//! frame and the socket keeps waiting. After the terminal event the server closes the
//! socket. A Close frame or read error while the session runs cancels it, and so does a
//! write failure. The upgrade itself is refused with `PROTOCOL_DISABLED` when websocket is
//! not available.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{IntoResponse, Response},
};
use futures::{stream::SplitStream, SinkExt, StreamExt};
use tokio::sync::mpsc;
use toolflow::{
    DispatchError, DuplexAdapter, GatewayError, LifecycleEvent, ProtocolAdapter, ProtocolKind,
};

use crate::app::{AppState, ServerError};

/// Outbound frame queue size per socket.
const OUTBOUND_BUFFER: usize = 256;

pub async fn upgrade(
    State(state): State<Arc<AppState>>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if !state.gateway.dispatcher().is_available(ProtocolKind::WebSocket) {
        return ServerError::from(GatewayError::from(DispatchError::ProtocolDisabled(
            ProtocolKind::WebSocket,
        )))
        .into_response();
    }
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => rejection.into_response(),
    }
}

/// Reads the socket until the client goes away. Frames sent while a session runs are
/// ignored.
async fn client_gone(stream: &mut SplitStream<WebSocket>) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => return,
            Ok(_) => tracing::debug!("ignoring websocket frame during session"),
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let rejections = tx.clone();
    let mut adapter = DuplexAdapter::new(tx);
    while let Some(message) = stream.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        let served = tokio::select! {
            served = state.gateway.serve_duplex(&mut adapter, &text) => Some(served),
            _ = client_gone(&mut stream) => None,
        };
        let Some(served) = served else {
            tracing::debug!("websocket client left; session cancelled");
            adapter.cancel();
            break;
        };
        match served {
            Ok(outcome) => {
                tracing::debug!(?outcome, "websocket session finished");
                break;
            }
            Err(GatewayError::Session(err)) if !adapter.has_request() => {
                tracing::debug!(error = %err, "rejected websocket request frame");
                let frame = match LifecycleEvent::error(err.to_string()).to_wire() {
                    Ok(frame) => frame,
                    Err(_) => break,
                };
                if rejections.send(frame).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "websocket session failed");
                break;
            }
        }
    }

    drop(rejections);
    drop(adapter);
    let _ = writer.await;
}
