//! Routes, shared state and the error-to-response mapping.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use toolflow::{
    AgentRequest, AgentResponse, DispatchError, Gateway, GatewayError, ProtocolFilter,
    ProtocolKind,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::ws;

/// Shared state for all routes.
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/agent/v1/respond", post(respond))
        .route("/api/agent/v1/ws", get(ws::upgrade))
        .route("/api/agent/v1/analyze", post(analyze))
        .route("/api/agent/v1/strategies", get(strategies))
        .route("/api/agent/v1/tools", get(tools))
        .route("/api/agent/v1/protocols", get(protocols))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<Body>| {
                    info_span!("request", method = %req.method(), uri = %req.uri())
                }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP status for a wire error code.
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "NOT_FOUND" => StatusCode::NOT_FOUND,
        "PROTOCOL_DISABLED" => StatusCode::FORBIDDEN,
        "DUPLICATE_NAME" => StatusCode::CONFLICT,
        "EXECUTION_ERROR" | "CONFIG_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = match &self {
            ServerError::BadRequest(m) => AgentResponse::error("INVALID_REQUEST", m.clone()),
            ServerError::Gateway(e) => AgentResponse::from_error(e),
        };
        let status = body
            .error
            .as_ref()
            .map(|e| status_for_code(&e.code))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn respond(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(request) = body?;
    let run = state.gateway.prepare(&request)?;
    tracing::debug!(protocol = %run.protocol, policy = %run.policy, tools = run.input.tools.len(), "respond");

    match run.protocol {
        ProtocolKind::Http => {
            let response = state.gateway.respond_prepared(run).await;
            let status = response
                .error
                .as_ref()
                .map(|e| status_for_code(&e.code))
                .unwrap_or(StatusCode::OK);
            Ok((status, Json(response)).into_response())
        }
        ProtocolKind::Sse => {
            let rx = state.gateway.stream_sse(run);
            let stream = ReceiverStream::new(rx).map(|s| Ok::<_, std::io::Error>(Bytes::from(s)));
            let mut res = StatusCode::OK.into_response();
            res.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/event-stream"),
            );
            res.headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            *res.body_mut() = Body::from_stream(stream);
            Ok(res)
        }
        ProtocolKind::WebSocket => Err(GatewayError::from(DispatchError::TransportMismatch {
            protocol: ProtocolKind::WebSocket,
            transport: "response",
        })
        .into()),
    }
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<Value>, ServerError> {
    let Json(request) = body?;
    let analysis = state.gateway.analyze(&request)?;
    let tools: Vec<&str> = analysis.tools.iter().map(|t| t.name.as_str()).collect();
    Ok(Json(json!({
        "status": "success",
        "data": {
            "policy": analysis.policy,
            "total_tools": analysis.total_tools,
            "filtered_count": analysis.tools.len(),
            "tools": tools,
        }
    })))
}

async fn strategies(State(state): State<Arc<AppState>>) -> Json<Value> {
    let filtered = state.gateway.tools();
    Json(json!({
        "filter_strategies": filtered.catalog().names(),
        "default_filter_strategy": filtered.default_policy(),
        "protocol_filters": ProtocolFilter::names(),
    }))
}

async fn tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    let tools: Vec<Value> = state
        .gateway
        .tools()
        .registry()
        .list()
        .into_iter()
        .map(|t| {
            let schema = t.input_schema();
            json!({
                "name": t.name,
                "description": t.description,
                "tags": t.tags,
                "priority": t.priority,
                "input_schema": schema,
            })
        })
        .collect();
    Json(json!({ "count": tools.len(), "tools": tools }))
}

async fn protocols(State(state): State<Arc<AppState>>) -> Json<Value> {
    let dispatcher = state.gateway.dispatcher();
    let protocols: Vec<Value> = ProtocolKind::ALL
        .iter()
        .map(|k| {
            json!({
                "protocol": k,
                "mode": k.mode(),
                "available": dispatcher.is_available(*k),
            })
        })
        .collect();
    Json(json!({ "protocols": protocols }))
}
