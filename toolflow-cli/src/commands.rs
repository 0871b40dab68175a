//! Command implementations.

use std::sync::Arc;

use tokio::sync::mpsc;
use toolflow::{
    AgentRequest, ConfigError, DuplexAdapter, EchoOrchestrator, Gateway, GatewayConfig,
    GatewayError, ProtocolAdapter, ProtocolKind,
};

use crate::args::RequestOptions;

/// CLI error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("{code}: {source}")]
    Gateway {
        code: &'static str,
        #[source]
        source: GatewayError,
    },
    #[error("encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<GatewayError> for Error {
    fn from(source: GatewayError) -> Self {
        Error::Gateway {
            code: source.code(),
            source,
        }
    }
}

/// Loads .env and env config, then builds a gateway around [`EchoOrchestrator`].
pub fn build_gateway() -> Result<Arc<Gateway>, Error> {
    dotenv::dotenv().ok();
    let config = GatewayConfig::from_env()?;
    let gateway = Gateway::from_config(&config, Arc::new(EchoOrchestrator))?;
    Ok(Arc::new(gateway))
}

fn request(options: &RequestOptions, input: &str) -> AgentRequest {
    let mut request = AgentRequest::new(input).with_tool_tags(options.tags.iter().cloned());
    request.filter_strategy = options.strategy.clone();
    request
}

/// One line per tool: `name [priority] tags - description`.
pub fn list_tools(gateway: &Gateway) -> Vec<String> {
    gateway
        .tools()
        .registry()
        .list()
        .iter()
        .map(|t| {
            let tags: Vec<&str> = t.tags.iter().map(String::as_str).collect();
            format!(
                "{} [{}] {} - {}",
                t.name,
                t.priority,
                tags.join(","),
                t.description
            )
        })
        .collect()
}

/// Policy label, then the tools it keeps.
pub fn analyze(gateway: &Gateway, options: &RequestOptions) -> Result<Vec<String>, Error> {
    let analysis = gateway.analyze(&request(options, ""))?;
    let mut lines = vec![format!(
        "policy: {} ({} of {} tools)",
        analysis.policy,
        analysis.tools.len(),
        analysis.total_tools
    )];
    lines.extend(analysis.tools.iter().map(|t| format!("  {}", t.name)));
    Ok(lines)
}

/// Runs `input` through the adapter for `protocol` and returns what it wrote.
///
/// http: one pretty-printed envelope. sse: one `data: ..` line per frame. websocket: one
/// JSON text frame per line.
pub async fn run_request(
    gateway: &Arc<Gateway>,
    options: &RequestOptions,
    protocol: &str,
    input: &str,
) -> Result<Vec<String>, Error> {
    let request = request(options, input).with_protocol(protocol);
    let kind = gateway.dispatcher().resolve_adapter(protocol).map_err(GatewayError::from)?;

    match kind {
        ProtocolKind::Http => {
            let response = gateway.respond(&request).await;
            Ok(vec![serde_json::to_string_pretty(&response)?])
        }
        ProtocolKind::Sse => {
            let run = gateway.prepare(&request)?;
            let mut rx = gateway.stream_sse(run);
            let mut lines = Vec::new();
            while let Some(frame) = rx.recv().await {
                lines.push(frame.trim_end().to_string());
            }
            Ok(lines)
        }
        ProtocolKind::WebSocket => {
            let (tx, mut rx) = mpsc::channel(256);
            let mut adapter = DuplexAdapter::new(tx);
            let message = serde_json::to_string(&request)?;
            let serve = async {
                let outcome = gateway.serve_duplex(&mut adapter, &message).await;
                adapter.cancel();
                outcome
            };
            let collect = async {
                let mut lines = Vec::new();
                while let Some(frame) = rx.recv().await {
                    lines.push(frame);
                }
                lines
            };
            let (outcome, lines) = tokio::join!(serve, collect);
            outcome?;
            Ok(lines)
        }
    }
}
