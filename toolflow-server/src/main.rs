//! HTTP host for the toolflow gateway.
//!
//! Routes (all JSON unless noted):
//! - `POST /api/agent/v1/respond`: `protocol=http` -> envelope, `protocol=sse` -> `text/event-stream`
//! - `GET /api/agent/v1/ws`: WebSocket; first text frame is the request
//! - `POST /api/agent/v1/analyze`, `GET /api/agent/v1/{strategies,tools,protocols}`, `GET /health`
//!
//! Configure via env (see `GatewayConfig::from_env`): LISTEN, DEFAULT_FILTER_STRATEGY,
//! POLICY_CATALOG_PATH, TOOL_CATALOG_PATH, ENABLED_PROTOCOLS, PROTOCOL_FILTER, EVENT_BUFFER,
//! LOG_FILE, RUST_LOG. Load .env with dotenv.

mod app;
mod ws;

use std::sync::Arc;

use toolflow::{EchoOrchestrator, Gateway, GatewayConfig};
use tracing::info;

use crate::app::{router, AppState};

/// Load .env from current directory; if not found, try parent (workspace root when run from crate dir).
fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        return;
    }
    if let Ok(cwd) = std::env::current_dir() {
        if let Some(parent) = cwd.parent() {
            let env_path = parent.join(".env");
            if env_path.is_file() {
                let _ = dotenv::from_path(env_path);
            }
        }
    }
}

/// Initializes tracing: always to stdout; if env `LOG_FILE` is set, also to that file (append,
/// no ANSI colors).
fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::Layer;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,toolflow=debug,toolflow_server=debug")
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter.clone());

    let registry = tracing_subscriber::registry().with(stdout_layer);

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter);
        registry.with(file_layer).init();
        tracing::info!(path = %path, "logging to file");
    } else {
        registry.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    load_dotenv();
    init_tracing()?;

    let config = GatewayConfig::from_env()?;
    let gateway = Gateway::from_config(&config, Arc::new(EchoOrchestrator))?;
    info!(
        tools = gateway.tools().registry().len(),
        default_policy = ?gateway.tools().default_policy(),
        protocols = ?gateway.dispatcher().available(),
        event_buffer = config.event_buffer,
        "gateway config loaded"
    );

    let app = router(Arc::new(AppState::new(gateway)));

    info!("listening on http://{}", config.listen);
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
