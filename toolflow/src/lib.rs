//! # toolflow
//!
//! A tool-filtering, multi-protocol agent gateway. Requests name a filter strategy (or tool
//! tags); the gateway narrows the registered tool set, hands it to an orchestration
//! collaborator, and renders the collaborator's lifecycle events over HTTP, SSE or
//! WebSocket.
//!
//! ## Main Modules
//!
//! - [`tool`]: `ToolDescriptor`, `ToolRegistry`.
//! - [`filter`]: `FilterPolicy`, `PolicyCatalog`, `FilteredRegistry`, `ProtocolFilter`.
//! - [`event`]: `LifecycleEvent` (also the streaming wire message), `EventSequencer`.
//! - [`orchestrator`]: `Orchestrator` trait, `EventEmitter`, `ScriptedOrchestrator`, `EchoOrchestrator`.
//! - [`protocol`]: `ProtocolAdapter` and its three adapters, `ProtocolDispatcher`.
//! - [`gateway`]: `Gateway` request pipeline.
//! - [`wire`]: `AgentRequest` / `AgentResponse`.
//! - [`config`]: `GatewayConfig::from_env`.
//!
//! ## Features
//!
//! - `tracing` (default): log through `tracing`; without it, log lines go to stderr.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use toolflow::{AgentRequest, EchoOrchestrator, Gateway, GatewayConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), toolflow::GatewayError> {
//! let gateway = Gateway::from_config(&GatewayConfig::default(), Arc::new(EchoOrchestrator))?;
//! let response = gateway
//!     .respond(&AgentRequest::new("hello").with_tool_tags(["math"]))
//!     .await;
//! println!("{}", serde_json::to_string(&response).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod gateway;
pub mod logging;
pub mod orchestrator;
pub mod protocol;
pub mod tool;
pub mod wire;

pub use config::{ConfigError, GatewayConfig};
pub use error::GatewayError;
pub use event::{CallId, EventSequencer, LifecycleEvent};
pub use filter::{
    FilterPolicy, FilteredRegistry, MatchMode, PolicyCatalog, PolicyError, PolicyRef,
    PolicySpec, ProtocolFilter,
};
pub use gateway::{Analysis, Gateway, PreparedRun, SessionOutcome};
pub use orchestrator::{
    EchoOrchestrator, EventEmitter, OrchestrationError, OrchestrationInput, Orchestrator,
    ScriptedOrchestrator,
};
pub use protocol::{
    DispatchError, DuplexAdapter, ProtocolAdapter, ProtocolDispatcher, ProtocolKind,
    ResponseAdapter, ResponseMode, SessionError, SessionState, SseAdapter, Transport,
};
pub use tool::{ToolDescriptor, ToolRegistry};
pub use wire::{AgentRequest, AgentResponse};
