//! Request pipeline: validate, filter tools, run the orchestrator, render through an adapter.
//!
//! Everything that can be rejected (empty input, unknown protocol, incompatible mode,
//! unknown policy) is rejected in [`Gateway::prepare`], before any session opens. Once a
//! session is open, failures are rendered as an `Error` event.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::config::{load_tool_catalog, GatewayConfig, DEFAULT_EVENT_BUFFER};
use crate::error::GatewayError;
use crate::event::{Admission, EventSequencer, LifecycleEvent};
use crate::filter::{FilterPolicy, FilteredRegistry, PolicyCatalog, PolicyRef, ProtocolFilter};
use crate::logging;
use crate::orchestrator::{EventEmitter, OrchestrationError, OrchestrationInput, Orchestrator};
use crate::protocol::{
    DispatchError, DuplexAdapter, ProtocolAdapter, ProtocolDispatcher, ProtocolKind, SseAdapter,
    Transport,
};
use crate::tool::{demo_tools, ToolDescriptor, ToolRegistry};
use crate::wire::{AgentRequest, AgentResponse};

/// A validated request, ready to run.
#[derive(Clone, Debug)]
pub struct PreparedRun {
    pub protocol: ProtocolKind,
    /// Label of the effective filter policy.
    pub policy: String,
    pub input: OrchestrationInput,
}

/// How a driven session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// `Final` rendered.
    Completed,
    /// `Error` rendered, from the orchestrator or synthesized.
    Failed,
    /// The client went away; remaining events were discarded.
    Cancelled,
}

/// Filter preview: which tools a request would get, without running anything.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub policy: String,
    pub total_tools: usize,
    pub tools: Vec<ToolDescriptor>,
}

/// Shared request pipeline. Build once, share by `Arc`.
pub struct Gateway {
    tools: FilteredRegistry,
    dispatcher: ProtocolDispatcher,
    orchestrator: Arc<dyn Orchestrator>,
    event_buffer: usize,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("tools", &self.tools)
            .field("dispatcher", &self.dispatcher)
            .field("event_buffer", &self.event_buffer)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(
        tools: FilteredRegistry,
        dispatcher: ProtocolDispatcher,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Self {
        Self {
            tools,
            dispatcher,
            orchestrator,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    /// Builds registry, catalog and dispatcher from `config`.
    ///
    /// Registers the tool catalog file, or the demo tools when none is configured; loads
    /// extra policies; validates the default policy and protocol filter names.
    pub fn from_config(
        config: &GatewayConfig,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Result<Self, GatewayError> {
        let descriptors = match &config.tool_catalog_path {
            Some(path) => load_tool_catalog(path)?,
            None => demo_tools(),
        };
        let registry = Arc::new(ToolRegistry::with_tools(descriptors)?);

        let catalog = Arc::new(PolicyCatalog::with_defaults());
        if let Some(path) = &config.policy_catalog_path {
            catalog.load_json(path)?;
        }

        let mut tools = FilteredRegistry::new(registry, catalog);
        if let Some(name) = &config.default_filter_strategy {
            tools = tools.with_default_policy(name.clone())?;
        }

        let mut dispatcher = ProtocolDispatcher::with_enabled(config.enabled_protocols.iter().copied());
        if let Some(name) = &config.protocol_filter {
            dispatcher = dispatcher.with_filter(ProtocolFilter::named(name)?);
        }

        Ok(Self::new(tools, dispatcher, orchestrator).with_event_buffer(config.event_buffer))
    }

    pub fn tools(&self) -> &FilteredRegistry {
        &self.tools
    }

    pub fn dispatcher(&self) -> &ProtocolDispatcher {
        &self.dispatcher
    }

    fn effective_policy(&self, request: &AgentRequest) -> Result<FilterPolicy, GatewayError> {
        Ok(self
            .tools
            .request_policy(request.filter_strategy.as_deref(), &request.tool_tags)?)
    }

    /// Validates `request` and resolves its protocol and tool set.
    pub fn prepare(&self, request: &AgentRequest) -> Result<PreparedRun, GatewayError> {
        let input = request.input.trim();
        if input.is_empty() {
            return Err(GatewayError::InvalidRequest("input must not be empty".to_string()));
        }
        let protocol = self
            .dispatcher
            .check(&request.protocol, request.mode.as_deref())?;
        let policy = self.effective_policy(request)?;
        let label = policy.to_string();
        let tools = self.tools.resolve(&PolicyRef::Policy(policy))?;

        Ok(PreparedRun {
            protocol,
            policy: label,
            input: OrchestrationInput {
                input: input.to_string(),
                conversation_id: request.conversation_id.clone(),
                tools,
                params: request.params.clone().unwrap_or(Value::Null),
            },
        })
    }

    /// Tool set `request` would get; protocol fields are ignored.
    pub fn analyze(&self, request: &AgentRequest) -> Result<Analysis, GatewayError> {
        let policy = self.effective_policy(request)?;
        let label = policy.to_string();
        let tools = self.tools.resolve(&PolicyRef::Policy(policy))?;
        Ok(Analysis {
            policy: label,
            total_tools: self.tools.registry().len(),
            tools,
        })
    }

    /// Runs the orchestrator on its own task and renders its events into `adapter`.
    ///
    /// Events go through an [`EventSequencer`]; anything after the terminal event is
    /// dropped. If the orchestrator fails or stops without a terminal event, an `Error`
    /// event is rendered in its place. On disconnect the event channel is closed, so the
    /// orchestrator's next emit fails with `Cancelled`. Dropping the returned future aborts
    /// the orchestrator task.
    pub async fn drive(&self, run: PreparedRun, adapter: &mut dyn ProtocolAdapter) -> SessionOutcome {
        let (emitter, mut rx) = EventEmitter::channel(self.event_buffer);
        let orchestrator = Arc::clone(&self.orchestrator);
        let mut producer = tokio::spawn(async move { orchestrator.run(run.input, emitter).await });
        let _abort = AbortOnDrop(producer.abort_handle());

        let mut sequencer = EventSequencer::new();
        while let Some(event) = rx.recv().await {
            if sequencer.admit(&event) == Admission::Drop {
                continue;
            }
            let outcome = outcome_of(&event);
            if let Err(err) = render(adapter, event).await {
                logging::log_render_stopped(&err.to_string());
                drop(rx);
                producer.abort();
                return SessionOutcome::Cancelled;
            }
            if let Some(outcome) = outcome {
                return outcome;
            }
        }

        // Channel closed without a terminal event: the producer has returned.
        let event = match (&mut producer).await {
            Ok(Ok(())) => LifecycleEvent::error("orchestration ended without a final response"),
            Ok(Err(OrchestrationError::Failed { message, details })) => LifecycleEvent::Error {
                message,
                details,
            },
            Ok(Err(OrchestrationError::Cancelled)) => LifecycleEvent::error("orchestration cancelled"),
            Err(join) => LifecycleEvent::error_with_details("orchestration task failed", join.to_string()),
        };
        match render(adapter, event).await {
            Ok(()) => SessionOutcome::Failed,
            Err(_) => SessionOutcome::Cancelled,
        }
    }

    /// Sync request/response: prepare, drive, return the envelope. Errors before the
    /// session opens come back as the error envelope too.
    pub async fn respond(&self, request: &AgentRequest) -> AgentResponse {
        match self.prepare(request) {
            Ok(run) => self.respond_prepared(run).await,
            Err(err) => AgentResponse::from_error(&err),
        }
    }

    /// Drives `run` through a [`ResponseAdapter`](crate::protocol::ResponseAdapter).
    pub async fn respond_prepared(&self, run: PreparedRun) -> AgentResponse {
        let (tx, rx) = oneshot::channel();
        let mut adapter = match self
            .dispatcher
            .open_session(ProtocolKind::Http, Transport::Response(tx))
        {
            Ok(adapter) => adapter,
            Err(err) => return AgentResponse::from_error(&GatewayError::from(err)),
        };
        self.drive(run, adapter.as_mut()).await;
        match rx.await {
            Ok(response) => response,
            Err(_) => AgentResponse::from_error(&GatewayError::Orchestration(
                OrchestrationError::Cancelled,
            )),
        }
    }

    /// Starts an SSE session for `run` and returns the receiver of `data:` frames.
    /// The stream ends after the terminal frame.
    pub fn stream_sse(self: &Arc<Self>, run: PreparedRun) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.event_buffer);
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            let mut adapter = SseAdapter::new(tx);
            gateway.drive(run, &mut adapter).await;
        });
        rx
    }

    /// Handles the request message of a duplex session and drives it.
    ///
    /// A malformed message is returned as an error and the session stays idle. Once the
    /// request is accepted, preparation failures are rendered as an `Error` event. The
    /// request always dispatches as websocket, so availability is checked for that kind.
    pub async fn serve_duplex(
        &self,
        adapter: &mut DuplexAdapter,
        message: &str,
    ) -> Result<SessionOutcome, GatewayError> {
        let mut request = adapter.accept_request(message)?;
        let prepared = duplex_protocol(&request.protocol).and_then(|protocol| {
            request.protocol = protocol.to_string();
            self.prepare(&request)
        });
        match prepared {
            Ok(run) => Ok(self.drive(run, adapter).await),
            Err(err) => {
                let event = LifecycleEvent::error(format!("{}: {}", err.code(), err));
                Ok(match adapter.render(event).await {
                    Ok(()) => SessionOutcome::Failed,
                    Err(_) => SessionOutcome::Cancelled,
                })
            }
        }
    }
}

struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Protocol a duplex request runs under. The wire default (`http`) and an empty value
/// mean websocket; any other declared protocol does not fit a duplex transport.
fn duplex_protocol(declared: &str) -> Result<ProtocolKind, GatewayError> {
    let declared = declared.trim();
    if declared.is_empty() || declared.eq_ignore_ascii_case("http") {
        return Ok(ProtocolKind::WebSocket);
    }
    match declared.parse::<ProtocolKind>()? {
        ProtocolKind::WebSocket => Ok(ProtocolKind::WebSocket),
        protocol => Err(DispatchError::TransportMismatch {
            protocol,
            transport: "duplex",
        }
        .into()),
    }
}

fn outcome_of(event: &LifecycleEvent) -> Option<SessionOutcome> {
    match event {
        LifecycleEvent::Final { .. } => Some(SessionOutcome::Completed),
        LifecycleEvent::Error { .. } => Some(SessionOutcome::Failed),
        _ => None,
    }
}

async fn render(
    adapter: &mut dyn ProtocolAdapter,
    event: LifecycleEvent,
) -> Result<(), crate::protocol::SessionError> {
    if let LifecycleEvent::Error { message, details } = &event {
        logging::log_orchestration_error(message, details.as_deref());
    }
    adapter.render(event).await
}
