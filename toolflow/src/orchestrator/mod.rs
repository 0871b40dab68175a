//! Orchestration collaborator seam.
//!
//! The gateway does not run models or tools itself. An [`Orchestrator`] receives the
//! request input plus the filtered tool set and reports progress as
//! [`LifecycleEvent`]s through an [`EventEmitter`]. The emitter fails with
//! [`OrchestrationError::Cancelled`] once the client side is gone, so implementations
//! stop as soon as an emit fails.

mod mock;

pub use mock::{EchoOrchestrator, ScriptedOrchestrator};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::event::LifecycleEvent;
use crate::tool::ToolDescriptor;

/// Orchestration failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    /// `details` is for logs only.
    #[error("orchestration failed: {message}")]
    Failed {
        message: String,
        details: Option<String>,
    },

    /// The session was closed; nothing more will be delivered.
    #[error("session cancelled")]
    Cancelled,
}

impl OrchestrationError {
    pub fn failed(message: impl Into<String>) -> Self {
        OrchestrationError::Failed {
            message: message.into(),
            details: None,
        }
    }

    pub fn failed_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        OrchestrationError::Failed {
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

/// What one run gets to work with.
#[derive(Clone, Debug, PartialEq)]
pub struct OrchestrationInput {
    pub input: String,
    pub conversation_id: Option<String>,
    /// Filtered tool set for this request.
    pub tools: Vec<ToolDescriptor>,
    /// Opaque request params; `Value::Null` when absent.
    pub params: Value,
}

impl OrchestrationInput {
    pub fn new(input: impl Into<String>, tools: Vec<ToolDescriptor>) -> Self {
        Self {
            input: input.into(),
            conversation_id: None,
            tools,
            params: Value::Null,
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Sending half of a run's event channel.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    tx: mpsc::Sender<LifecycleEvent>,
}

impl EventEmitter {
    pub fn new(tx: mpsc::Sender<LifecycleEvent>) -> Self {
        Self { tx }
    }

    /// Emitter and receiver with the given buffer size.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<LifecycleEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Waits for buffer space, then delivers `event`.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the receiving session is gone.
    pub async fn emit(&self, event: LifecycleEvent) -> Result<(), OrchestrationError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| OrchestrationError::Cancelled)
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs one request.
///
/// Implementations emit zero or more tool call and token events, then exactly one
/// `Final` or `Error`. Returning `Err` without a terminal event makes the gateway emit
/// the `Error` on the implementation's behalf.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn run(
        &self,
        input: OrchestrationInput,
        events: EventEmitter,
    ) -> Result<(), OrchestrationError>;
}
