//! Built-in orchestrators for tests, demos and the CLI.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{EventEmitter, OrchestrationError, OrchestrationInput, Orchestrator};
use crate::event::LifecycleEvent;

/// Replays a fixed event list, optionally pausing between events and failing at the end.
///
/// Records the last input it ran with so tests can assert on the filtered tool set.
#[derive(Debug, Default)]
pub struct ScriptedOrchestrator {
    events: Vec<LifecycleEvent>,
    failure: Option<OrchestrationError>,
    delay: Option<Duration>,
    last_input: Mutex<Option<OrchestrationInput>>,
}

impl ScriptedOrchestrator {
    pub fn new(events: Vec<LifecycleEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Replays `events`, then returns `error` instead of finishing normally.
    pub fn failing(events: Vec<LifecycleEvent>, error: OrchestrationError) -> Self {
        Self {
            events,
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn last_input(&self) -> Option<OrchestrationInput> {
        self.last_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Orchestrator for ScriptedOrchestrator {
    async fn run(
        &self,
        input: OrchestrationInput,
        events: EventEmitter,
    ) -> Result<(), OrchestrationError> {
        *self
            .last_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(input);
        for event in &self.events {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            events.emit(event.clone()).await?;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Echoes the input back.
///
/// Emits a `list_tools` pseudo tool call reporting the names of the tools it was given,
/// one token per word, then `Final` with the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoOrchestrator;

#[async_trait]
impl Orchestrator for EchoOrchestrator {
    async fn run(
        &self,
        input: OrchestrationInput,
        events: EventEmitter,
    ) -> Result<(), OrchestrationError> {
        let names = input.tool_names();
        events
            .emit(LifecycleEvent::tool_call_start("0", "list_tools", json!({})))
            .await?;
        events
            .emit(LifecycleEvent::tool_call_result("0", json!(names)))
            .await?;
        let words: Vec<&str> = input.input.split_whitespace().collect();
        for (i, word) in words.iter().enumerate() {
            let text = if i + 1 < words.len() {
                format!("{} ", word)
            } else {
                (*word).to_string()
            };
            events.emit(LifecycleEvent::token(text)).await?;
        }
        events
            .emit(LifecycleEvent::final_response(input.input.clone()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolDescriptor;

    async fn collect(orch: &dyn Orchestrator, input: OrchestrationInput) -> Vec<LifecycleEvent> {
        let (emitter, mut rx) = EventEmitter::channel(32);
        orch.run(input, emitter).await.unwrap();
        let mut out = Vec::new();
        while let Some(e) = rx.recv().await {
            out.push(e);
        }
        out
    }

    /// **Scenario**: echo reports its tools, streams tokens and finishes with the input.
    #[tokio::test]
    async fn echo_streams_words() {
        let input = OrchestrationInput::new("hello there", vec![ToolDescriptor::new("a", "")]);
        let events = collect(&EchoOrchestrator, input).await;
        assert_eq!(events.len(), 5);
        assert_eq!(events[1], LifecycleEvent::tool_call_result("0", json!(["a"])));
        assert_eq!(events[2], LifecycleEvent::token("hello "));
        assert_eq!(events[3], LifecycleEvent::token("there"));
        assert_eq!(events[4], LifecycleEvent::final_response("hello there"));
    }

    #[tokio::test]
    async fn scripted_records_input() {
        let orch = ScriptedOrchestrator::new(vec![LifecycleEvent::final_response("ok")]);
        let events = collect(&orch, OrchestrationInput::new("q", vec![])).await;
        assert_eq!(events, vec![LifecycleEvent::final_response("ok")]);
        assert_eq!(orch.last_input().unwrap().input, "q");
    }
}
