//! Integration test: request body → gateway → SSE frames, without a real HTTP listener.
//!
//! **Scenario**: a JSON body with `protocol: "sse"` and a tag filter is parsed, prepared and
//! streamed through the echo orchestrator; the frames carry the filtered tool list, one token
//! per word and the final response.

use std::sync::Arc;

use serde_json::Value;
use toolflow::{AgentRequest, EchoOrchestrator, Gateway, GatewayConfig};

#[tokio::test]
async fn sse_flow_produces_data_frames() {
    let body = r#"{"query":"hello sse world","protocol":"sse","tool_tags":["weather"]}"#;
    let request: AgentRequest = serde_json::from_str(body).expect("parse");

    let gateway = Arc::new(
        Gateway::from_config(&GatewayConfig::default(), Arc::new(EchoOrchestrator))
            .expect("gateway"),
    );
    let run = gateway.prepare(&request).expect("prepare");
    let mut rx = gateway.stream_sse(run);

    let mut events = Vec::new();
    while let Some(frame) = rx.recv().await {
        assert!(frame.starts_with("data: "), "frame: {}", frame);
        assert!(frame.ends_with("\n\n"), "frame: {}", frame);
        let v: Value = serde_json::from_str(frame.trim_start_matches("data: ").trim_end())
            .expect("json frame");
        events.push(v);
    }

    assert_eq!(events.len(), 2 + 3 + 1);
    assert_eq!(events[1]["result"], serde_json::json!(["weather"]));
    assert_eq!(events[2], serde_json::json!({ "type": "token", "text": "hello " }));
    assert_eq!(
        events.last().unwrap(),
        &serde_json::json!({ "type": "final", "response": "hello sse world" })
    );
}
