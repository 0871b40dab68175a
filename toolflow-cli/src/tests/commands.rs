//! Unit tests for the command functions, against a gateway built from default config.
//!
//! Scenarios: tool listing, filter preview, run over each protocol, error reporting.

use std::sync::Arc;

use serde_json::Value;
use toolflow::{EchoOrchestrator, Gateway, GatewayConfig};

use crate::{analyze, list_tools, run_request, Error, RequestOptions};

fn gateway() -> Arc<Gateway> {
    Arc::new(Gateway::from_config(&GatewayConfig::default(), Arc::new(EchoOrchestrator)).unwrap())
}

fn tagged(tag: &str) -> RequestOptions {
    RequestOptions {
        strategy: None,
        tags: vec![tag.to_string()],
    }
}

/// **Scenario**: tools lists every registered descriptor.
///
/// Given: the demo tool set  
/// When: list_tools is called  
/// Then: three lines, first one for weather
#[test]
fn list_tools_prints_each_tool() {
    let lines = list_tools(&gateway());
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("weather [5] data,forecast,weather"), "{}", lines[0]);
}

/// **Scenario**: analyze shows the policy and the tools it keeps.
///
/// Given: --tag math  
/// When: analyze is called  
/// Then: the calculator is the only tool listed
#[test]
fn analyze_prints_policy_and_tools() {
    let lines = analyze(&gateway(), &tagged("math")).unwrap();
    assert!(lines[0].starts_with("policy: composite[tag_match[any](math)"), "{}", lines[0]);
    assert!(lines[0].ends_with("(1 of 3 tools)"), "{}", lines[0]);
    assert_eq!(lines[1], "  calculator");
}

/// **Scenario**: an unknown strategy reports UNKNOWN_POLICY.
#[test]
fn analyze_reports_unknown_strategy() {
    let options = RequestOptions {
        strategy: Some("nope".to_string()),
        tags: vec![],
    };
    match analyze(&gateway(), &options) {
        Err(Error::Gateway { code, .. }) => assert_eq!(code, "UNKNOWN_POLICY"),
        other => panic!("expected gateway error, got {:?}", other),
    }
}

/// **Scenario**: run over http prints one success envelope.
///
/// Given: input "hi there" and --tag weather  
/// When: run_request is called with protocol http  
/// Then: one JSON envelope whose response echoes the input
#[tokio::test]
async fn run_http_prints_envelope() {
    let lines = run_request(&gateway(), &tagged("weather"), "http", "hi there")
        .await
        .unwrap();
    assert_eq!(lines.len(), 1);
    let v: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(v["status"], "success");
    assert_eq!(v["data"]["response"], "hi there");
    assert_eq!(v["data"]["tool_calls"][0]["result"], serde_json::json!(["weather"]));
}

/// **Scenario**: run over sse prints one data line per event.
#[tokio::test]
async fn run_sse_prints_frames() {
    let lines = run_request(&gateway(), &RequestOptions::default(), "sse", "a b")
        .await
        .unwrap();
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|l| l.starts_with("data: ")));
}

/// **Scenario**: run over websocket prints JSON frames ending with final.
#[tokio::test]
async fn run_websocket_prints_frames() {
    let lines = run_request(&gateway(), &RequestOptions::default(), "websocket", "a")
        .await
        .unwrap();
    assert_eq!(lines.len(), 4);
    let last: Value = serde_json::from_str(lines.last().unwrap()).unwrap();
    assert_eq!(last["type"], "final");
}

/// **Scenario**: an unknown protocol is an UNSUPPORTED_PROTOCOL error.
#[tokio::test]
async fn run_rejects_unknown_protocol() {
    let err = run_request(&gateway(), &RequestOptions::default(), "grpc", "a")
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("UNSUPPORTED_PROTOCOL"), "{}", err);
}
