//! Wire-level tests for the completion gateway adapter.
//!
//! Each test serves a canned upstream reply from a local listener and then
//! drives `complete()` against it, pinning down which statuses map to which
//! `GatewayError` kinds and when the fixed fallback reply stands in for a
//! missing completion. No external network is involved.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use api_lib::adapters::completion_llm::{CompletionGatewayAdapter, EMPTY_COMPLETION_FALLBACK};
use solace_core::{CompletionService, GatewayError, Turn};

//=========================================================================================
// Stub Upstream and Helpers
//=========================================================================================

/// Serves the given status and body for every completion request.
async fn spawn_upstream(status: StatusCode, body: &'static str) -> SocketAddr {
    let app = Router::new().route(
        "/chat/completions",
        post(move || async move { (status, body) }),
    );
    serve(app).await
}

type SeenRequest = Arc<Mutex<Option<(Option<String>, serde_json::Value)>>>;

/// Serves a fixed completion and records the Authorization header and JSON
/// body of the request it received.
async fn spawn_recording_upstream(reply_text: &'static str) -> (SocketAddr, SeenRequest) {
    let seen: SeenRequest = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let app = Router::new().route(
        "/chat/completions",
        post(
            move |headers: HeaderMap, Json(request): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|v| v.to_str().ok())
                        .map(|v| v.to_string());
                    *sink.lock().unwrap() = Some((auth, request));
                    Json(json!({
                        "choices": [{ "message": { "content": reply_text } }]
                    }))
                }
            },
        ),
    );
    let addr = serve(app).await;
    (addr, seen)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub upstream");
    });
    addr
}

async fn complete_against(addr: SocketAddr) -> Result<String, GatewayError> {
    let adapter = CompletionGatewayAdapter::new(
        &format!("http://{}", addr),
        "test-key".to_string(),
        "test-model".to_string(),
        Duration::from_secs(2),
    )
    .expect("build adapter");
    adapter
        .complete(
            "You are a caring companion.",
            &[Turn::user("Long day today")],
        )
        .await
}

//=========================================================================================
// Request Shape
//=========================================================================================

#[tokio::test]
async fn the_request_carries_the_tuning_and_the_system_turn_first() {
    let (addr, seen) = spawn_recording_upstream("You deserve rest after a day like that.").await;

    let reply = complete_against(addr).await.expect("completion succeeds");
    assert_eq!(reply, "You deserve rest after a day like that.");

    let (auth, request) = seen.lock().unwrap().clone().expect("upstream saw a request");
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(request["model"], "test-model");
    assert_eq!(request["max_tokens"], 1024);
    let temperature = request["temperature"].as_f64().unwrap();
    assert!((temperature - 0.7).abs() < 1e-6);
    assert_eq!(request["messages"][0]["role"], "system");
    assert_eq!(request["messages"][0]["content"], "You are a caring companion.");
    assert_eq!(request["messages"][1]["role"], "user");
    assert_eq!(request["messages"][1]["content"], "Long day today");
}

//=========================================================================================
// Failure Status Mapping
//=========================================================================================

#[tokio::test]
async fn rate_limited_upstreams_surface_as_throttled() {
    let addr = spawn_upstream(StatusCode::TOO_MANY_REQUESTS, r#"{"error":"slow down"}"#).await;

    let result = complete_against(addr).await;
    assert!(matches!(result, Err(GatewayError::Throttled)));
}

#[tokio::test]
async fn quota_failures_surface_as_unavailable() {
    let addr = spawn_upstream(StatusCode::PAYMENT_REQUIRED, r#"{"error":"quota exhausted"}"#).await;

    let result = complete_against(addr).await;
    assert!(matches!(result, Err(GatewayError::Unavailable)));
}

#[tokio::test]
async fn other_statuses_carry_the_upstream_detail() {
    let addr = spawn_upstream(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").await;

    match complete_against(addr).await {
        Err(GatewayError::Upstream(detail)) => {
            assert!(detail.contains("500"));
            assert!(detail.contains("upstream exploded"));
        }
        other => panic!("expected an upstream failure, got {:?}", other),
    }
}

#[tokio::test]
async fn transport_failures_surface_as_upstream() {
    // Bind and immediately drop the listener so the port refuses connections.
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    match complete_against(addr).await {
        Err(GatewayError::Upstream(_)) => {}
        other => panic!("expected an upstream failure, got {:?}", other),
    }
}

//=========================================================================================
// Fallback and Decode Failures
//=========================================================================================

#[tokio::test]
async fn choices_without_usable_text_fall_back_to_the_fixed_reply() {
    for body in [
        r#"{"choices":[]}"#,
        r#"{"choices":[{"message":{"content":null}}]}"#,
        r#"{"choices":[{"message":{"content":""}}]}"#,
    ] {
        let addr = spawn_upstream(StatusCode::OK, body).await;

        let reply = complete_against(addr).await.expect("fallback is a success");
        assert_eq!(reply, EMPTY_COMPLETION_FALLBACK);
    }
}

#[tokio::test]
async fn an_undecodable_success_body_is_an_upstream_failure() {
    let addr = spawn_upstream(StatusCode::OK, "not json at all").await;

    match complete_against(addr).await {
        Err(GatewayError::Upstream(detail)) => {
            assert!(detail.contains("undecodable completion body"));
        }
        other => panic!("expected an upstream failure, got {:?}", other),
    }
}
