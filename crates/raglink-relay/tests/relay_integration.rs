//! Integration tests for the relay: stream forwarding, fail-closed error
//! handling, and the fetch-and-forward routes, against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use raglink_relay::{RelayConfig, RelayServer};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_BODY: &str = "event: content\ndata: {\"content\":\"a\"}\n\n\
                        event: content\ndata: {\"content\":\"b\"}\n\n\
                        event: complete\ndata: {\"query\":\"q\",\"response\":\"ab\"}\n\n";

/// Helper: start the relay on a random port in front of the given backend.
async fn start_relay(backend_url: &str) -> String {
    let app = RelayServer::build(RelayConfig::new(backend_url));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Small yield to let the server task start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    addr
}

#[tokio::test]
async fn test_local_health_endpoint() {
    let addr = start_relay("http://127.0.0.1:1").await;
    let resp = reqwest::get(&format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "raglink");
}

#[tokio::test]
async fn test_stream_forwards_body_and_headers() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/stream"))
        .and(body_partial_json(
            serde_json::json!({"query": "q", "dataset": "d"}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(SSE_BODY.as_bytes(), "text/event-stream"),
        )
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/agent/stream"))
        .json(&serde_json::json!({"query": "q", "dataset": "d"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let headers = resp.headers();
    assert_eq!(headers["content-type"], "text/event-stream");
    assert_eq!(headers["cache-control"], "no-cache");
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST");

    // Byte-for-byte forward of the upstream body.
    let body = resp.text().await.unwrap();
    assert_eq!(body, SSE_BODY);
}

#[tokio::test]
async fn test_stream_fails_closed_on_upstream_error_status() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/stream"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/agent/stream"))
        .json(&serde_json::json!({"query": "q", "dataset": "d"}))
        .send()
        .await
        .unwrap();

    // A single JSON error, not an SSE stream, and no forwarded body bytes.
    assert_eq!(resp.status(), 500);
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("application/json"));
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_stream_fails_closed_when_upstream_unreachable() {
    // Non-routable backend: the connection itself fails.
    let addr = start_relay("http://127.0.0.1:1").await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/agent/stream"))
        .json(&serde_json::json!({"query": "q", "dataset": "d"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_forward_query_round_trip() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(
            serde_json::json!({"query": "q", "dataset": "machine_learning"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": {"query": "q", "response": "answer"}
        })))
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/query"))
        .json(&serde_json::json!({"query": "q", "dataset": "machine_learning"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["response"], "answer");
}

#[tokio::test]
async fn test_cross_route_maps_to_cross_query_path() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cross-query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "data": [{"dataset": "a", "response": "one"}]
        })))
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/cross"))
        .json(&serde_json::json!({"query": "q", "datasets": ["a"]}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["success"].as_bool().unwrap());
}

#[tokio::test]
async fn test_forward_status_get() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ready"})),
        )
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let resp = reqwest::get(&format!("http://{addr}/api/status"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_forward_failure_envelope() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/retrieve"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/api/retrieve"))
        .json(&serde_json::json!({"query": "q", "dataset": "d"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("retrieve"));
}

#[tokio::test]
async fn test_full_pipeline_relay_to_consumer() {
    // Backend SSE → relay → BackendClient stream consumer.
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(SSE_BODY.as_bytes(), "text/event-stream"),
        )
        .mount(&backend)
        .await;

    let addr = start_relay(&backend.uri()).await;
    let client = raglink_client::BackendClient::new(format!("http://{addr}"));
    let (mut rx, handle) = client.agent_stream("q", "d").await.unwrap();

    while rx.recv().await.is_some() {}
    let outcome = handle.await.unwrap();

    assert_eq!(outcome.message.content, "ab");
    assert!(outcome.is_complete());
    assert_eq!(outcome.terminal.unwrap().response, "ab");
}
