//! HTTP integration tests for the Textlens REST API
//!
//! Drive the full axum router with `oneshot` against a stub analyzer, so no
//! network or credentials are needed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use textlens_core::{Analysis, AnalyzerError, TextAnalyzer, TextlensConfig};
use textlens_server::http::{build_router, HttpState, WELCOME_MESSAGE};
use tower::ServiceExt;

/// Returns the fox/dog analysis for any text except "upstream-down".
struct StubAnalyzer {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait]
impl TextAnalyzer for StubAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Analysis, AnalyzerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if text == "upstream-down" {
            return Err(AnalyzerError::Api {
                code: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(Analysis {
            summary: "A fox jumps over a dog.".to_string(),
            keywords: vec!["fox".to_string(), "dog".to_string(), "jumps".to_string()],
            sentiment: "neutral".to_string(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

fn make_app(delay: Duration) -> (Router, Arc<StubAnalyzer>) {
    let stub = Arc::new(StubAnalyzer {
        calls: AtomicUsize::new(0),
        delay,
    });
    let state = Arc::new(HttpState::new(stub.clone(), TextlensConfig::default()));
    (build_router(state), stub)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

fn post_raw(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_root_returns_welcome() {
    let (app, _) = make_app(Duration::ZERO);
    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": WELCOME_MESSAGE }));
}

#[tokio::test]
async fn test_history_empty_before_any_process() {
    let (app, _) = make_app(Duration::ZERO);
    let (status, body) = send(&app, get("/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_process_then_history_round_trip() {
    let (app, _) = make_app(Duration::ZERO);
    let text = "The quick brown fox jumps over the lazy dog.";

    let (status, record) = send(&app, post_json("/process", &json!({ "text": text }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        record,
        json!({
            "original_text": text,
            "summary": "A fox jumps over a dog.",
            "keywords": ["fox", "dog", "jumps"],
            "sentiment": "neutral"
        })
    );

    let (status, history) = send(&app, get("/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history, json!([record]));
}

#[tokio::test]
async fn test_original_text_is_echoed_exactly() {
    let (app, _) = make_app(Duration::ZERO);
    let text = "  Leading and trailing spaces, unicode ✓, and\nnewlines  ";

    let (status, record) = send(&app, post_json("/process", &json!({ "text": text }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["original_text"], text);
}

#[tokio::test]
async fn test_history_preserves_call_order() {
    let (app, _) = make_app(Duration::ZERO);
    for i in 0..5 {
        let (status, _) = send(
            &app,
            post_json("/process", &json!({ "text": format!("text number {}", i) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = send(&app, get("/history")).await;
    let texts: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["original_text"].as_str().unwrap())
        .collect();
    assert_eq!(
        texts,
        vec![
            "text number 0",
            "text number 1",
            "text number 2",
            "text number 3",
            "text number 4"
        ]
    );
}

#[tokio::test]
async fn test_invalid_bodies_rejected_without_model_call() {
    let (app, stub) = make_app(Duration::ZERO);

    let cases = vec![
        post_json("/process", &json!({})),
        post_json("/process", &json!({ "text": "" })),
        post_json("/process", &json!({ "text": "   " })),
        post_json("/process", &json!({ "text": 42 })),
        post_raw("/process", "not json".to_string()),
    ];

    for req in cases {
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {:?}", body);
        assert_eq!(body["status"], "error");
        assert!(body["error"].is_string());
    }

    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    let (_, history) = send(&app, get("/history")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn test_upstream_failure_does_not_grow_history() {
    let (app, _) = make_app(Duration::ZERO);

    send(&app, post_json("/process", &json!({ "text": "ok" }))).await;

    let (status, body) = send(
        &app,
        post_json("/process", &json!({ "text": "upstream-down" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("service unavailable"));

    let (_, history) = send(&app, get("/history")).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    // Service keeps working after a failure
    let (status, _) = send(&app, post_json("/process", &json!({ "text": "again" }))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_process_calls_all_recorded() {
    let (app, _) = make_app(Duration::from_millis(20));
    let m = 25;

    let requests = (0..m).map(|i| {
        let app = app.clone();
        async move {
            send(
                &app,
                post_json("/process", &json!({ "text": format!("concurrent {}", i) })),
            )
            .await
        }
    });

    for (status, _) in futures::future::join_all(requests).await {
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = send(&app, get("/history")).await;
    let mut texts: Vec<String> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["original_text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts.len(), m);
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), m, "no record lost or duplicated");
}

#[tokio::test]
async fn test_health_and_version_endpoints() {
    let (app, _) = make_app(Duration::ZERO);
    send(&app, post_json("/process", &json!({ "text": "hello" }))).await;

    let (status, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["records"], 1);

    let (status, version) = send(&app, get("/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(version["service"], "textlens");
    assert!(version["version"].is_string());
}
