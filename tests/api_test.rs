//! HTTP surface tests driving the router in-process

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use tower::ServiceExt;
use uniqa::api::build_app;
use uniqa::api::AppState;
use uniqa::database::ContextSource;
use uniqa::embeddings::Embedder;
use uniqa::llm::GenerationParams;
use uniqa::llm::TextGenerator;
use uniqa::models::ContextRecord;
use uniqa::models::Embedding;
use uniqa::rag::pipeline::DEGRADED_ANSWER;
use uniqa::rag::PipelineSettings;
use uniqa::rag::QaService;
use uniqa::QaError;
use uniqa::Result;

struct AxisEmbedder;

#[async_trait]
impl Embedder for AxisEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding> {
        Ok(vec![1.0, 0.0])
    }
}

struct HostelStore;

#[async_trait]
impl ContextSource for HostelStore {
    async fn fetch_all(&self) -> Result<Vec<ContextRecord>> {
        Ok(vec![ContextRecord::new("Hostels: Rose, Lily", vec![1.0, 0.0])])
    }
}

struct DownStore;

#[async_trait]
impl ContextSource for DownStore {
    async fn fetch_all(&self) -> Result<Vec<ContextRecord>> {
        Err(QaError::StoreUnavailable("connection refused".to_string()))
    }
}

struct FixedGenerator;

#[async_trait]
impl TextGenerator for FixedGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        Ok("Hostels: Rose and Lily are reserved for girls.".to_string())
    }
}

fn app_with(store: Arc<dyn ContextSource>) -> Router {
    let service = QaService::new(
        Arc::new(AxisEmbedder),
        store,
        Arc::new(FixedGenerator),
        PipelineSettings {
            threshold: 0.5,
            min_answer_chars: 5,
            params: GenerationParams::default(),
        },
    );
    build_app(
        AppState {
            service: Arc::new(service),
        },
        Duration::from_secs(5),
        false,
    )
}

fn post_ask(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_ask_returns_answer() {
    let (status, body) = send(
        app_with(Arc::new(HostelStore)),
        post_ask(r#"{"question": "What hostels are available for girls?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"answer": "Hostels: Rose and Lily are reserved for girls."})
    );
}

#[tokio::test]
async fn test_ask_rejects_missing_or_blank_question() {
    for payload in [
        r#"{}"#,
        r#"{"question": ""}"#,
        r#"{"question": "   "}"#,
        r#"{"question": 42}"#,
    ] {
        let (status, body) = send(app_with(Arc::new(HostelStore)), post_ask(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(body["error"], "Question must be a non-empty string");
    }
}

#[tokio::test]
async fn test_ask_rejects_malformed_json() {
    let (status, body) = send(app_with(Arc::new(HostelStore)), post_ask("{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_ask_store_failure_is_500() {
    let (status, body) = send(
        app_with(Arc::new(DownStore)),
        post_ask(r#"{"question": "When does the library open?"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], DEGRADED_ANSWER);
}

#[tokio::test]
async fn test_ask_wrong_method_is_405() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/ask")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app_with(Arc::new(HostelStore)), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"], "Method not allowed");
}

#[tokio::test]
async fn test_health() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app_with(Arc::new(HostelStore)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
