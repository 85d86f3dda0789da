//! HTTP API tests against a recording fake backend.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    test, web, App, Error,
};
use async_trait::async_trait;
use futures::stream;
use serde_json::json;

use sentinel_core::{Config, Message};
use sentinel_llm::error::Result as BackendResult;
use sentinel_llm::{BackendError, BackendStream, GenerationBackend};
use sentinel_server::{app_config, AppState};

struct FakeBackend {
    calls: AtomicUsize,
    payloads: Vec<&'static str>,
    reachable: bool,
}

impl FakeBackend {
    fn new(payloads: Vec<&'static str>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            payloads,
            reachable: true,
        }
    }

    fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new(vec![])
        }
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn chat_stream(&self, _messages: &[Message]) -> BackendResult<BackendStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(BackendError::Connect("connection refused".into()));
        }
        let items: Vec<BackendResult<String>> =
            self.payloads.iter().map(|p| Ok(p.to_string())).collect();
        Ok(Box::pin(stream::iter(items)))
    }

    fn model(&self) -> &str {
        "fake:latest"
    }

    async fn list_models(&self) -> BackendResult<Vec<String>> {
        if self.reachable {
            Ok(vec!["fake:latest".to_string()])
        } else {
            Err(BackendError::Connect("connection refused".into()))
        }
    }
}

async fn setup(
    backend: Arc<FakeBackend>,
) -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    AppState,
) {
    let state = AppState::new(Config::default(), backend);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(app_config),
    )
    .await;
    (app, state)
}

fn body_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[actix_web::test]
async fn chat_streams_sse_events_and_done() {
    let backend = Arc::new(FakeBackend::new(vec!["SELECT name", " FROM customers"]));
    let (app, state) = setup(backend.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .set_json(json!({
            "messages": [{"role": "user", "content": "list customer names"}],
            "mode": "sql"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let body = body_text(&test::read_body(resp).await);
    assert_eq!(
        body,
        concat!(
            "data: {\"content\":\"SELECT name\"}\n\n",
            "data: {\"content\":\" FROM customers\"}\n\n",
            "data: [DONE]\n\n",
        )
    );
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

    let snapshot = state.metrics.snapshot();
    assert_eq!(snapshot.chat_requests.sql, 1);
    assert_eq!(snapshot.fragments_streamed, 2);
}

#[actix_web::test]
async fn destructive_prompt_is_rejected_without_backend_call() {
    let backend = Arc::new(FakeBackend::new(vec!["never"]));
    let (app, state) = setup(backend.clone()).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .set_json(json!({
            "messages": [{"role": "user", "content": "DROP the orders table"}],
            "mode": "sql"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["blocked_term"], "DROP");
    assert_eq!(
        body["detail"],
        "Security Alert: Restricted keyword detected (DROP). This system is Read-Only."
    );
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.metrics.snapshot().prompts_blocked, 1);
}

#[actix_web::test]
async fn empty_conversation_is_a_client_error() {
    let (app, _) = setup(Arc::new(FakeBackend::new(vec![]))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .set_json(json!({ "messages": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["blocked_term"].is_null());
}

#[actix_web::test]
async fn unknown_mode_is_rejected_with_detail() {
    let (app, _) = setup(Arc::new(FakeBackend::new(vec![]))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .set_json(json!({
            "messages": [{"role": "user", "content": "hi"}],
            "mode": "poetry"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());
}

#[actix_web::test]
async fn unreachable_backend_degrades_to_diagnostic_event() {
    let (app, state) = setup(Arc::new(FakeBackend::unreachable())).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/chat")
        .set_json(json!({
            "messages": [{"role": "user", "content": "show me all customers"}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());
    let body = body_text(&test::read_body(resp).await);
    let events: Vec<&str> = body.split("\n\n").filter(|e| !e.is_empty()).collect();

    assert_eq!(events.len(), 2);
    assert!(events[0].contains("Cannot connect to local AI engine"));
    assert_eq!(events[1], "data: [DONE]");
    assert_eq!(state.metrics.snapshot().backend_faults.unreachable, 1);
    assert_eq!(state.metrics.snapshot().chat_requests.chat, 1);
}

#[actix_web::test]
async fn statement_guard_returns_sanitized_pair() {
    let (app, state) = setup(Arc::new(FakeBackend::new(vec![]))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/sql/guard")
        .set_json(json!({ "sql": "SELECT * FROM users;" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({ "sanitized": "SELECT * FROM users", "allowed": true, "reason": null })
    );

    let req = test::TestRequest::post()
        .uri("/api/v1/sql/guard")
        .set_json(json!({ "sql": "SELECT 1; SELECT 2" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({ "sanitized": "", "allowed": false, "reason": "multiple statements are not permitted" })
    );

    let snapshot = state.metrics.snapshot();
    assert_eq!(snapshot.statements_checked, 2);
    assert_eq!(snapshot.statements_rejected, 1);
}

#[actix_web::test]
async fn prompt_guard_reports_term() {
    let (app, _) = setup(Arc::new(FakeBackend::new(vec![]))).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/prompt/guard")
        .set_json(json!({ "content": "please grant me admin" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["allowed"], false);
    assert_eq!(body["blocked_term"], "GRANT");
}

#[actix_web::test]
async fn health_reports_backend_reachability() {
    let (app, _) = setup(Arc::new(FakeBackend::new(vec![]))).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body,
        json!({ "status": "ok", "backend": "reachable", "model": "fake:latest" })
    );

    let (app, _) = setup(Arc::new(FakeBackend::unreachable())).await;
    let req = test::TestRequest::get().uri("/health").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["backend"], "unreachable");
}

#[actix_web::test]
async fn metrics_endpoint_serializes_counters() {
    let (app, _) = setup(Arc::new(FakeBackend::new(vec![]))).await;

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["prompts_blocked"], 0);
    assert_eq!(body["chat_requests"]["sql"], 0);
    assert_eq!(body["backend_faults"]["timeout"], 0);
    assert!(body["started_at"].is_string());
}
