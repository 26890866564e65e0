#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use step2hub_api::{
    config::Config,
    create_router,
    services::AppState,
    store::{AttemptStore, SqliteAttemptStore},
};
use tower::ServiceExt;

pub const IBS_STEM: &str = "A 28-year-old woman has 8 months of intermittent crampy lower \
    abdominal pain. The pain improves after defecation. She has no weight loss.";
pub const IBS_EXPLANATION: &str = "Symptoms meet Rome IV criteria for IBS. No further testing \
    necessary; reassurance and dietary changes are first-line.";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Router over a fresh in-memory SQLite store.
pub async fn create_test_app() -> Router {
    let store = SqliteAttemptStore::open_in_memory().expect("Failed to open in-memory store");
    create_test_app_with_store(Arc::new(store))
}

pub fn create_test_app_with_store(store: Arc<dyn AttemptStore>) -> Router {
    init_tracing();
    create_router(Arc::new(AppState::with_store(Config::default(), store)))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    send(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
}

pub async fn body_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Logs a user-pasted attempt and returns the stored record.
pub async fn log_attempt(app: &Router, body: Value) -> Value {
    let response = post_json(app, "/api/v1/attempts", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

pub fn ibs_attempt(your_answer: &str) -> Value {
    json!({
        "question_bank": "UWorld",
        "exam": "Block 1",
        "question_number": "12",
        "raw_question": IBS_STEM,
        "choices": "A. Colonoscopy\nB. CT abdomen\nC. Stool studies\nD. Reassurance",
        "your_answer": your_answer,
        "correct_answer": "D",
        "confidence": 4,
        "explanation": IBS_EXPLANATION
    })
}
