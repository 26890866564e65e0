use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::metrics;
use crate::services::AppState;

pub mod attempts;
pub mod classify;
pub mod error;
pub mod practice;
pub mod stats;

pub use error::ApiError;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut store_health = serde_json::Map::new();
    store_health.insert("backend".to_string(), json!(state.store.backend()));

    let healthy = match tokio::time::timeout(
        std::time::Duration::from_secs(1),
        state.store.ping(),
    )
    .await
    {
        Ok(Ok(())) => {
            store_health.insert("status".to_string(), json!("healthy"));
            true
        }
        Ok(Err(e)) => {
            store_health.insert("status".to_string(), json!("unhealthy"));
            store_health.insert("error".to_string(), json!(format!("Store error: {}", e)));
            false
        }
        Err(_) => {
            store_health.insert("status".to_string(), json!("unhealthy"));
            store_health.insert("error".to_string(), json!("Store timeout after 1s"));
            false
        }
    };

    let (status_code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(json!({
            "status": status,
            "service": "step2hub-api",
            "version": env!("CARGO_PKG_VERSION"),
            "dependencies": { "store": store_health }
        })),
    )
}

pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::render_metrics() {
        Ok(metrics_text) => (StatusCode::OK, metrics_text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to render metrics: {}", e),
        ),
    }
}
