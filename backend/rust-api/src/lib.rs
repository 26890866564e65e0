use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod store;

pub use crate::config::Config;
pub use crate::services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            trace_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/v1", api_routes())
        .with_state(app_state)
        .layer(cors)
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(trace)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/labels", get(handlers::classify::list_labels))
        .route("/classify", post(handlers::classify::classify))
        .route(
            "/attempts",
            get(handlers::attempts::list_attempts).post(handlers::attempts::log_attempt),
        )
        .route("/attempts/export.csv", get(handlers::attempts::export_csv))
        .route("/stats", get(handlers::stats::get_stats))
        .nest("/practice/sessions", practice_routes())
}

fn practice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::practice::create_session))
        .route("/{id}", get(handlers::practice::get_session))
        .route("/{id}/next", post(handlers::practice::next_question))
        .route("/{id}/answer", post(handlers::practice::submit_answer))
}
