use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use super::ApiError;
use crate::{
    extractors::AppJson,
    metrics::EXPORTS_GENERATED_TOTAL,
    models::{AttemptFilter, AttemptRecord, LogAttemptRequest},
    services::{
        attempt_service::AttemptService,
        export_service::{
            attempts_to_csv, filter_attempts, review_facets, ReviewFacets, EXPORT_FILE_NAME,
        },
        AppState,
    },
};

#[derive(Debug, Serialize)]
pub struct AttemptListResponse {
    pub attempts: Vec<AttemptRecord>,
    pub facets: ReviewFacets,
}

pub async fn log_attempt(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LogAttemptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AttemptService::new(state.store.clone());
    let record = service.log_attempt(payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_attempts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AttemptFilter>,
) -> Result<Json<AttemptListResponse>, ApiError> {
    let service = AttemptService::new(state.store.clone());
    let records = service.list().await?;
    let facets = review_facets(&records);

    Ok(Json(AttemptListResponse {
        attempts: filter_attempts(records, &filter),
        facets,
    }))
}

pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AttemptFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AttemptService::new(state.store.clone());
    let records = filter_attempts(service.list().await?, &filter);
    let csv = attempts_to_csv(&records);

    EXPORTS_GENERATED_TOTAL.with_label_values(&["csv"]).inc();
    tracing::info!(rows = records.len(), "CSV export generated");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    ))
}
