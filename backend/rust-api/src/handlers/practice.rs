use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::AppJson,
    models::practice::{
        CreatePracticeSessionRequest, PracticeAnswerResponse, PracticeSessionResponse,
        SubmitPracticeAnswerRequest,
    },
    services::{
        attempt_service::AttemptService, practice_service::PracticeService, AppState,
    },
};

fn practice_service(state: &AppState) -> PracticeService {
    PracticeService::new(
        state.practice_sessions.clone(),
        AttemptService::new(state.store.clone()),
    )
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreatePracticeSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = practice_service(&state)
        .create_session(payload.topic.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PracticeSessionResponse::from(&session)),
    ))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<PracticeSessionResponse>, ApiError> {
    let session = practice_service(&state).get_session(&session_id).await?;
    Ok(Json(PracticeSessionResponse::from(&session)))
}

pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<PracticeSessionResponse>, ApiError> {
    let session = practice_service(&state).next_question(&session_id).await?;
    Ok(Json(PracticeSessionResponse::from(&session)))
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    AppJson(payload): AppJson<SubmitPracticeAnswerRequest>,
) -> Result<Json<PracticeAnswerResponse>, ApiError> {
    payload.validate()?;

    let (outcome, record) = practice_service(&state)
        .submit_answer(&session_id, payload)
        .await?;

    Ok(Json(PracticeAnswerResponse {
        outcome,
        attempt_id: record.id,
    }))
}
