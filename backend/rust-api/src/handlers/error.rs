use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::attempt_service::AttemptServiceError;
use crate::services::practice_service::PracticeError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::bad_request(format!("Validation failed: {}", err))
    }
}

impl From<AttemptServiceError> for ApiError {
    fn from(err: AttemptServiceError) -> Self {
        match err {
            AttemptServiceError::Validation(e) => ApiError::bad_request(e.to_string()),
            e @ (AttemptServiceError::Save(_) | AttemptServiceError::Load(_)) => {
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl From<PracticeError> for ApiError {
    fn from(err: PracticeError) -> Self {
        let message = err.to_string();
        match err {
            PracticeError::SessionNotFound | PracticeError::NoQuestions(_) => {
                ApiError::NotFound(message)
            }
            PracticeError::SessionExpired => ApiError::Gone(message),
            PracticeError::NothingToAnswer => ApiError::Conflict(message),
            PracticeError::InvalidChoice(_)
            | PracticeError::ConfidenceOutOfRange(_)
            | PracticeError::UnknownTopic(_) => ApiError::BadRequest(message),
            PracticeError::Attempt(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::Gone(message)
            | ApiError::Internal(message) => message,
        };

        (
            status,
            Json(json!({
                "message": message,
                "status": status.as_u16()
            })),
        )
            .into_response()
    }
}
