use axum::Json;
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::AppJson,
    metrics::CLASSIFICATIONS_TOTAL,
    models::{
        classification::LabelsResponse, Classification, ClassifyRequest, ErrorType,
        QuestionType, Topic,
    },
    services::{classifier::Classifier, rulebook::RULES_VERSION},
};

pub async fn list_labels() -> Json<LabelsResponse> {
    Json(LabelsResponse {
        rules_version: RULES_VERSION,
        question_types: QuestionType::ALL.to_vec(),
        topics: Topic::ALL.to_vec(),
        error_types: ErrorType::ALL.to_vec(),
    })
}

/// Suggested labels for a pasted question; nothing is stored.
pub async fn classify(
    AppJson(payload): AppJson<ClassifyRequest>,
) -> Result<Json<Classification>, ApiError> {
    payload.validate()?;

    let classification = Classifier::default().classify(
        payload.question.as_deref().unwrap_or_default(),
        payload.explanation.as_deref().unwrap_or_default(),
        payload.your_answer.as_deref().unwrap_or_default(),
        payload.correct_answer.as_deref().unwrap_or_default(),
    );

    CLASSIFICATIONS_TOTAL
        .with_label_values(&[classification.question_type.as_str()])
        .inc();

    Ok(Json(classification))
}
