use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use validator::Validate;

use crate::metrics::{ATTEMPTS_LOGGED_TOTAL, ATTEMPTS_REJECTED_TOTAL};
use crate::models::attempt::{
    AttemptRecord, AttemptSource, LogAttemptRequest, NewAttempt, DEFAULT_CONFIDENCE,
};
use crate::models::labels::{QuestionType, UnknownLabel};
use crate::services::classifier::Classifier;
use crate::store::{AttemptStore, StoreError};

/// Submission problems caught before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptValidationError {
    #[error("Please paste the question stem.")]
    MissingQuestion,
    #[error("Enter both your answer and the correct answer.")]
    MissingAnswer,
    #[error("Confidence must be between 1 and 5, got {0}")]
    ConfidenceOutOfRange(u8),
    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabel),
    #[error("Validation failed: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AttemptServiceError {
    #[error(transparent)]
    Validation(#[from] AttemptValidationError),
    #[error("Save failed: {0}")]
    Save(#[source] StoreError),
    #[error("Could not load logs: {0}")]
    Load(#[source] StoreError),
}

pub struct AttemptService {
    store: Arc<dyn AttemptStore>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn AttemptStore>) -> Self {
        Self { store }
    }

    /// Validates a pasted submission and appends it.
    pub async fn log_attempt(
        &self,
        req: LogAttemptRequest,
    ) -> Result<AttemptRecord, AttemptServiceError> {
        let attempt = match prepare_attempt(req, AttemptSource::UserPasted) {
            Ok(attempt) => attempt,
            Err(e) => {
                ATTEMPTS_REJECTED_TOTAL.inc();
                tracing::debug!(error = %e, "Rejected attempt submission");
                return Err(e.into());
            }
        };
        self.save(attempt).await
    }

    /// Appends an already validated record.
    pub async fn save(&self, attempt: NewAttempt) -> Result<AttemptRecord, AttemptServiceError> {
        let source = attempt.source;
        match self.store.insert(attempt).await {
            Ok(record) => {
                ATTEMPTS_LOGGED_TOTAL
                    .with_label_values(&[source.as_str()])
                    .inc();
                tracing::info!(
                    attempt_id = record.id,
                    source = source.as_str(),
                    question_type = record.question_type.as_str(),
                    "Attempt saved"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::error!(error = %e, backend = self.store.backend(), "Attempt save failed");
                Err(AttemptServiceError::Save(e))
            }
        }
    }

    /// Full history, most recent first.
    pub async fn list(&self) -> Result<Vec<AttemptRecord>, AttemptServiceError> {
        self.store.list_recent().await.map_err(|e| {
            tracing::error!(error = %e, backend = self.store.backend(), "Could not load logs");
            AttemptServiceError::Load(e)
        })
    }
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn parse_strict<T: FromStr<Err = UnknownLabel> + PartialEq>(
    values: Vec<String>,
) -> Result<Vec<T>, UnknownLabel> {
    let mut labels = Vec::new();
    for value in values {
        if value.trim().is_empty() {
            continue;
        }
        let label = value.parse::<T>()?;
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    Ok(labels)
}

/// Turns a raw submission into a storable record.
///
/// Text fields are trimmed. Labels that were left out are filled with the
/// classifier's suggestions; labels that were given must belong to their
/// vocabulary.
pub fn prepare_attempt(
    req: LogAttemptRequest,
    source: AttemptSource,
) -> Result<NewAttempt, AttemptValidationError> {
    req.validate()
        .map_err(|e| AttemptValidationError::Invalid(e.to_string()))?;

    let raw_question = clean(req.raw_question);
    if raw_question.is_empty() {
        return Err(AttemptValidationError::MissingQuestion);
    }

    let your_answer = clean(req.your_answer);
    let correct_answer = clean(req.correct_answer);
    if your_answer.is_empty() || correct_answer.is_empty() {
        return Err(AttemptValidationError::MissingAnswer);
    }

    let confidence = req.confidence.unwrap_or(DEFAULT_CONFIDENCE);
    if !(1..=5).contains(&confidence) {
        return Err(AttemptValidationError::ConfidenceOutOfRange(confidence));
    }

    let explanation = clean(req.explanation);
    let classifier = Classifier::default();
    let text = format!("{}\n{}", raw_question, explanation);

    let question_type = match req.question_type.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse::<QuestionType>()?,
        _ => classifier.guess_question_type(&text),
    };

    let topics = match req.topics {
        Some(values) => parse_strict(values)?,
        None => classifier.guess_topics(&text),
    };

    let error_types = match req.error_types {
        Some(values) => parse_strict(values)?,
        None => classifier.suggest_error_types(
            &your_answer,
            &correct_answer,
            &raw_question,
            &explanation,
        ),
    };

    Ok(NewAttempt {
        source,
        question_bank: clean(req.question_bank),
        exam: clean(req.exam),
        question_number: clean(req.question_number),
        raw_question,
        choices: clean(req.choices),
        your_answer,
        correct_answer,
        confidence,
        explanation,
        topics,
        question_type,
        error_types,
        missed_clues: clean(req.missed_clues),
        notes: clean(req.notes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::labels::{ErrorType, Topic};
    use crate::store::SqliteAttemptStore;

    fn request() -> LogAttemptRequest {
        LogAttemptRequest {
            question_bank: Some(" NBME ".into()),
            exam: Some("NBME 27".into()),
            raw_question: Some(
                "A 28-year-old woman has crampy abdominal pain that improves after defecation."
                    .into(),
            ),
            your_answer: Some("A".into()),
            correct_answer: Some("D".into()),
            explanation: Some("Rome IV criteria for IBS; reassurance is first-line.".into()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_labels_are_suggested() {
        let attempt = prepare_attempt(request(), AttemptSource::UserPasted).unwrap();
        assert_eq!(attempt.question_bank, "NBME");
        assert_eq!(attempt.topics, vec![Topic::Gastroenterology]);
        assert_eq!(
            attempt.error_types,
            vec![ErrorType::ContentGap, ErrorType::PrioritySequence]
        );
        assert_eq!(attempt.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn given_labels_are_kept() {
        let mut req = request();
        req.topics = Some(vec!["psych".into(), "Psych".into()]);
        req.question_type = Some("Mechanism".into());
        req.error_types = Some(vec![]);
        let attempt = prepare_attempt(req, AttemptSource::UserPasted).unwrap();
        assert_eq!(attempt.topics, vec![Topic::Psych]);
        assert_eq!(attempt.question_type, QuestionType::Mechanism);
        assert!(attempt.error_types.is_empty());
    }

    #[test]
    fn rejects_incomplete_or_unknown_input() {
        let mut req = request();
        req.raw_question = Some("   ".into());
        assert_eq!(
            prepare_attempt(req, AttemptSource::UserPasted).unwrap_err(),
            AttemptValidationError::MissingQuestion
        );

        let mut req = request();
        req.correct_answer = None;
        assert_eq!(
            prepare_attempt(req, AttemptSource::UserPasted).unwrap_err(),
            AttemptValidationError::MissingAnswer
        );

        let mut req = request();
        req.confidence = Some(0);
        assert_eq!(
            prepare_attempt(req, AttemptSource::UserPasted).unwrap_err(),
            AttemptValidationError::ConfidenceOutOfRange(0)
        );

        let mut req = request();
        req.topics = Some(vec!["Dermatology".into()]);
        assert!(matches!(
            prepare_attempt(req, AttemptSource::UserPasted).unwrap_err(),
            AttemptValidationError::UnknownLabel(_)
        ));
    }

    #[tokio::test]
    async fn log_and_list_round_trip() {
        let store = Arc::new(SqliteAttemptStore::open_in_memory().unwrap());
        let service = AttemptService::new(store);

        let saved = service.log_attempt(request()).await.unwrap();
        assert_eq!(saved.source, AttemptSource::UserPasted);

        let listed = service.list().await.unwrap();
        assert_eq!(listed, vec![saved]);
    }
}
