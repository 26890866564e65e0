use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::labels::{ErrorType, QuestionType, Topic};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptSource {
    #[default]
    UserPasted,
    GeneratedPractice,
}

impl AttemptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptSource::UserPasted => "user_pasted",
            AttemptSource::GeneratedPractice => "generated_practice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "user_pasted" => Some(AttemptSource::UserPasted),
            "generated_practice" => Some(AttemptSource::GeneratedPractice),
            _ => None,
        }
    }
}

/// One logged question encounter, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub source: AttemptSource,
    pub question_bank: String,
    pub exam: String,
    pub question_number: String,
    pub raw_question: String,
    pub choices: String,
    pub your_answer: String,
    pub correct_answer: String,
    pub confidence: u8,
    pub explanation: String,
    pub topics: Vec<Topic>,
    pub question_type: QuestionType,
    pub error_types: Vec<ErrorType>,
    pub missed_clues: String,
    pub notes: String,
}

impl AttemptRecord {
    /// Case-insensitive, whitespace-trimmed answer comparison.
    ///
    /// Returns `None` when both answers are empty: such a record cannot be
    /// graded and is left out of accuracy figures.
    pub fn is_correct(&self) -> Option<bool> {
        let yours = normalize_answer(&self.your_answer);
        let correct = normalize_answer(&self.correct_answer);
        if yours.is_empty() && correct.is_empty() {
            return None;
        }
        Some(yours == correct)
    }
}

pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// A validated record waiting for storage to assign `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttempt {
    pub source: AttemptSource,
    pub question_bank: String,
    pub exam: String,
    pub question_number: String,
    pub raw_question: String,
    pub choices: String,
    pub your_answer: String,
    pub correct_answer: String,
    pub confidence: u8,
    pub explanation: String,
    pub topics: Vec<Topic>,
    pub question_type: QuestionType,
    pub error_types: Vec<ErrorType>,
    pub missed_clues: String,
    pub notes: String,
}

impl NewAttempt {
    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> AttemptRecord {
        AttemptRecord {
            id,
            created_at,
            source: self.source,
            question_bank: self.question_bank,
            exam: self.exam,
            question_number: self.question_number,
            raw_question: self.raw_question,
            choices: self.choices,
            your_answer: self.your_answer,
            correct_answer: self.correct_answer,
            confidence: self.confidence,
            explanation: self.explanation,
            topics: self.topics,
            question_type: self.question_type,
            error_types: self.error_types,
            missed_clues: self.missed_clues,
            notes: self.notes,
        }
    }
}

pub const DEFAULT_CONFIDENCE: u8 = 3;

/// Body of `POST /api/v1/attempts`.
///
/// Labels arrive as plain strings so that values outside the vocabulary can be
/// reported back instead of failing deserialization. Absent label fields are
/// filled from the classifier's suggestions.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LogAttemptRequest {
    #[validate(length(max = 100, message = "Question bank must be at most 100 characters"))]
    pub question_bank: Option<String>,
    #[validate(length(max = 100, message = "Exam must be at most 100 characters"))]
    pub exam: Option<String>,
    #[validate(length(max = 20, message = "Question number must be at most 20 characters"))]
    pub question_number: Option<String>,
    #[validate(length(max = 20000, message = "Question stem is too long"))]
    pub raw_question: Option<String>,
    #[validate(length(max = 5000, message = "Choices are too long"))]
    pub choices: Option<String>,
    #[validate(length(max = 500, message = "Answer is too long"))]
    pub your_answer: Option<String>,
    #[validate(length(max = 500, message = "Answer is too long"))]
    pub correct_answer: Option<String>,
    pub confidence: Option<u8>,
    #[validate(length(max = 20000, message = "Explanation is too long"))]
    pub explanation: Option<String>,
    pub topics: Option<Vec<String>>,
    pub question_type: Option<String>,
    pub error_types: Option<Vec<String>>,
    #[validate(length(max = 5000, message = "Missed clues are too long"))]
    pub missed_clues: Option<String>,
    #[validate(length(max = 5000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

/// Review/Export filters. `None` means "(all)".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttemptFilter {
    pub question_bank: Option<String>,
    pub exam: Option<String>,
    pub question_type: Option<String>,
    pub source: Option<String>,
    pub limit: Option<usize>,
}
