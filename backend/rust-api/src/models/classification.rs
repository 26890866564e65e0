use serde::{Deserialize, Serialize};
use validator::Validate;

use super::labels::{ErrorType, QuestionType, Topic};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(max = 20000, message = "Question stem is too long"))]
    pub question: Option<String>,
    #[validate(length(max = 20000, message = "Explanation is too long"))]
    pub explanation: Option<String>,
    pub your_answer: Option<String>,
    pub correct_answer: Option<String>,
}

/// Suggested labels for an editable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub question_type: QuestionType,
    pub topics: Vec<Topic>,
    pub error_types: Vec<ErrorType>,
    pub primary_topic: Topic,
    pub secondary_topic: Option<Topic>,
}

/// A matched topic and the number of distinct seed patterns that hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicScore {
    pub topic: Topic,
    pub hits: usize,
}

#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub rules_version: &'static str,
    pub question_types: Vec<QuestionType>,
    pub topics: Vec<Topic>,
    pub error_types: Vec<ErrorType>,
}
