use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::labels::{ErrorType, QuestionType, Topic};

/// One canned question template from the practice bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PracticeTemplate {
    pub id: &'static str,
    pub topic: Topic,
    pub question_type: QuestionType,
    pub stem: &'static str,
    /// Answer options; the first one is the correct answer.
    pub options: [&'static str; 5],
    pub explanation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub letter: char,
    pub text: String,
}

/// A template instance with shuffled, lettered choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServedQuestion {
    pub template_id: String,
    pub topic: Topic,
    pub question_type: QuestionType,
    pub stem: String,
    pub choices: Vec<Choice>,
    pub correct_letter: char,
    pub explanation: String,
}

impl ServedQuestion {
    pub fn view(&self) -> QuestionView {
        QuestionView {
            template_id: self.template_id.clone(),
            topic: self.topic,
            question_type: self.question_type,
            stem: self.stem.clone(),
            choices: self.choices.clone(),
        }
    }

    pub fn choices_text(&self) -> String {
        self.choices
            .iter()
            .map(|c| format!("{}. {}", c.letter, c.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What the client sees before answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub template_id: String,
    pub topic: Topic,
    pub question_type: QuestionType,
    pub stem: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeSessionStatus {
    AwaitingAnswer,
    Answered,
    Exhausted,
}

/// Per-user practice context: the question currently on screen and what has
/// been served so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeSession {
    pub id: String,
    pub topic: Option<Topic>,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: PracticeSessionStatus,
    pub current: Option<ServedQuestion>,
    pub served: Vec<String>,
    pub answered: u32,
    pub correct: u32,
    pub last_selection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePracticeSessionRequest {
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitPracticeAnswerRequest {
    #[validate(length(min = 1, max = 20, message = "Answer must be between 1 and 20 characters"))]
    pub answer: String,
    pub confidence: Option<u8>,
    #[validate(length(max = 5000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PracticeSessionResponse {
    pub session_id: String,
    pub topic: Option<Topic>,
    pub status: PracticeSessionStatus,
    pub question: Option<QuestionView>,
    pub answered: u32,
    pub correct: u32,
    pub expires_at: DateTime<Utc>,
}

impl From<&PracticeSession> for PracticeSessionResponse {
    fn from(session: &PracticeSession) -> Self {
        Self {
            session_id: session.id.clone(),
            topic: session.topic,
            status: session.status,
            question: session.current.as_ref().map(ServedQuestion::view),
            answered: session.answered,
            correct: session.correct,
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeOutcome {
    pub correct: bool,
    pub your_answer: String,
    pub correct_answer: char,
    pub correct_text: String,
    pub explanation: String,
    pub error_types: Vec<ErrorType>,
    pub answered: u32,
    pub score: u32,
}

#[derive(Debug, Serialize)]
pub struct PracticeAnswerResponse {
    #[serde(flatten)]
    pub outcome: PracticeOutcome,
    pub attempt_id: i64,
}
