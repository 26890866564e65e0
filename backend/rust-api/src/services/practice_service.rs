use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::metrics::{PRACTICE_ANSWERS_TOTAL, PRACTICE_SESSIONS_ACTIVE, PRACTICE_SESSIONS_TOTAL};
use crate::models::attempt::{AttemptRecord, AttemptSource, NewAttempt, DEFAULT_CONFIDENCE};
use crate::models::labels::{Topic, UnknownLabel};
use crate::models::practice::{
    Choice, PracticeOutcome, PracticeSession, PracticeSessionStatus, PracticeTemplate,
    ServedQuestion, SubmitPracticeAnswerRequest,
};
use crate::services::attempt_service::{AttemptService, AttemptServiceError};
use crate::services::classifier::Classifier;
use crate::services::question_bank;

pub const PRACTICE_QUESTION_BANK: &str = "Step2Hub practice";

const LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

#[derive(Debug, Error)]
pub enum PracticeError {
    #[error("Practice session not found")]
    SessionNotFound,
    #[error("Practice session expired")]
    SessionExpired,
    #[error("No practice questions available for {0}")]
    NoQuestions(Topic),
    #[error("No question is waiting for an answer")]
    NothingToAnswer,
    #[error("'{0}' is not one of the offered choices")]
    InvalidChoice(String),
    #[error("Confidence must be between 1 and 5, got {0}")]
    ConfidenceOutOfRange(u8),
    #[error(transparent)]
    UnknownTopic(#[from] UnknownLabel),
    #[error(transparent)]
    Attempt(#[from] AttemptServiceError),
}

/// Instantiates a template with shuffled, lettered choices.
pub fn serve_question<R: Rng + ?Sized>(template: &PracticeTemplate, rng: &mut R) -> ServedQuestion {
    let correct_text = template.options[0];
    let mut options = template.options;
    options.shuffle(rng);

    let choices: Vec<Choice> = LETTERS
        .iter()
        .zip(options.iter())
        .map(|(letter, text)| Choice {
            letter: *letter,
            text: text.to_string(),
        })
        .collect();

    let correct_letter = choices
        .iter()
        .find(|c| c.text == correct_text)
        .map(|c| c.letter)
        .unwrap_or(LETTERS[0]);

    ServedQuestion {
        template_id: template.id.to_string(),
        topic: template.topic,
        question_type: template.question_type,
        stem: template.stem.to_string(),
        choices,
        correct_letter,
        explanation: template.explanation.to_string(),
    }
}

/// Puts a not-yet-served question on the session. Marks the session
/// exhausted and returns `None` once its pool is used up.
pub fn select_next<'s, R: Rng + ?Sized>(
    session: &'s mut PracticeSession,
    rng: &mut R,
) -> Option<&'s ServedQuestion> {
    let remaining: Vec<&PracticeTemplate> = question_bank::templates_for(session.topic)
        .into_iter()
        .filter(|t| !session.served.iter().any(|id| id == t.id))
        .collect();

    session.last_selection = None;
    match remaining.choose(rng) {
        Some(template) => {
            session.served.push(template.id.to_string());
            session.current = Some(serve_question(template, rng));
            session.status = PracticeSessionStatus::AwaitingAnswer;
        }
        None => {
            session.current = None;
            session.status = PracticeSessionStatus::Exhausted;
        }
    }
    session.current.as_ref()
}

/// Accepts a choice letter or the full text of a choice.
pub fn resolve_choice(question: &ServedQuestion, answer: &str) -> Option<char> {
    let answer = answer.trim().trim_end_matches(['.', ')']);
    let mut chars = answer.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let letter = c.to_ascii_uppercase();
        return question
            .choices
            .iter()
            .any(|choice| choice.letter == letter)
            .then_some(letter);
    }
    question
        .choices
        .iter()
        .find(|choice| choice.text.eq_ignore_ascii_case(answer))
        .map(|choice| choice.letter)
}

/// Grades the question on screen and records the selection on the session.
pub fn check_answer(
    session: &mut PracticeSession,
    answer: &str,
) -> Result<PracticeOutcome, PracticeError> {
    let question = match (&session.status, &session.current) {
        (PracticeSessionStatus::AwaitingAnswer, Some(question)) => question,
        _ => return Err(PracticeError::NothingToAnswer),
    };

    let letter = resolve_choice(question, answer)
        .ok_or_else(|| PracticeError::InvalidChoice(answer.trim().to_string()))?;
    let correct = letter == question.correct_letter;

    let error_types = if correct {
        Vec::new()
    } else {
        Classifier::default().suggest_error_types(
            &letter.to_string(),
            &question.correct_letter.to_string(),
            &question.stem,
            &question.explanation,
        )
    };

    let correct_text = question
        .choices
        .iter()
        .find(|c| c.letter == question.correct_letter)
        .map(|c| c.text.clone())
        .unwrap_or_default();

    let outcome = PracticeOutcome {
        correct,
        your_answer: letter.to_string(),
        correct_answer: question.correct_letter,
        correct_text,
        explanation: question.explanation.clone(),
        error_types,
        answered: session.answered + 1,
        score: session.correct + u32::from(correct),
    };

    session.answered = outcome.answered;
    session.correct = outcome.score;
    session.status = PracticeSessionStatus::Answered;
    session.last_selection = Some(outcome.your_answer.clone());

    Ok(outcome)
}

/// The log entry for an answered practice question.
pub fn practice_attempt(
    question: &ServedQuestion,
    outcome: &PracticeOutcome,
    confidence: u8,
    notes: String,
) -> NewAttempt {
    NewAttempt {
        source: AttemptSource::GeneratedPractice,
        question_bank: PRACTICE_QUESTION_BANK.to_string(),
        exam: String::new(),
        question_number: question.template_id.clone(),
        raw_question: question.stem.clone(),
        choices: question.choices_text(),
        your_answer: outcome.your_answer.clone(),
        correct_answer: outcome.correct_answer.to_string(),
        confidence,
        explanation: question.explanation.clone(),
        topics: vec![question.topic],
        question_type: question.question_type,
        error_types: outcome.error_types.clone(),
        missed_clues: String::new(),
        notes,
    }
}

/// In-memory practice sessions with a fixed lifetime.
pub struct PracticeSessionStore {
    sessions: RwLock<HashMap<String, PracticeSession>>,
    ttl: Duration,
}

impl PracticeSessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn insert(&self, session: PracticeSession) {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        let expired = before - sessions.len();
        if expired > 0 {
            PRACTICE_SESSIONS_TOTAL
                .with_label_values(&["expired"])
                .inc_by(expired as u64);
        }
        sessions.insert(session.id.clone(), session);
        PRACTICE_SESSIONS_ACTIVE.set(sessions.len() as i64);
    }

    async fn get(&self, id: &str, now: DateTime<Utc>) -> Result<PracticeSession, PracticeError> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Err(PracticeError::SessionNotFound),
                Some(session) if session.expires_at > now => return Ok(session.clone()),
                Some(_) => {}
            }
        }
        self.expire(id).await;
        Err(PracticeError::SessionExpired)
    }

    /// Runs `f` on a live session under the write lock.
    async fn update<F, T>(&self, id: &str, now: DateTime<Utc>, f: F) -> Result<T, PracticeError>
    where
        F: FnOnce(&mut PracticeSession) -> Result<T, PracticeError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(id).ok_or(PracticeError::SessionNotFound)?;
        if session.expires_at <= now {
            sessions.remove(id);
            PRACTICE_SESSIONS_TOTAL.with_label_values(&["expired"]).inc();
            PRACTICE_SESSIONS_ACTIVE.set(sessions.len() as i64);
            return Err(PracticeError::SessionExpired);
        }
        f(session)
    }

    /// Stores a graded session unless the live one has moved on since
    /// grading started (answered elsewhere, advanced or expired).
    async fn commit(&self, graded: PracticeSession, answered_before: u32) {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&graded.id) {
            Some(live)
                if live.answered == answered_before
                    && live.status == PracticeSessionStatus::AwaitingAnswer =>
            {
                *live = graded;
            }
            Some(_) => tracing::warn!(
                session_id = %graded.id,
                "Practice session changed while its answer was being saved"
            ),
            None => tracing::debug!(
                session_id = %graded.id,
                "Practice session expired while its answer was being saved"
            ),
        }
    }

    async fn expire(&self, id: &str) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(id).is_some() {
            PRACTICE_SESSIONS_TOTAL.with_label_values(&["expired"]).inc();
            PRACTICE_SESSIONS_ACTIVE.set(sessions.len() as i64);
        }
    }
}

pub struct PracticeService {
    sessions: Arc<PracticeSessionStore>,
    attempts: AttemptService,
}

impl PracticeService {
    pub fn new(sessions: Arc<PracticeSessionStore>, attempts: AttemptService) -> Self {
        Self { sessions, attempts }
    }

    pub async fn create_session(
        &self,
        topic: Option<&str>,
    ) -> Result<PracticeSession, PracticeError> {
        let topic = match topic.map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(raw.parse::<Topic>()?),
            _ => None,
        };

        let now = Utc::now();
        let mut session = PracticeSession {
            id: Uuid::new_v4().to_string(),
            topic,
            started_at: now,
            expires_at: now + self.sessions.ttl(),
            status: PracticeSessionStatus::AwaitingAnswer,
            current: None,
            served: Vec::new(),
            answered: 0,
            correct: 0,
            last_selection: None,
        };

        let served = select_next(&mut session, &mut rand::rng()).is_some();
        if !served {
            return Err(PracticeError::NoQuestions(topic.unwrap_or(Topic::FALLBACK)));
        }

        self.sessions.insert(session.clone()).await;
        PRACTICE_SESSIONS_TOTAL.with_label_values(&["created"]).inc();
        tracing::info!(
            session_id = %session.id,
            topic = ?session.topic,
            "Practice session created"
        );

        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<PracticeSession, PracticeError> {
        self.sessions.get(id, Utc::now()).await
    }

    pub async fn next_question(&self, id: &str) -> Result<PracticeSession, PracticeError> {
        self.sessions
            .update(id, Utc::now(), |session| {
                if select_next(session, &mut rand::rng()).is_none() {
                    tracing::debug!(session_id = %session.id, "Practice pool exhausted");
                }
                Ok(session.clone())
            })
            .await
    }

    /// Grades the answer and logs it as a generated-practice attempt.
    pub async fn submit_answer(
        &self,
        id: &str,
        req: SubmitPracticeAnswerRequest,
    ) -> Result<(PracticeOutcome, AttemptRecord), PracticeError> {
        let confidence = req.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        if !(1..=5).contains(&confidence) {
            return Err(PracticeError::ConfidenceOutOfRange(confidence));
        }
        let notes = req.notes.map(|n| n.trim().to_string()).unwrap_or_default();

        // Graded on a copy; the stored session only moves on once the
        // attempt is saved, so a failed save can be retried.
        let mut graded = self.sessions.get(id, Utc::now()).await?;
        let answered_before = graded.answered;
        let outcome = check_answer(&mut graded, &req.answer)?;
        let question = graded
            .current
            .as_ref()
            .ok_or(PracticeError::NothingToAnswer)?;
        let attempt = practice_attempt(question, &outcome, confidence, notes);

        let record = self.attempts.save(attempt).await?;
        self.sessions.commit(graded, answered_before).await;

        PRACTICE_ANSWERS_TOTAL
            .with_label_values(&[if outcome.correct { "true" } else { "false" }])
            .inc();

        Ok((outcome, record))
    }
}
