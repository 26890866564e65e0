//! Storage collaborator for attempt records.
//!
//! Records are append-only: stores insert and read, never update or delete.
//! Label vocabularies are enforced strictly before a record reaches a store;
//! on the way back out, fragments that no longer belong to a vocabulary are
//! dropped with a warning so one bad row cannot take the dashboard down.

use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use crate::models::attempt::{AttemptRecord, AttemptSource, NewAttempt, DEFAULT_CONFIDENCE};
use crate::models::labels::{parse_label_field, QuestionType};

pub mod mongo;
pub mod sqlite;

pub use mongo::MongoAttemptStore;
pub use sqlite::SqliteAttemptStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(String),
    #[error("storage connection lock poisoned")]
    Poisoned,
    #[error("{0}")]
    Corrupt(String),
}

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Short backend name used in logs, metrics and the health report.
    fn backend(&self) -> &'static str;

    /// Appends a record, assigning `id` and `created_at`.
    async fn insert(&self, attempt: NewAttempt) -> Result<AttemptRecord, StoreError>;

    /// Every stored record, most recent (highest id) first.
    async fn list_recent(&self) -> Result<Vec<AttemptRecord>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Parses a stored multi-value label field, warning about dropped fragments.
pub(crate) fn decode_labels<T>(id: i64, field: &str, raw: &str) -> Vec<T>
where
    T: FromStr + PartialEq,
{
    let parsed = parse_label_field::<T>(raw);
    if !parsed.rejected.is_empty() {
        tracing::warn!(
            attempt_id = id,
            field,
            rejected = ?parsed.rejected,
            "Skipping unknown labels in stored attempt"
        );
    }
    parsed.labels
}

/// Same as [`decode_labels`] for stores that keep labels as arrays.
pub(crate) fn decode_label_list<T>(id: i64, field: &str, values: &[String]) -> Vec<T>
where
    T: FromStr + PartialEq,
{
    let mut labels = Vec::new();
    let mut rejected = Vec::new();
    for value in values {
        match value.parse::<T>() {
            Ok(label) if !labels.contains(&label) => labels.push(label),
            Ok(_) => {}
            Err(_) if value.trim().is_empty() => {}
            Err(_) => rejected.push(value.clone()),
        }
    }
    if !rejected.is_empty() {
        tracing::warn!(
            attempt_id = id,
            field,
            rejected = ?rejected,
            "Skipping unknown labels in stored attempt"
        );
    }
    labels
}

pub(crate) fn encode_labels<T: Display>(labels: &[T]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

pub(crate) fn decode_question_type(id: i64, raw: &str) -> QuestionType {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(
            attempt_id = id,
            value = raw,
            "Unknown stored question type, using default"
        );
        QuestionType::default()
    })
}

pub(crate) fn decode_source(id: i64, raw: &str) -> AttemptSource {
    AttemptSource::parse(raw).unwrap_or_else(|| {
        if !raw.trim().is_empty() {
            tracing::warn!(attempt_id = id, value = raw, "Unknown stored attempt source");
        }
        AttemptSource::default()
    })
}

pub(crate) fn decode_confidence(id: i64, raw: i64) -> u8 {
    match u8::try_from(raw) {
        Ok(value) if (1..=5).contains(&value) => value,
        _ => {
            tracing::warn!(attempt_id = id, value = raw, "Stored confidence out of range");
            DEFAULT_CONFIDENCE
        }
    }
}

/// Accepts RFC 3339 and the `YYYY-MM-DD HH:MM:SS` form older rows used.
pub(crate) fn decode_timestamp(id: i64, raw: &str) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return naive.and_utc();
    }
    tracing::warn!(attempt_id = id, value = raw, "Unparseable stored timestamp");
    DateTime::<Utc>::default()
}
