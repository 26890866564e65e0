use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use rusqlite::{params, Connection, Row};

use super::{
    decode_confidence, decode_labels, decode_question_type, decode_source, decode_timestamp,
    encode_labels, AttemptStore, StoreError,
};
use crate::metrics::track_store_operation;
use crate::models::attempt::{AttemptRecord, NewAttempt};

const BACKEND: &str = "sqlite";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS attempts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at      TEXT    NOT NULL,
    source          TEXT    NOT NULL DEFAULT 'user_pasted',
    question_bank   TEXT    NOT NULL DEFAULT '',
    exam            TEXT    NOT NULL DEFAULT '',
    question_number TEXT    NOT NULL DEFAULT '',
    raw_question    TEXT    NOT NULL,
    choices         TEXT    NOT NULL DEFAULT '',
    your_answer     TEXT    NOT NULL DEFAULT '',
    correct_answer  TEXT    NOT NULL DEFAULT '',
    confidence      INTEGER NOT NULL DEFAULT 3,
    explanation     TEXT    NOT NULL DEFAULT '',
    topics          TEXT    NOT NULL DEFAULT '',
    question_type   TEXT    NOT NULL DEFAULT 'management',
    error_types     TEXT    NOT NULL DEFAULT '',
    missed_clues    TEXT    NOT NULL DEFAULT '',
    notes           TEXT    NOT NULL DEFAULT ''
);
";

const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;
";

const SELECT_COLUMNS: &str = "id, created_at, source, question_bank, exam, question_number, \
    raw_question, choices, your_answer, correct_answer, confidence, explanation, topics, \
    question_type, error_types, missed_clues, notes";

/// Local single-file store. One connection behind a mutex; every call runs on
/// the blocking pool.
#[derive(Clone)]
pub struct SqliteAttemptStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteAttemptStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(PRAGMAS)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&*guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Raw column values, decoded after the row borrow ends.
struct AttemptRow {
    id: i64,
    created_at: String,
    source: String,
    question_bank: String,
    exam: String,
    question_number: String,
    raw_question: String,
    choices: String,
    your_answer: String,
    correct_answer: String,
    confidence: i64,
    explanation: String,
    topics: String,
    question_type: String,
    error_types: String,
    missed_clues: String,
    notes: String,
}

impl AttemptRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at: row.get(1)?,
            source: row.get(2)?,
            question_bank: row.get(3)?,
            exam: row.get(4)?,
            question_number: row.get(5)?,
            raw_question: row.get(6)?,
            choices: row.get(7)?,
            your_answer: row.get(8)?,
            correct_answer: row.get(9)?,
            confidence: row.get(10)?,
            explanation: row.get(11)?,
            topics: row.get(12)?,
            question_type: row.get(13)?,
            error_types: row.get(14)?,
            missed_clues: row.get(15)?,
            notes: row.get(16)?,
        })
    }

    fn into_record(self) -> AttemptRecord {
        let id = self.id;
        AttemptRecord {
            id,
            created_at: decode_timestamp(id, &self.created_at),
            source: decode_source(id, &self.source),
            question_bank: self.question_bank,
            exam: self.exam,
            question_number: self.question_number,
            raw_question: self.raw_question,
            choices: self.choices,
            your_answer: self.your_answer,
            correct_answer: self.correct_answer,
            confidence: decode_confidence(id, self.confidence),
            explanation: self.explanation,
            topics: decode_labels(id, "topics", &self.topics),
            question_type: decode_question_type(id, &self.question_type),
            error_types: decode_labels(id, "error_types", &self.error_types),
            missed_clues: self.missed_clues,
            notes: self.notes,
        }
    }
}

fn insert_attempt(conn: &Connection, attempt: NewAttempt) -> Result<AttemptRecord, StoreError> {
    let created_at = Utc::now().trunc_subsecs(0);
    let topics_json = serde_json::to_string(&encode_labels(&attempt.topics))?;
    let error_types_json = serde_json::to_string(&encode_labels(&attempt.error_types))?;

    conn.execute(
        "INSERT INTO attempts (
            created_at, source, question_bank, exam, question_number, raw_question,
            choices, your_answer, correct_answer, confidence, explanation, topics,
            question_type, error_types, missed_clues, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            created_at.to_rfc3339(),
            attempt.source.as_str(),
            attempt.question_bank,
            attempt.exam,
            attempt.question_number,
            attempt.raw_question,
            attempt.choices,
            attempt.your_answer,
            attempt.correct_answer,
            attempt.confidence,
            attempt.explanation,
            topics_json,
            attempt.question_type.as_str(),
            error_types_json,
            attempt.missed_clues,
            attempt.notes,
        ],
    )?;

    let id = conn.last_insert_rowid();
    Ok(attempt.into_record(id, created_at))
}

fn select_all(conn: &Connection) -> Result<Vec<AttemptRecord>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM attempts ORDER BY id DESC",
        SELECT_COLUMNS
    ))?;
    let rows = stmt
        .query_map([], AttemptRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows.into_iter().map(AttemptRow::into_record).collect())
}

#[async_trait]
impl AttemptStore for SqliteAttemptStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, attempt: NewAttempt) -> Result<AttemptRecord, StoreError> {
        track_store_operation(
            "insert",
            BACKEND,
            self.with_conn(move |conn| insert_attempt(conn, attempt)),
        )
        .await
    }

    async fn list_recent(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        track_store_operation("list", BACKEND, self.with_conn(select_all)).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}
