use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use super::{
    decode_confidence, decode_label_list, decode_question_type, decode_source, encode_labels,
    AttemptStore, StoreError,
};
use crate::metrics::track_store_operation;
use crate::models::attempt::{AttemptRecord, NewAttempt};

const BACKEND: &str = "mongo";
const ATTEMPTS_COLLECTION: &str = "attempt_records";
const COUNTERS_COLLECTION: &str = "counters";

/// Stored shape of an attempt. Labels stay plain strings so that documents
/// written by older builds still deserialize.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct AttemptDocument {
    #[serde(rename = "_id")]
    id: i64,
    created_at: DateTime<Utc>,
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
    topics: Vec<String>,
    question_type: String,
    error_types: Vec<String>,
    missed_clues: String,
    notes: String,
}

impl AttemptDocument {
    fn from_record(record: &AttemptRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            source: record.source.as_str().to_string(),
            question_bank: record.question_bank.clone(),
            exam: record.exam.clone(),
            question_number: record.question_number.clone(),
            raw_question: record.raw_question.clone(),
            choices: record.choices.clone(),
            your_answer: record.your_answer.clone(),
            correct_answer: record.correct_answer.clone(),
            confidence: i64::from(record.confidence),
            explanation: record.explanation.clone(),
            topics: encode_labels(&record.topics),
            question_type: record.question_type.as_str().to_string(),
            error_types: encode_labels(&record.error_types),
            missed_clues: record.missed_clues.clone(),
            notes: record.notes.clone(),
        }
    }

    fn into_record(self) -> AttemptRecord {
        let id = self.id;
        AttemptRecord {
            id,
            created_at: self.created_at,
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
            topics: decode_label_list(id, "topics", &self.topics),
            question_type: decode_question_type(id, &self.question_type),
            error_types: decode_label_list(id, "error_types", &self.error_types),
            missed_clues: self.missed_clues,
            notes: self.notes,
        }
    }
}

/// Durable store for deployments that already run MongoDB. Ids come from a
/// counter document so they stay integral and increasing like SQLite rowids.
#[derive(Clone)]
pub struct MongoAttemptStore {
    db: Database,
}

impl MongoAttemptStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(database)))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn attempts(&self) -> Collection<AttemptDocument> {
        self.db.collection(ATTEMPTS_COLLECTION)
    }

    async fn next_id(&self) -> Result<i64, StoreError> {
        let counters = self.db.collection::<Document>(COUNTERS_COLLECTION);
        let counter = counters
            .find_one_and_update(
                doc! { "_id": ATTEMPTS_COLLECTION },
                doc! { "$inc": { "seq": 1_i64 } },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| StoreError::Corrupt("attempt counter upsert returned nothing".into()))?;

        counter
            .get_i64("seq")
            .map_err(|e| StoreError::Corrupt(format!("attempt counter is malformed: {}", e)))
    }

    async fn insert_inner(&self, attempt: NewAttempt) -> Result<AttemptRecord, StoreError> {
        let id = self.next_id().await?;
        let record = attempt.into_record(id, Utc::now().trunc_subsecs(0));
        self.attempts()
            .insert_one(AttemptDocument::from_record(&record))
            .await?;
        Ok(record)
    }

    async fn list_inner(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        let cursor = self
            .attempts()
            .find(doc! {})
            .sort(doc! { "_id": -1 })
            .await?;
        let documents: Vec<AttemptDocument> = cursor.try_collect().await?;
        Ok(documents
            .into_iter()
            .map(AttemptDocument::into_record)
            .collect())
    }
}

#[async_trait]
impl AttemptStore for MongoAttemptStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn insert(&self, attempt: NewAttempt) -> Result<AttemptRecord, StoreError> {
        track_store_operation("insert", BACKEND, self.insert_inner(attempt)).await
    }

    async fn list_recent(&self) -> Result<Vec<AttemptRecord>, StoreError> {
        track_store_operation("list", BACKEND, self.list_inner()).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::AttemptSource;
    use crate::models::labels::{ErrorType, QuestionType, Topic};

    #[test]
    fn document_keeps_labels_as_display_strings() {
        let record = NewAttempt {
            source: AttemptSource::GeneratedPractice,
            question_bank: String::new(),
            exam: String::new(),
            question_number: String::new(),
            raw_question: "stem".into(),
            choices: String::new(),
            your_answer: "A".into(),
            correct_answer: "A".into(),
            confidence: 2,
            explanation: String::new(),
            topics: vec![Topic::HemeOnc],
            question_type: QuestionType::Workup,
            error_types: vec![ErrorType::RiskBenefit],
            missed_clues: String::new(),
            notes: String::new(),
        }
        .into_record(7, Utc::now().trunc_subsecs(0));

        let document = AttemptDocument::from_record(&record);
        assert_eq!(document.topics, vec!["Heme/Onc".to_string()]);
        assert_eq!(document.source, "generated_practice");
        assert_eq!(document.into_record(), record);
    }
}
