//! Review/Export: filtering the history and rendering it as CSV.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::attempt::{AttemptFilter, AttemptRecord};
use crate::models::labels::join_labels;

pub const EXPORT_FILE_NAME: &str = "step2hub_logs.csv";

const ALL: &str = "(all)";

const CSV_HEADER: [&str; 17] = [
    "id",
    "created_at",
    "source",
    "question_bank",
    "exam",
    "question_number",
    "raw_question",
    "choices",
    "your_answer",
    "correct_answer",
    "confidence",
    "explanation",
    "topics",
    "question_type",
    "error_types",
    "missed_clues",
    "notes",
];

/// Distinct non-empty values offered as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewFacets {
    pub question_banks: Vec<String>,
    pub exams: Vec<String>,
    pub question_types: Vec<String>,
}

/// `None`, empty and "(all)" all mean "no constraint".
fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
}

fn matches(record: &AttemptRecord, filter: &AttemptFilter) -> bool {
    if let Some(bank) = active(&filter.question_bank) {
        if record.question_bank != bank {
            return false;
        }
    }
    if let Some(exam) = active(&filter.exam) {
        if record.exam != exam {
            return false;
        }
    }
    if let Some(question_type) = active(&filter.question_type) {
        if record.question_type.as_str() != question_type {
            return false;
        }
    }
    if let Some(source) = active(&filter.source) {
        if record.source.as_str() != source {
            return false;
        }
    }
    true
}

/// Keeps the input order; `limit` applies after filtering.
pub fn filter_attempts(records: Vec<AttemptRecord>, filter: &AttemptFilter) -> Vec<AttemptRecord> {
    let limit = filter.limit.unwrap_or(usize::MAX);
    records
        .into_iter()
        .filter(|record| matches(record, filter))
        .take(limit)
        .collect()
}

pub fn review_facets(records: &[AttemptRecord]) -> ReviewFacets {
    let distinct = |pick: fn(&AttemptRecord) -> &str| -> Vec<String> {
        records
            .iter()
            .map(pick)
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    };

    ReviewFacets {
        question_banks: distinct(|r| r.question_bank.as_str()),
        exams: distinct(|r| r.exam.as_str()),
        question_types: distinct(|r| r.question_type.as_str()),
    }
}

/// Prevents formula injection and quotes fields that need it.
pub fn escape_csv_field(value: &str) -> String {
    let sanitized = if value.starts_with(['=', '+', '@', '-', '\t', '\r', '\n']) {
        format!("\t{}", value)
    } else {
        value.to_string()
    };

    if sanitized.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", sanitized.replace('"', "\"\""))
    } else {
        sanitized
    }
}

fn csv_line(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Header plus one row per record; multi-valued labels are joined with ", ".
pub fn attempts_to_csv(records: &[AttemptRecord]) -> String {
    let header: Vec<String> = CSV_HEADER.iter().map(|h| h.to_string()).collect();
    let mut csv = csv_line(&header);

    for record in records {
        csv.push_str(&csv_line(&[
            record.id.to_string(),
            record.created_at.to_rfc3339(),
            record.source.as_str().to_string(),
            record.question_bank.clone(),
            record.exam.clone(),
            record.question_number.clone(),
            record.raw_question.clone(),
            record.choices.clone(),
            record.your_answer.clone(),
            record.correct_answer.clone(),
            record.confidence.to_string(),
            record.explanation.clone(),
            join_labels(&record.topics),
            record.question_type.as_str().to_string(),
            join_labels(&record.error_types),
            record.missed_clues.clone(),
            record.notes.clone(),
        ]));
    }

    csv
}
