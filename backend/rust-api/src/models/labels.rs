//! Closed label vocabularies shared by the classifier, the aggregator and the
//! storage boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} label: {value:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownLabel {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// What cognitive task a question poses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Diagnosis,
    #[default]
    Management,
    Workup,
    Interpretation,
    Mechanism,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Diagnosis,
        QuestionType::Management,
        QuestionType::Workup,
        QuestionType::Interpretation,
        QuestionType::Mechanism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Diagnosis => "diagnosis",
            QuestionType::Management => "management",
            QuestionType::Workup => "workup",
            QuestionType::Interpretation => "interpretation",
            QuestionType::Mechanism => "mechanism",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        QuestionType::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownLabel::new("question type", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    Cardiology,
    Pulmonology,
    Nephrology,
    Endocrine,
    Gastroenterology,
    #[serde(rename = "Infectious Dz")]
    InfectiousDisease,
    #[serde(rename = "Heme/Onc")]
    HemeOnc,
    #[serde(rename = "OBGYN")]
    Obgyn,
    Pediatrics,
    Psych,
    #[serde(rename = "Surgery/Acute")]
    SurgeryAcute,
    #[serde(rename = "General IM")]
    GeneralIm,
}

impl Topic {
    pub const ALL: [Topic; 12] = [
        Topic::Cardiology,
        Topic::Pulmonology,
        Topic::Nephrology,
        Topic::Endocrine,
        Topic::Gastroenterology,
        Topic::InfectiousDisease,
        Topic::HemeOnc,
        Topic::Obgyn,
        Topic::Pediatrics,
        Topic::Psych,
        Topic::SurgeryAcute,
        Topic::GeneralIm,
    ];

    /// Awarded when no seed keyword matches.
    pub const FALLBACK: Topic = Topic::GeneralIm;

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Cardiology => "Cardiology",
            Topic::Pulmonology => "Pulmonology",
            Topic::Nephrology => "Nephrology",
            Topic::Endocrine => "Endocrine",
            Topic::Gastroenterology => "Gastroenterology",
            Topic::InfectiousDisease => "Infectious Dz",
            Topic::HemeOnc => "Heme/Onc",
            Topic::Obgyn => "OBGYN",
            Topic::Pediatrics => "Pediatrics",
            Topic::Psych => "Psych",
            Topic::SurgeryAcute => "Surgery/Acute",
            Topic::GeneralIm => "General IM",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Topic::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownLabel::new("topic", s))
    }
}

/// Why the user likely answered incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "Content gap")]
    ContentGap,
    Interpretation,
    #[serde(rename = "NBME language trap")]
    LanguageTrap,
    #[serde(rename = "Priority/sequence")]
    PrioritySequence,
    #[serde(rename = "Risk/benefit")]
    RiskBenefit,
    #[serde(rename = "Premature closure")]
    PrematureClosure,
    #[serde(rename = "Math/units")]
    MathUnits,
}

impl ErrorType {
    pub const ALL: [ErrorType; 7] = [
        ErrorType::ContentGap,
        ErrorType::Interpretation,
        ErrorType::LanguageTrap,
        ErrorType::PrioritySequence,
        ErrorType::RiskBenefit,
        ErrorType::PrematureClosure,
        ErrorType::MathUnits,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::ContentGap => "Content gap",
            ErrorType::Interpretation => "Interpretation",
            ErrorType::LanguageTrap => "NBME language trap",
            ErrorType::PrioritySequence => "Priority/sequence",
            ErrorType::RiskBenefit => "Risk/benefit",
            ErrorType::PrematureClosure => "Premature closure",
            ErrorType::MathUnits => "Math/units",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorType {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ErrorType::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownLabel::new("error type", s))
    }
}

/// Labels parsed from a stored multi-value field, plus the fragments that did
/// not belong to the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabels<T> {
    pub labels: Vec<T>,
    pub rejected: Vec<String>,
}

/// Splits a stored label field into labels.
///
/// Accepts a JSON array (current format) or a comma-delimited string (legacy
/// rows). Empty fragments are ignored, duplicates collapse onto the first
/// occurrence and unknown fragments are reported in `rejected`.
pub fn parse_label_field<T>(raw: &str) -> ParsedLabels<T>
where
    T: FromStr + PartialEq,
{
    let trimmed = raw.trim();
    let fragments: Vec<String> = if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(values) => values,
            Err(_) => trimmed
                .trim_start_matches('[')
                .trim_end_matches(']')
                .split(',')
                .map(|s| s.trim().trim_matches('"').to_string())
                .collect(),
        }
    } else {
        trimmed.split(',').map(|s| s.to_string()).collect()
    };

    let mut labels = Vec::new();
    let mut rejected = Vec::new();
    for fragment in fragments {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        match fragment.parse::<T>() {
            Ok(label) => {
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            Err(_) => rejected.push(fragment.to_string()),
        }
    }

    ParsedLabels { labels, rejected }
}

/// Joins labels the way the export boundary presents them.
pub fn join_labels<T: fmt::Display>(labels: &[T]) -> String {
    labels
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
