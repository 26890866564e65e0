//! Keyword/regex tables behind the classifier.
//!
//! Every trigger pattern lives here, in one versioned structure compiled once
//! at first use. Patterns are written against lowercased text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::labels::{ErrorType, QuestionType, Topic};

pub const RULES_VERSION: &str = "2025.2";

/// Ordered by priority: the first question type with a matching trigger wins.
const QUESTION_TYPE_TABLE: &[(QuestionType, &[&str])] = &[
    (
        QuestionType::Diagnosis,
        &[
            r"most likely diagnosis",
            r"what is the diagnosis",
            r"etiology",
            r"cause of",
        ],
    ),
    (
        QuestionType::Management,
        &[
            r"next best step",
            r"initial management",
            r"most appropriate management",
            r"no further (testing|workup|work-up|evaluation) (is )?(necessary|needed|required|indicated)",
            r"treatment",
            r"therapy",
        ],
    ),
    (
        QuestionType::Workup,
        &[
            r"next test",
            r"most appropriate test",
            r"diagnostic step",
            r"screening",
            r"evaluation",
        ],
    ),
    (
        QuestionType::Interpretation,
        &[
            r"interpret the (ecg|abg|cxr|labs)",
            r"most likely finding",
            r"what does this (lab|image) indicate",
        ],
    ),
    (
        QuestionType::Mechanism,
        &[
            r"mechanism",
            r"pathophysiology",
            r"pharmacodynamics",
            r"\bmoa\b",
            r"mechanism of action",
        ],
    ),
];

/// Looser cues consulted only when the table above finds nothing.
const QUESTION_TYPE_FALLBACKS: &[(QuestionType, &[&str])] = &[
    (
        QuestionType::Management,
        &[r"next (best )?step|initial management|treatment"],
    ),
    (QuestionType::Diagnosis, &[r"diagnosis|etiology|cause"]),
];

const TOPIC_TABLE: &[(Topic, &[&str])] = &[
    (
        Topic::Cardiology,
        &[
            r"\bn?stemi\b",
            r"\bheart failure\b",
            r"\bchf\b",
            r"\b(afib|atrial fibrillation)\b",
            r"\bvalv(e|ular)",
            r"\bjvp\b",
            r"\bmurmur",
        ],
    ),
    (
        Topic::Pulmonology,
        &[
            r"\basthma",
            r"\bcopd\b",
            r"\bpneumonia\b",
            r"\bpe\b",
            r"\bpulmonary embol",
            r"\bpneumothorax\b",
            r"\bpleural\b",
        ],
    ),
    (
        Topic::Nephrology,
        &[
            r"\bckd\b",
            r"\baki\b",
            r"\bhyperkalemi",
            r"\bhyponatremi",
            r"\bbicarb",
            r"\bmetabolic acidosis\b",
            r"\bdiuretic",
            r"\bdialysis\b",
            r"\brenal\b",
            r"\bkidney",
            r"\bedema\b",
        ],
    ),
    (
        Topic::Endocrine,
        &[
            r"\bthyroid",
            r"\bgraves",
            r"\bhashimoto",
            r"\bdka\b",
            r"\bhhs\b",
            r"\badrenal",
            r"\bcortisol",
        ],
    ),
    (
        Topic::Gastroenterology,
        &[
            r"\bcirrhosis\b",
            r"\bulcer",
            r"\bgi bleed",
            r"\bibs\b",
            r"\bibd\b",
            r"\bpancreatitis\b",
            r"\bbilirubin\b",
            r"\bdefecation\b",
            r"\b(diarrhea|constipation)\b",
        ],
    ),
    (
        Topic::InfectiousDisease,
        &[
            r"\bsepsis\b",
            r"\bmeningitis\b",
            r"\bendocarditis\b",
            r"\bmrsa\b",
            r"\bpseudomonas\b",
            r"\bhiv\b",
            r"\bc\.? ?diff",
        ],
    ),
    (
        Topic::HemeOnc,
        &[
            r"\banemi",
            r"\bleukemi",
            r"\blymphoma",
            r"\bmultiple myeloma\b",
            r"\bplatelet",
            r"\btransfusion",
        ],
    ),
    (
        Topic::Obgyn,
        &[
            r"\bpregnan",
            r"\bpre-?eclampsia\b",
            r"\bpostpartum\b",
            r"\bectopic\b",
            r"\bstis?\b",
            r"\bpid\b",
        ],
    ),
    (
        Topic::Pediatrics,
        &[
            r"\bchild",
            r"\binfant",
            r"\bvaccin",
            r"\bbronchiolitis\b",
            r"\brsv\b",
            r"\botitis\b",
        ],
    ),
    (
        Topic::Psych,
        &[
            r"\bdepress",
            r"\bmani(a|c)\b",
            r"\bbipolar\b",
            r"\bschizo",
            r"\banxi(ety|ous)\b",
            r"\bocd\b",
            r"\bptsd\b",
        ],
    ),
    (
        Topic::SurgeryAcute,
        &[
            r"\btrauma",
            r"\bappendicitis\b",
            r"\bcholecystitis\b",
            r"\bbowel obstruction\b",
            r"\bperitonitis\b",
        ],
    ),
];

/// Nephrology is awarded only when one of these explicit lab/marker terms is
/// present alongside a Nephrology seed.
const NEPHROLOGY_GATE: &[&str] = &[
    r"\b(ckd|aki|e?gfr|bun|creatinine|proteinuria|albuminuria|hematuria)\b",
    r"\b(hyper|hypo)(kalemi|natremi)\w*",
    r"\bbicarb\w*|\banion gap\b|\bmetabolic (acidosis|alkalosis)\b",
    r"\bnephr(otic|itic)\b|\bglomerul\w*",
];

/// Unambiguous cues that fix the topic to Gastroenterology alone.
const GASTRO_OVERRIDE: &[&str] = &[
    r"\birritable bowel\b",
    r"\bibs\b",
    r"\b(improves?|improved|relieved|better) (after|with|by) defecation\b",
    r"\brome (iv|criteria)\b",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    Stem,
    Explanation,
    StemAndExplanation,
}

/// Trigger text for each error-type rule. Rules are independent and additive.
const ERROR_RULE_TABLE: &[(RuleScope, bool, &str, &[ErrorType])] = &[
    (
        RuleScope::Explanation,
        true,
        r"first[- ]line|initial (therapy|management)|standard of care",
        &[ErrorType::ContentGap, ErrorType::PrioritySequence],
    ),
    (
        RuleScope::StemAndExplanation,
        false,
        r"\b(ecg|ekg|cxr|ct|mri|abg|pft)s?\b|\bspirom",
        &[ErrorType::Interpretation],
    ),
    (
        RuleScope::Stem,
        false,
        r"\b(always|never|except|most|least)\b",
        &[ErrorType::LanguageTrap],
    ),
    (
        RuleScope::Explanation,
        false,
        r"\banion gap\b|\bosmol(ar|al)ity\b|\bdos(e|es|ing)\b|\bunits?\b|\brates?\b|\bfractional excretion\b|\bclearance\b",
        &[ErrorType::MathUnits],
    ),
];

/// Default when no error rule fires.
pub const DEFAULT_ERROR_TYPE: ErrorType = ErrorType::ContentGap;

/// Compiled alternatives for one label.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    fn compile(sources: &[&str]) -> Result<Self, regex::Error> {
        let patterns = sources
            .iter()
            .map(|s| Regex::new(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }

    /// Number of distinct patterns that match.
    pub fn hits(&self, text: &str) -> usize {
        self.patterns.iter().filter(|p| p.is_match(text)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ErrorRule {
    pub scope: RuleScope,
    /// Fires only when both answers are present and differ.
    pub requires_mismatch: bool,
    pub pattern: Regex,
    pub labels: &'static [ErrorType],
}

#[derive(Debug, Clone)]
pub struct RuleBook {
    pub version: &'static str,
    pub question_types: Vec<(QuestionType, PatternSet)>,
    pub question_type_fallbacks: Vec<(QuestionType, PatternSet)>,
    pub default_question_type: QuestionType,
    pub topics: Vec<(Topic, PatternSet)>,
    pub nephrology_gate: PatternSet,
    pub gastro_override: PatternSet,
    pub error_rules: Vec<ErrorRule>,
}

impl RuleBook {
    /// Compiles the built-in tables.
    pub fn compile() -> Result<Self, regex::Error> {
        let topics = TOPIC_TABLE
            .iter()
            .map(|(topic, sources)| Ok((*topic, PatternSet::compile(sources)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        let error_rules = ERROR_RULE_TABLE
            .iter()
            .map(|(scope, requires_mismatch, source, labels)| {
                Ok(ErrorRule {
                    scope: *scope,
                    requires_mismatch: *requires_mismatch,
                    pattern: Regex::new(source)?,
                    labels: *labels,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            version: RULES_VERSION,
            question_types: compile_question_types(QUESTION_TYPE_TABLE)?,
            question_type_fallbacks: compile_question_types(QUESTION_TYPE_FALLBACKS)?,
            default_question_type: QuestionType::Management,
            topics,
            nephrology_gate: PatternSet::compile(NEPHROLOGY_GATE)?,
            gastro_override: PatternSet::compile(GASTRO_OVERRIDE)?,
            error_rules,
        })
    }

    pub fn topic_patterns(&self, topic: Topic) -> Option<&PatternSet> {
        self.topics
            .iter()
            .find(|(t, _)| *t == topic)
            .map(|(_, set)| set)
    }
}

fn compile_question_types(
    table: &[(QuestionType, &[&str])],
) -> Result<Vec<(QuestionType, PatternSet)>, regex::Error> {
    table
        .iter()
        .map(|(label, sources)| Ok((*label, PatternSet::compile(sources)?)))
        .collect()
}

lazy_static! {
    /// Process-wide rule book, compiled on first use.
    pub static ref DEFAULT_RULES: RuleBook =
        RuleBook::compile().expect("built-in classification rules must compile");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_compile() {
        let rules = RuleBook::compile().unwrap();
        assert_eq!(rules.version, RULES_VERSION);
        assert_eq!(rules.question_types.len(), QuestionType::ALL.len());
        assert_eq!(rules.error_rules.len(), 4);
    }

    #[test]
    fn every_topic_except_fallback_has_seeds() {
        for topic in Topic::ALL {
            let seeds = DEFAULT_RULES.topic_patterns(topic);
            if topic == Topic::FALLBACK {
                assert!(seeds.is_none());
            } else {
                assert!(!seeds.unwrap().is_empty(), "{} has no seeds", topic);
            }
        }
    }

    #[test]
    fn short_seeds_respect_word_boundaries() {
        let pulm = DEFAULT_RULES.topic_patterns(Topic::Pulmonology).unwrap();
        assert!(!pulm.is_match("symptoms improve after eating pepper"));
        assert!(pulm.is_match("suspected pe on ct angiography"));
    }

    #[test]
    fn gate_requires_explicit_markers() {
        assert!(!DEFAULT_RULES.nephrology_gate.is_match("on dialysis three times weekly"));
        assert!(DEFAULT_RULES.nephrology_gate.is_match("ckd stage 3"));
        assert!(DEFAULT_RULES.nephrology_gate.is_match("serum creatinine 2.4"));
    }

    #[test]
    fn hits_counts_distinct_patterns() {
        let cardio = DEFAULT_RULES.topic_patterns(Topic::Cardiology).unwrap();
        assert_eq!(cardio.hits("chf with new murmur and elevated jvp"), 3);
    }
}
