//! Keyword-driven label suggestions for a pasted question.
//!
//! Every function here is pure and total: the same text always yields the same
//! labels and nothing can fail.

use crate::models::classification::{Classification, TopicScore};
use crate::models::labels::{ErrorType, QuestionType, Topic};
use crate::services::rulebook::{RuleBook, RuleScope, DEFAULT_ERROR_TYPE, DEFAULT_RULES};

#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    rules: &'a RuleBook,
}

impl Default for Classifier<'static> {
    fn default() -> Self {
        Self {
            rules: &DEFAULT_RULES,
        }
    }
}

impl<'a> Classifier<'a> {
    pub fn guess_question_type(&self, text: &str) -> QuestionType {
        let t = text.to_lowercase();

        let table_hit = self
            .rules
            .question_types
            .iter()
            .chain(self.rules.question_type_fallbacks.iter())
            .find(|(_, triggers)| triggers.is_match(&t))
            .map(|(label, _)| *label);

        table_hit.unwrap_or(self.rules.default_question_type)
    }

    /// Topics whose seeds match, in table order. Never empty.
    pub fn guess_topics(&self, text: &str) -> Vec<Topic> {
        self.rank(text, false)
            .into_iter()
            .map(|score| score.topic)
            .collect()
    }

    /// Matched topics ranked by the number of distinct seed hits, ties kept in
    /// table order. Never empty.
    pub fn rank_topics(&self, text: &str) -> Vec<TopicScore> {
        self.rank(text, true)
    }

    /// Top two ranked topics.
    pub fn primary_secondary(&self, text: &str) -> (Topic, Option<Topic>) {
        let ranked = self.rank_topics(text);
        let primary = ranked.first().map(|s| s.topic).unwrap_or(Topic::FALLBACK);
        let secondary = ranked.get(1).map(|s| s.topic);
        (primary, secondary)
    }

    fn rank(&self, text: &str, by_hits: bool) -> Vec<TopicScore> {
        let t = text.to_lowercase();

        if self.rules.gastro_override.is_match(&t) {
            return vec![TopicScore {
                topic: Topic::Gastroenterology,
                hits: self.rules.gastro_override.hits(&t),
            }];
        }

        let mut scores: Vec<TopicScore> = self
            .rules
            .topics
            .iter()
            .filter_map(|(topic, seeds)| {
                let hits = seeds.hits(&t);
                (hits > 0 && self.passes_gate(*topic, &t)).then_some(TopicScore {
                    topic: *topic,
                    hits,
                })
            })
            .collect();

        if scores.is_empty() {
            return vec![TopicScore {
                topic: Topic::FALLBACK,
                hits: 0,
            }];
        }

        if by_hits {
            scores.sort_by(|a, b| b.hits.cmp(&a.hits));
        }
        scores
    }

    fn passes_gate(&self, topic: Topic, lowered: &str) -> bool {
        match topic {
            Topic::Nephrology => self.rules.nephrology_gate.is_match(lowered),
            _ => true,
        }
    }

    /// Likely reasons for a miss. Deduplicated, sorted by label, never empty.
    pub fn suggest_error_types(
        &self,
        your_answer: &str,
        correct_answer: &str,
        stem: &str,
        explanation: &str,
    ) -> Vec<ErrorType> {
        let yours = your_answer.trim().to_lowercase();
        let correct = correct_answer.trim().to_lowercase();
        let mismatch = !yours.is_empty() && !correct.is_empty() && yours != correct;

        let stem = stem.to_lowercase();
        let explanation = explanation.to_lowercase();
        let combined = format!("{} {}", stem, explanation);

        let mut suggested: Vec<ErrorType> = Vec::new();
        for rule in &self.rules.error_rules {
            if rule.requires_mismatch && !mismatch {
                continue;
            }
            let haystack = match rule.scope {
                RuleScope::Stem => &stem,
                RuleScope::Explanation => &explanation,
                RuleScope::StemAndExplanation => &combined,
            };
            if rule.pattern.is_match(haystack) {
                suggested.extend_from_slice(rule.labels);
            }
        }

        if suggested.is_empty() {
            suggested.push(DEFAULT_ERROR_TYPE);
        }
        suggested.sort_by_key(|e| e.as_str());
        suggested.dedup();
        suggested
    }

    /// Runs every suggestion over stem + explanation.
    pub fn classify(
        &self,
        stem: &str,
        explanation: &str,
        your_answer: &str,
        correct_answer: &str,
    ) -> Classification {
        let text = format!("{}\n{}", stem, explanation);
        let (primary_topic, secondary_topic) = self.primary_secondary(&text);
        Classification {
            question_type: self.guess_question_type(&text),
            topics: self.guess_topics(&text),
            error_types: self.suggest_error_types(your_answer, correct_answer, stem, explanation),
            primary_topic,
            secondary_topic,
        }
    }
}

pub fn guess_question_type(text: &str) -> QuestionType {
    Classifier::default().guess_question_type(text)
}

pub fn guess_topics(text: &str) -> Vec<Topic> {
    Classifier::default().guess_topics(text)
}

pub fn suggest_error_types(
    your_answer: &str,
    correct_answer: &str,
    stem: &str,
    explanation: &str,
) -> Vec<ErrorType> {
    Classifier::default().suggest_error_types(your_answer, correct_answer, stem, explanation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IBS_STEM: &str = "A 28-year-old woman has 8 months of intermittent crampy lower \
        abdominal pain. The pain improves after defecation. She has no weight loss.";
    const IBS_EXPLANATION: &str = "Symptoms meet Rome IV criteria for IBS. No further testing \
        necessary; reassurance and dietary changes are first-line.";

    #[test]
    fn first_matching_table_entry_wins() {
        assert_eq!(
            guess_question_type("What is the most likely diagnosis? Start treatment."),
            QuestionType::Diagnosis
        );
        assert_eq!(
            guess_question_type("Which is the most appropriate test to order?"),
            QuestionType::Workup
        );
        assert_eq!(
            guess_question_type("Interpret the ECG shown"),
            QuestionType::Interpretation
        );
        assert_eq!(
            guess_question_type("What is the MOA of this drug?"),
            QuestionType::Mechanism
        );
    }

    #[test]
    fn fallback_heuristics_and_default() {
        assert_eq!(
            guess_question_type("What is the next step?"),
            QuestionType::Management
        );
        assert_eq!(
            guess_question_type("The likely cause is a virus"),
            QuestionType::Diagnosis
        );
        assert_eq!(guess_question_type(""), QuestionType::Management);
        assert_eq!(guess_question_type("lorem ipsum"), QuestionType::Management);
    }

    #[test]
    fn topics_fall_back_to_general() {
        assert_eq!(guess_topics(""), vec![Topic::GeneralIm]);
        assert_eq!(guess_topics("nothing relevant here"), vec![Topic::GeneralIm]);
    }

    #[test]
    fn multiple_topics_keep_table_order() {
        assert_eq!(
            guess_topics("Pregnant patient with new murmur and anxiety"),
            vec![Topic::Cardiology, Topic::Obgyn, Topic::Psych]
        );
    }

    #[test]
    fn nephrology_gate() {
        assert!(!guess_topics("Patient on dialysis").contains(&Topic::Nephrology));
        assert!(guess_topics("CKD with worsening edema").contains(&Topic::Nephrology));
        assert!(!guess_topics("bilateral leg edema").contains(&Topic::Nephrology));
    }

    #[test]
    fn gastro_override_short_circuits() {
        assert_eq!(
            guess_topics("Irritable bowel in a pregnant woman with asthma and CKD"),
            vec![Topic::Gastroenterology]
        );
    }

    #[test]
    fn ranking_orders_by_hits() {
        let classifier = Classifier::default();
        let ranked =
            classifier.rank_topics("Pregnant woman with CHF, a new murmur and elevated JVP");
        assert_eq!(ranked[0].topic, Topic::Cardiology);
        assert_eq!(ranked[0].hits, 3);
        assert_eq!(ranked[1].topic, Topic::Obgyn);

        let (primary, secondary) = classifier.primary_secondary("no cues");
        assert_eq!(primary, Topic::GeneralIm);
        assert_eq!(secondary, None);
    }

    #[test]
    fn error_rules_are_additive() {
        let got = suggest_error_types(
            "B",
            "C",
            "Which is the most appropriate initial step? CXR shows infiltrate.",
            "Standard of care is first-line antibiotics at a weight-based dose.",
        );
        assert_eq!(
            got,
            vec![
                ErrorType::ContentGap,
                ErrorType::Interpretation,
                ErrorType::MathUnits,
                ErrorType::LanguageTrap,
                ErrorType::PrioritySequence,
            ]
        );
    }

    #[test]
    fn mismatch_gate_needs_both_answers() {
        let got = suggest_error_types("", "C", "stem", "first-line therapy is x");
        assert_eq!(got, vec![ErrorType::ContentGap]);
        let got = suggest_error_types("c", " C ", "stem", "first-line therapy is x");
        assert_eq!(got, vec![ErrorType::ContentGap]);
    }

    #[test]
    fn ibs_scenario() {
        assert_eq!(guess_topics(IBS_STEM), vec![Topic::Gastroenterology]);
        let text = format!("{}\n{}", IBS_STEM, IBS_EXPLANATION);
        assert_eq!(guess_question_type(&text), QuestionType::Management);
        assert_eq!(
            suggest_error_types("D", "D", IBS_STEM, IBS_EXPLANATION),
            vec![ErrorType::ContentGap]
        );
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = Classifier::default();
        let a = classifier.classify(IBS_STEM, IBS_EXPLANATION, "A", "D");
        let b = classifier.classify(IBS_STEM, IBS_EXPLANATION, "A", "D");
        assert_eq!(a, b);
        assert_eq!(a.primary_topic, Topic::Gastroenterology);
    }

    #[test]
    fn seeds_match_whole_words_only() {
        // "pid" in lipid, "pe" in type, "sti" in question
        assert_eq!(guess_topics("Rapid lipid panel"), vec![Topic::GeneralIm]);
        assert_eq!(
            guess_topics("Which question type fits this presentation?"),
            vec![Topic::GeneralIm]
        );
        assert_eq!(guess_topics("Suspected PE"), vec![Topic::Pulmonology]);
        assert_eq!(guess_topics("Screen for STIs"), vec![Topic::Obgyn]);
    }

    #[test]
    fn error_cues_match_whole_words_only() {
        // "most" in almost, "rate" in moderate, "ct" in infarction
        assert_eq!(
            suggest_error_types("A", "A", "She almost fainted", "Moderate disease"),
            vec![ErrorType::ContentGap]
        );
        assert_eq!(
            suggest_error_types("A", "A", "Acute infarction", ""),
            vec![ErrorType::ContentGap]
        );
        assert_eq!(
            suggest_error_types("A", "A", "Which is most likely?", "Order a CT"),
            vec![ErrorType::Interpretation, ErrorType::LanguageTrap]
        );
    }

    #[test]
    fn extended_seeds_cover_spelled_out_terms() {
        assert_eq!(guess_topics("Atrial fibrillation"), vec![Topic::Cardiology]);
        assert_eq!(guess_topics("Pulmonary embolism"), vec![Topic::Pulmonology]);
        assert_eq!(guess_topics("Chronic diarrhea"), vec![Topic::Gastroenterology]);
        assert_eq!(
            guess_topics("Renal failure with elevated creatinine"),
            vec![Topic::Nephrology]
        );
        assert_eq!(
            guess_question_type("No further testing is necessary."),
            QuestionType::Management
        );
    }
}
