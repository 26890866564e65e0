use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::attempt::AttemptRecord;
use crate::models::labels::{ErrorType, Topic};
use crate::models::stats::{ErrorTypeCount, StatsSummary, TopicPerf};

pub const DEFAULT_RECENT_WINDOW: usize = 20;

#[derive(Default)]
struct Tally {
    count: usize,
    graded: usize,
    correct: usize,
}

impl Tally {
    fn add(&mut self, outcome: Option<bool>) {
        self.count += 1;
        if let Some(correct) = outcome {
            self.graded += 1;
            if correct {
                self.correct += 1;
            }
        }
    }

    /// `None` until at least one record could be graded.
    fn accuracy(&self) -> Option<f64> {
        (self.graded > 0).then(|| self.correct as f64 / self.graded as f64)
    }
}

/// Lower accuracy first; topics with nothing graded go last.
fn weakest_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Aggregates the full history. Records may arrive in any order; recency is
/// decided by id.
pub fn compute_stats(records: &[AttemptRecord], recent_window: usize) -> StatsSummary {
    if records.is_empty() {
        return StatsSummary::default();
    }

    let mut overall = Tally::default();
    let mut by_topic: HashMap<Topic, Tally> = HashMap::new();
    let mut by_error: HashMap<ErrorType, usize> = HashMap::new();

    for record in records {
        let outcome = record.is_correct();
        overall.add(outcome);
        for topic in &record.topics {
            by_topic.entry(*topic).or_default().add(outcome);
        }
        for error_type in &record.error_types {
            *by_error.entry(*error_type).or_default() += 1;
        }
    }

    let mut topic_perf: Vec<TopicPerf> = by_topic
        .into_iter()
        .map(|(topic, tally)| TopicPerf {
            topic,
            count: tally.count,
            accuracy: tally.accuracy(),
        })
        .collect();
    topic_perf.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(weakest_first(a.accuracy, b.accuracy))
            .then_with(|| a.topic.as_str().cmp(b.topic.as_str()))
    });

    let mut error_counts: Vec<ErrorTypeCount> = by_error
        .into_iter()
        .map(|(error_type, count)| ErrorTypeCount { error_type, count })
        .collect();
    error_counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.error_type.as_str().cmp(b.error_type.as_str()))
    });

    StatsSummary {
        total: overall.count,
        graded: overall.graded,
        accuracy: overall.accuracy(),
        recent_accuracy: recent_accuracy(records, recent_window),
        topic_perf,
        error_counts,
    }
}

/// Mean correctness over the `window` highest ids. `None` when that window
/// holds no gradable record.
pub fn recent_accuracy(records: &[AttemptRecord], window: usize) -> Option<f64> {
    let mut recent: Vec<&AttemptRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.id.cmp(&a.id));

    let mut tally = Tally::default();
    for record in recent.into_iter().take(window) {
        tally.add(record.is_correct());
    }

    tally.accuracy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attempt::{AttemptSource, NewAttempt};
    use crate::models::labels::QuestionType;
    use chrono::Utc;

    fn record(id: i64, yours: &str, correct: &str, topics: &[Topic]) -> AttemptRecord {
        NewAttempt {
            source: AttemptSource::UserPasted,
            question_bank: "NBME".into(),
            exam: "NBME 27".into(),
            question_number: id.to_string(),
            raw_question: "stem".into(),
            choices: String::new(),
            your_answer: yours.into(),
            correct_answer: correct.into(),
            confidence: 3,
            explanation: String::new(),
            topics: topics.to_vec(),
            question_type: QuestionType::Management,
            error_types: vec![ErrorType::ContentGap],
            missed_clues: String::new(),
            notes: String::new(),
        }
        .into_record(id, Utc::now())
    }

    #[test]
    fn empty_history_is_default() {
        let stats = compute_stats(&[], DEFAULT_RECENT_WINDOW);
        assert_eq!(stats, StatsSummary::default());
        assert_eq!(stats.recent_accuracy, None);
    }

    #[test]
    fn accuracy_is_k_over_n() {
        let records = vec![
            record(1, "A", "a", &[Topic::Cardiology]),
            record(2, "B", "C", &[Topic::Cardiology]),
            record(3, " d", "D ", &[Topic::Psych]),
            record(4, "E", "A", &[Topic::Psych]),
        ];
        let stats = compute_stats(&records, DEFAULT_RECENT_WINDOW);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.graded, 4);
        assert_eq!(stats.accuracy, Some(0.5));
        assert_eq!(stats.recent_accuracy, Some(0.5));
    }

    #[test]
    fn multi_topic_records_fan_out() {
        let records = vec![
            record(1, "A", "A", &[Topic::Cardiology, Topic::Nephrology]),
            record(2, "A", "B", &[Topic::Nephrology]),
        ];
        let stats = compute_stats(&records, DEFAULT_RECENT_WINDOW);
        assert_eq!(stats.topic_perf.len(), 2);
        assert_eq!(stats.topic_perf[0].topic, Topic::Nephrology);
        assert_eq!(stats.topic_perf[0].count, 2);
        assert_eq!(stats.topic_perf[0].accuracy, Some(0.5));
        assert_eq!(stats.topic_perf[1].topic, Topic::Cardiology);
        assert_eq!(stats.topic_perf[1].count, 1);
        assert_eq!(stats.error_counts[0].count, 2);
    }

    #[test]
    fn equal_counts_put_weakest_topic_first() {
        let records = vec![
            record(1, "A", "A", &[Topic::Cardiology]),
            record(2, "A", "B", &[Topic::Psych]),
            record(3, "A", "B", &[Topic::Endocrine]),
        ];
        let stats = compute_stats(&records, DEFAULT_RECENT_WINDOW);
        let order: Vec<Topic> = stats.topic_perf.iter().map(|t| t.topic).collect();
        assert_eq!(order, vec![Topic::Endocrine, Topic::Psych, Topic::Cardiology]);
    }

    #[test]
    fn ungraded_records_stay_out_of_accuracy() {
        let records = vec![
            record(1, "A", "A", &[Topic::Cardiology]),
            record(2, "", "", &[Topic::Cardiology]),
        ];
        let stats = compute_stats(&records, DEFAULT_RECENT_WINDOW);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.graded, 1);
        assert_eq!(stats.accuracy, Some(1.0));
        assert_eq!(stats.topic_perf[0].count, 2);
        assert_eq!(stats.topic_perf[0].accuracy, Some(1.0));
    }

    #[test]
    fn ungraded_topics_have_no_accuracy_and_sort_last() {
        let records = vec![
            record(1, "", "", &[Topic::Psych]),
            record(2, "A", "A", &[Topic::Cardiology]),
        ];
        let stats = compute_stats(&records, DEFAULT_RECENT_WINDOW);
        assert_eq!(stats.topic_perf[0].topic, Topic::Cardiology);
        assert_eq!(stats.topic_perf[0].accuracy, Some(1.0));
        assert_eq!(stats.topic_perf[1].topic, Topic::Psych);
        assert_eq!(stats.topic_perf[1].accuracy, None);
    }

    #[test]
    fn nothing_graded_means_no_accuracy() {
        let stats = compute_stats(&[record(1, " ", "", &[Topic::Psych])], DEFAULT_RECENT_WINDOW);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.graded, 0);
        assert_eq!(stats.accuracy, None);
        assert_eq!(stats.recent_accuracy, None);
    }

    #[test]
    fn recent_window_uses_highest_ids() {
        let mut records: Vec<AttemptRecord> =
            (1..=5).map(|id| record(id, "A", "B", &[])).collect();
        records.extend((6..=7).map(|id| record(id, "A", "A", &[])));
        records.reverse();

        assert_eq!(recent_accuracy(&records, 2), Some(1.0));
        assert_eq!(recent_accuracy(&records, 4), Some(0.5));
        assert_eq!(recent_accuracy(&[record(1, "", "", &[])], 20), None);
    }
}
