use serde::{Deserialize, Serialize};

use super::attempt::AttemptRecord;
use super::labels::{ErrorType, Topic};

/// Dashboard summary over the full attempt history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total: usize,
    /// Records that could be graded (at least one answer present, see
    /// [`AttemptRecord::is_correct`]). Only these count towards accuracy.
    pub graded: usize,
    /// `None` when nothing could be graded.
    pub accuracy: Option<f64>,
    pub recent_accuracy: Option<f64>,
    pub topic_perf: Vec<TopicPerf>,
    pub error_counts: Vec<ErrorTypeCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicPerf {
    pub topic: Topic,
    pub count: usize,
    /// `None` when every record for the topic is ungraded.
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTypeCount {
    pub error_type: ErrorType,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: StatsSummary,
    pub recent_entries: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}
