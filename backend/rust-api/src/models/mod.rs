pub mod attempt;
pub mod classification;
pub mod labels;
pub mod practice;
pub mod stats;

pub use attempt::{AttemptFilter, AttemptRecord, AttemptSource, LogAttemptRequest, NewAttempt};
pub use classification::{Classification, ClassifyRequest, TopicScore};
pub use labels::{ErrorType, QuestionType, Topic};
pub use stats::{ErrorTypeCount, StatsSummary, TopicPerf};
