use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{QuestionId, UserId};
use crate::model::unit::UnitName;

/// Answers confirmed faster than this after the question appeared are flagged.
pub const SUSPICIOUS_ANSWER_MS: u64 = 1_500;

/// Record of one answered question, as persisted for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLog {
    pub user_id: UserId,
    pub unit: UnitName,
    pub question_id: QuestionId,
    /// First-try correctness: false once the question was answered wrong in the session.
    pub correct: bool,
    pub timed_out: bool,
    /// Milliseconds from presentation to the accepted answer.
    pub answer_time_ms: u64,
    pub explanation_reviewed: bool,
    pub suspicious: bool,
    pub answered_at: DateTime<Utc>,
}

impl StudyLog {
    #[must_use]
    pub fn is_suspicious_latency(answer_time_ms: u64) -> bool {
        answer_time_ms < SUSPICIOUS_ANSWER_MS
    }
}
