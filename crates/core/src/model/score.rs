use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;

/// `round(100 * part / total)` with halves rounded up; 0 when `total` is 0.
#[must_use]
pub fn percent(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * part + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Post-quiz review entry for a question answered wrong at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeReview {
    pub question_id: QuestionId,
    pub prompt: String,
    pub first_wrong_answer: String,
    pub correct_answer: String,
    pub explanation: String,
}

/// Final score of a quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub total: u32,
    pub correct: u32,
    pub raw_percent: u32,
    pub hint_penalty_percent: u32,
    pub final_percent: u32,
    /// Mistaken questions in question-set order.
    pub mistakes: Vec<MistakeReview>,
}
