use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;
use crate::model::score::ScoreReport;
use crate::model::unit::UnitName;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct count ({correct}) exceeds total ({total})")]
    CountMismatch { total: u32, correct: u32 },

    #[error("percentage out of range: {0}")]
    InvalidPercent(u32),
}

/// Outcome of a completed quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    user_id: UserId,
    units: Vec<UnitName>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: u32,
    correct: u32,
    raw_percent: u32,
    hint_penalty_percent: u32,
    final_percent: u32,
}

impl QuizResult {
    /// Build a result from a session score.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_score(
        user_id: UserId,
        units: Vec<UnitName>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        score: &ScoreReport,
    ) -> Result<Self, QuizResultError> {
        Self::from_persisted(
            user_id,
            units,
            started_at,
            completed_at,
            score.total,
            score.correct,
            score.raw_percent,
            score.hint_penalty_percent,
            score.final_percent,
        )
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError` if timestamps, counts or percentages are inconsistent.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user_id: UserId,
        units: Vec<UnitName>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total: u32,
        correct: u32,
        raw_percent: u32,
        hint_penalty_percent: u32,
        final_percent: u32,
    ) -> Result<Self, QuizResultError> {
        if completed_at < started_at {
            return Err(QuizResultError::InvalidTimeRange);
        }
        if correct > total {
            return Err(QuizResultError::CountMismatch { total, correct });
        }
        for value in [raw_percent, final_percent] {
            if value > 100 {
                return Err(QuizResultError::InvalidPercent(value));
            }
        }

        Ok(Self {
            user_id,
            units,
            started_at,
            completed_at,
            total,
            correct,
            raw_percent,
            hint_penalty_percent,
            final_percent,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn units(&self) -> &[UnitName] {
        &self.units
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn raw_percent(&self) -> u32 {
        self.raw_percent
    }

    #[must_use]
    pub fn hint_penalty_percent(&self) -> u32 {
        self.hint_penalty_percent
    }

    #[must_use]
    pub fn final_percent(&self) -> u32 {
        self.final_percent
    }
}
