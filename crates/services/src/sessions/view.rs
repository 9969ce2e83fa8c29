use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use quiz_core::model::{QuizResult, UnitName, UserId};
use storage::repository::{QuizResultId, QuizResultRepository, QuizResultRow};

use crate::Clock;
use crate::error::SessionError;

/// Presentation-agnostic list item for a finished quiz.
///
/// No pre-formatted strings; the caller formats timestamps and percentages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QuizResultListItem {
    pub id: QuizResultId,
    pub completed_at: DateTime<Utc>,
    pub units: Vec<UnitName>,
    pub total: u32,
    pub correct: u32,
    pub final_percent: u32,
}

impl QuizResultListItem {
    #[must_use]
    pub fn from_row(row: &QuizResultRow) -> Self {
        let result = &row.result;
        Self {
            id: row.id,
            completed_at: result.completed_at(),
            units: result.units().to_vec(),
            total: result.total(),
            correct: result.correct(),
            final_percent: result.final_percent(),
        }
    }
}

/// Read side of persisted quiz results.
#[derive(Clone)]
pub struct QuizResultService {
    clock: Clock,
    results: Arc<dyn QuizResultRepository>,
}

impl QuizResultService {
    #[must_use]
    pub fn new(clock: Clock, results: Arc<dyn QuizResultRepository>) -> Self {
        Self { clock, results }
    }

    /// Results of a user completed within the last `days`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent_results(
        &self,
        user_id: UserId,
        days: i64,
        limit: u32,
    ) -> Result<Vec<QuizResultListItem>, SessionError> {
        let since = self.clock.now() - Duration::days(days.max(0));
        let rows = self.results.list_recent_results(user_id, limit).await?;
        Ok(rows
            .iter()
            .filter(|row| row.result.completed_at() >= since)
            .map(QuizResultListItem::from_row)
            .collect())
    }

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when repository access fails.
    pub async fn get_result(&self, id: QuizResultId) -> Result<QuizResult, SessionError> {
        Ok(self.results.get_result(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::ScoreReport;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn result(user_id: UserId, completed_at: DateTime<Utc>) -> QuizResult {
        let score = ScoreReport {
            total: 4,
            correct: 3,
            raw_percent: 75,
            hint_penalty_percent: 7,
            final_percent: 68,
            mistakes: Vec::new(),
        };
        QuizResult::from_score(
            user_id,
            vec![UnitName::new("Fractions").unwrap()],
            completed_at - Duration::minutes(5),
            completed_at,
            &score,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_recent_results_filters_by_range() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let now = fixed_now();

        let recent = repo
            .append_result(&result(user, now - Duration::days(1)))
            .await
            .unwrap();
        repo.append_result(&result(user, now - Duration::days(10)))
            .await
            .unwrap();

        let svc = QuizResultService::new(Clock::fixed(now), Arc::new(repo));
        let items = svc.list_recent_results(user, 7, 10).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, recent);
        assert_eq!(items[0].final_percent, 68);
        assert_eq!(items[0].units[0].as_str(), "Fractions");

        let fetched = svc.get_result(recent).await.unwrap();
        assert_eq!(fetched.correct(), 3);
    }
}
