use std::sync::Arc;

use quiz_core::model::{DailyActivity, UnitSummary, UserId};
use storage::repository::StudyLogRepository;

use crate::error::ReportError;
use crate::export::unit_summaries_csv;

/// Study reports built from a user's persisted logs.
#[derive(Clone)]
pub struct ReportService {
    study_logs: Arc<dyn StudyLogRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(study_logs: Arc<dyn StudyLogRepository>) -> Self {
        Self { study_logs }
    }

    /// One row per unit the user has studied, sorted by unit name.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if logs cannot be loaded.
    pub async fn unit_summaries(&self, user_id: UserId) -> Result<Vec<UnitSummary>, ReportError> {
        let logs = self.study_logs.logs_for_user(user_id).await?;
        let rows = UnitSummary::aggregate(&logs);
        tracing::debug!(user = %user_id, logs = logs.len(), units = rows.len(), "unit summaries built");
        Ok(rows)
    }

    /// Answers per UTC day, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Storage` if logs cannot be loaded.
    pub async fn daily_activity(&self, user_id: UserId) -> Result<Vec<DailyActivity>, ReportError> {
        let logs = self.study_logs.logs_for_user(user_id).await?;
        Ok(DailyActivity::aggregate(&logs))
    }

    /// Unit summaries rendered as a BOM-prefixed CSV document.
    ///
    /// # Errors
    ///
    /// Returns `ReportError` if logs cannot be loaded or the CSV cannot be written.
    pub async fn export_csv(&self, user_id: UserId) -> Result<Vec<u8>, ReportError> {
        let rows = self.unit_summaries(user_id).await?;
        let bytes = unit_summaries_csv(&rows)?;
        tracing::info!(user = %user_id, rows = rows.len(), bytes = bytes.len(), "csv export ready");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{QuestionId, StudyLog, UnitName};
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn log(user_id: UserId, unit: &str, correct: bool, days: i64) -> StudyLog {
        StudyLog {
            user_id,
            unit: UnitName::new(unit).unwrap(),
            question_id: QuestionId::new(1),
            correct,
            timed_out: false,
            answer_time_ms: 30_000,
            explanation_reviewed: false,
            suspicious: false,
            answered_at: fixed_now() + Duration::days(days),
        }
    }

    async fn service(logs: &[StudyLog]) -> ReportService {
        let repo = InMemoryRepository::new();
        for entry in logs {
            repo.append_log(entry).await.unwrap();
        }
        ReportService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn summaries_only_cover_the_requested_user() {
        let alice = UserId::random();
        let bob = UserId::random();
        let svc = service(&[
            log(alice, "Geography", true, 0),
            log(alice, "Fractions", false, 1),
            log(alice, "Fractions", true, 2),
            log(bob, "History", true, 0),
        ])
        .await;

        let rows = svc.unit_summaries(alice).await.unwrap();
        let units: Vec<&str> = rows.iter().map(|r| r.unit.as_str()).collect();
        assert_eq!(units, vec!["Fractions", "Geography"]);
        assert_eq!(rows[0].accuracy, 50);
        assert_eq!(rows[0].total_answer_time, 60);

        let days = svc.daily_activity(alice).await.unwrap();
        assert_eq!(days.len(), 3);
    }

    #[tokio::test]
    async fn export_contains_one_line_per_unit() {
        let user = UserId::random();
        let svc = service(&[log(user, "Fractions", true, 0), log(user, "Geography", true, 0)]).await;

        let bytes = svc.export_csv(user).await.unwrap();
        let body = std::str::from_utf8(&bytes[3..]).unwrap();
        assert_eq!(body.lines().count(), 3);
        assert!(body.contains("Fractions,100,◎,1,1,1,"));
    }

    #[tokio::test]
    async fn user_without_logs_gets_header_only() {
        let svc = service(&[]).await;
        let bytes = svc.export_csv(UserId::random()).await.unwrap();
        assert_eq!(std::str::from_utf8(&bytes[3..]).unwrap().lines().count(), 1);
        assert!(svc.unit_summaries(UserId::random()).await.unwrap().is_empty());
    }
}
