use quiz_core::model::{StudyLog, UserId};

use super::{
    SqliteRepository,
    mapping::{id_i64, map_study_log_row},
};
use crate::repository::{StorageError, StudyLogRepository};

#[async_trait::async_trait]
impl StudyLogRepository for SqliteRepository {
    async fn append_log(&self, log: &StudyLog) -> Result<i64, StorageError> {
        let question_id = id_i64("question_id", log.question_id.value())?;
        let answer_time_ms = id_i64("answer_time_ms", log.answer_time_ms)?;

        let res = sqlx::query(
            r"
                INSERT INTO study_logs (
                    user_id, unit, question_id, correct, timed_out,
                    answer_time_ms, explanation_reviewed, suspicious, answered_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(log.user_id.to_string())
        .bind(log.unit.as_str())
        .bind(question_id)
        .bind(log.correct)
        .bind(log.timed_out)
        .bind(answer_time_ms)
        .bind(log.explanation_reviewed)
        .bind(log.suspicious)
        .bind(log.answered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn logs_for_user(&self, user_id: UserId) -> Result<Vec<StudyLog>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    user_id, unit, question_id, correct, timed_out,
                    answer_time_ms, explanation_reviewed, suspicious, answered_at
                FROM study_logs
                WHERE user_id = ?1
                ORDER BY answered_at ASC, id ASC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_study_log_row).collect()
    }
}
