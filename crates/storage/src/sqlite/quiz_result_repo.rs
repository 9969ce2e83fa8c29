use quiz_core::model::{QuizResult, UserId};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{map_quiz_result_row, ser},
};
use crate::repository::{QuizResultId, QuizResultRepository, QuizResultRow, StorageError};

fn map_quiz_result_row_with_id(row: &sqlx::sqlite::SqliteRow) -> Result<QuizResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let result = map_quiz_result_row(row)?;
    Ok(QuizResultRow::new(id, result))
}

#[async_trait::async_trait]
impl QuizResultRepository for SqliteRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<QuizResultId, StorageError> {
        let units = serde_json::to_string(result.units()).map_err(ser)?;

        let res = sqlx::query(
            r"
                INSERT INTO quiz_results (
                    user_id, units, started_at, completed_at, total, correct,
                    raw_percent, hint_penalty_percent, final_percent
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(result.user_id().to_string())
        .bind(units)
        .bind(result.started_at())
        .bind(result.completed_at())
        .bind(i64::from(result.total()))
        .bind(i64::from(result.correct()))
        .bind(i64::from(result.raw_percent()))
        .bind(i64::from(result.hint_penalty_percent()))
        .bind(i64::from(result.final_percent()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: QuizResultId) -> Result<QuizResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    id, user_id, units, started_at, completed_at, total, correct,
                    raw_percent, hint_penalty_percent, final_percent
                FROM quiz_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let row = row.ok_or(StorageError::NotFound)?;
        map_quiz_result_row(&row)
    }

    async fn list_recent_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, units, started_at, completed_at, total, correct,
                    raw_percent, hint_penalty_percent, final_percent
                FROM quiz_results
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_quiz_result_row_with_id).collect()
    }
}
