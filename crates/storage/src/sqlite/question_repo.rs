use quiz_core::model::{Question, UnitName};
use sqlx::Row;

use super::{
    SqliteRepository,
    mapping::{id_i64, map_question_row, question_columns, ser},
};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let id = id_i64("question_id", question.id().value())?;
        let (choices, accepted) = question_columns(question)?;

        sqlx::query(
            r"
                INSERT INTO questions (id, unit, kind, prompt, choices, accepted, explanation)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    unit = excluded.unit,
                    kind = excluded.kind,
                    prompt = excluded.prompt,
                    choices = excluded.choices,
                    accepted = excluded.accepted,
                    explanation = excluded.explanation
            ",
        )
        .bind(id)
        .bind(question.unit().as_str())
        .bind(question.question_type().as_str())
        .bind(question.prompt())
        .bind(choices)
        .bind(accepted)
        .bind(question.explanation())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, unit, kind, prompt, choices, accepted, explanation
                FROM questions
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_question_row).collect()
    }

    async fn list_units(&self) -> Result<Vec<UnitName>, StorageError> {
        let rows = sqlx::query("SELECT DISTINCT unit FROM questions ORDER BY unit ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("unit").map_err(ser)?;
                UnitName::new(raw).map_err(ser)
            })
            .collect()
    }
}
