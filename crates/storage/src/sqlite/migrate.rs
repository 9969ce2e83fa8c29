use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates the question catalog, study logs, quiz results and their indexes.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if is_applied(pool, 1).await? {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY,
                unit TEXT NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('multiple-choice', 'input')),
                prompt TEXT NOT NULL,
                choices TEXT NOT NULL,
                accepted TEXT NOT NULL,
                explanation TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS study_logs (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                unit TEXT NOT NULL,
                question_id INTEGER NOT NULL,
                correct INTEGER NOT NULL CHECK (correct IN (0, 1)),
                timed_out INTEGER NOT NULL CHECK (timed_out IN (0, 1)),
                answer_time_ms INTEGER NOT NULL CHECK (answer_time_ms >= 0),
                explanation_reviewed INTEGER NOT NULL CHECK (explanation_reviewed IN (0, 1)),
                suspicious INTEGER NOT NULL CHECK (suspicious IN (0, 1)),
                answered_at TEXT NOT NULL
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS quiz_results (
                id INTEGER PRIMARY KEY,
                user_id TEXT NOT NULL,
                units TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT NOT NULL,
                total INTEGER NOT NULL CHECK (total >= 0),
                correct INTEGER NOT NULL CHECK (correct >= 0),
                raw_percent INTEGER NOT NULL CHECK (raw_percent BETWEEN 0 AND 100),
                hint_penalty_percent INTEGER NOT NULL CHECK (hint_penalty_percent >= 0),
                final_percent INTEGER NOT NULL CHECK (final_percent BETWEEN 0 AND 100)
            );
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_questions_unit
                ON questions (unit, id);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_study_logs_user_answered_at
                ON study_logs (user_id, answered_at);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            CREATE INDEX IF NOT EXISTS idx_quiz_results_user_completed
                ON quiz_results (user_id, completed_at);
        ",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(1_i64)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(version = 1, "sqlite schema migrated");

    Ok(())
}
