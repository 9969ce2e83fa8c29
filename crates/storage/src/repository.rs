use async_trait::async_trait;
use quiz_core::model::{Question, QuestionId, QuizResult, StudyLog, UnitName, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage identifier of a persisted quiz result (`SQLite` row id).
pub type QuizResultId = i64;

/// A persisted quiz result together with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResultRow {
    pub id: QuizResultId,
    pub result: QuizResult,
}

impl QuizResultRow {
    #[must_use]
    pub fn new(id: QuizResultId, result: QuizResult) -> Self {
        Self { id, result }
    }
}

/// Read/write access to the question catalog.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or replace a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Full catalog ordered by question id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// Distinct units present in the catalog, sorted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_units(&self) -> Result<Vec<UnitName>, StorageError>;
}

/// Append-only log of answered questions.
#[async_trait]
pub trait StudyLogRepository: Send + Sync {
    /// Append a log entry and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the entry cannot be stored.
    async fn append_log(&self, log: &StudyLog) -> Result<i64, StorageError>;

    /// All logs of a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn logs_for_user(&self, user_id: UserId) -> Result<Vec<StudyLog>, StorageError>;
}

/// Finished quiz results.
#[async_trait]
pub trait QuizResultRepository: Send + Sync {
    /// Append a result and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &QuizResult) -> Result<QuizResultId, StorageError>;

    /// Fetch a result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    async fn get_result(&self, id: QuizResultId) -> Result<QuizResult, StorageError>;

    /// Most recent results of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend or decoding failures.
    async fn list_recent_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    logs: Arc<Mutex<Vec<StudyLog>>>,
    results: Arc<Mutex<HashMap<QuizResultId, QuizResult>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn list_units(&self) -> Result<Vec<UnitName>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let mut units: Vec<UnitName> = guard.values().map(|q| q.unit().clone()).collect();
        units.sort();
        units.dedup();
        Ok(units)
    }
}

#[async_trait]
impl StudyLogRepository for InMemoryRepository {
    async fn append_log(&self, log: &StudyLog) -> Result<i64, StorageError> {
        let mut guard = self.logs.lock().map_err(poisoned)?;
        guard.push(log.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Conflict)
    }

    async fn logs_for_user(&self, user_id: UserId) -> Result<Vec<StudyLog>, StorageError> {
        let guard = self.logs.lock().map_err(poisoned)?;
        let mut logs: Vec<StudyLog> = guard
            .iter()
            .filter(|log| log.user_id == user_id)
            .cloned()
            .collect();
        logs.sort_by_key(|log| log.answered_at);
        Ok(logs)
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &QuizResult) -> Result<QuizResultId, StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        let id = i64::try_from(guard.len())
            .map_err(|_| StorageError::Conflict)?
            .saturating_add(1);
        guard.insert(id, result.clone());
        Ok(id)
    }

    async fn get_result(&self, id: QuizResultId) -> Result<QuizResult, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_recent_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<QuizResultRow>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        let mut rows: Vec<QuizResultRow> = guard
            .iter()
            .filter(|(_, result)| result.user_id() == user_id)
            .map(|(id, result)| QuizResultRow::new(*id, result.clone()))
            .collect();
        rows.sort_by(|a, b| {
            b.result
                .completed_at()
                .cmp(&a.result.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub study_logs: Arc<dyn StudyLogRepository>,
    pub results: Arc<dyn QuizResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            questions: Arc::new(repo.clone()),
            study_logs: Arc::new(repo.clone()),
            results: Arc::new(repo),
        }
    }
}
