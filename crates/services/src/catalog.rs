use std::sync::Arc;

use quiz_core::model::{Question, QuestionRecord, UnitName};
use storage::repository::QuestionRepository;

use crate::error::CatalogError;

/// Parse a JSON array of question records into validated questions.
///
/// # Errors
///
/// Returns `CatalogError::Json` for malformed documents and `CatalogError::Question`
/// for the first record that cannot form a question.
pub fn parse_catalog(json: &str) -> Result<Vec<Question>, CatalogError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
    records
        .into_iter()
        .map(|record| Question::from_record(record).map_err(CatalogError::from))
        .collect()
}

/// Maintains the question catalog.
#[derive(Clone)]
pub struct CatalogService {
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// Validate and upsert every question of a JSON catalog.
    ///
    /// All records are validated before the first write, so an invalid record stores
    /// nothing. The upserts are not atomic: a storage failure partway through leaves
    /// the questions written so far in place.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on invalid input or storage failures.
    pub async fn import_json(&self, json: &str) -> Result<usize, CatalogError> {
        let questions = parse_catalog(json)?;
        for question in &questions {
            self.questions.upsert_question(question).await?;
        }
        tracing::info!(questions = questions.len(), "question catalog imported");
        Ok(questions.len())
    }

    /// Units available for selection.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` on repository failures.
    pub async fn list_units(&self) -> Result<Vec<UnitName>, CatalogError> {
        Ok(self.questions.list_units().await?)
    }
}
