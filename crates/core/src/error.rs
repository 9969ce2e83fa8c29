use thiserror::Error;

use crate::model::{QuestionError, QuizError, QuizResultError, UnitNameError};

/// Umbrella error for callers that handle every core failure the same way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Unit(#[from] UnitNameError),
    #[error(transparent)]
    QuizResult(#[from] QuizResultError),
}
