#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, QuestionRepository, QuizResultId, QuizResultRepository, QuizResultRow,
    Storage, StorageError, StudyLogRepository,
};
