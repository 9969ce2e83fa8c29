use std::sync::Arc;

use quiz_core::model::{Advance, Hint, JudgedResult, QuestionCount, QuizResult, UnitName, UserId};
use storage::repository::{
    QuestionRepository, QuizResultId, QuizResultRepository, Storage, StudyLogRepository,
};

use super::plan::SessionPlanBuilder;
use super::service::SessionService;
use crate::Clock;
use crate::error::SessionError;

/// Result of moving past a question in a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStep {
    pub advance: Advance,
    /// Study logs written during this step, including earlier ones that had failed.
    pub logs_written: usize,
    pub result_id: Option<QuizResultId>,
}

/// Orchestrates session start, answering and persistence of logs and results.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    study_logs: Arc<dyn StudyLogRepository>,
    results: Arc<dyn QuizResultRepository>,
    shuffle: bool,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        study_logs: Arc<dyn StudyLogRepository>,
        results: Arc<dyn QuizResultRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            study_logs,
            results,
            shuffle: true,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.study_logs),
            Arc::clone(&storage.results),
        )
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Start a quiz over the selected units.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz(QuizError::EmptySelection)` when nothing matches, or
    /// `SessionError::Storage` if the catalog cannot be loaded.
    pub async fn start_session(
        &self,
        user_id: UserId,
        units: &[UnitName],
        count: QuestionCount,
    ) -> Result<SessionService, SessionError> {
        let catalog = self.questions.list_questions().await?;
        let plan = SessionPlanBuilder::new(units, count)
            .with_shuffle(self.shuffle)
            .build(catalog);

        let session =
            SessionService::start(user_id, units.to_vec(), plan.questions, self.clock.now())?;
        tracing::info!(
            user = %user_id,
            units = units.len(),
            questions = session.progress().total,
            matched = plan.matched,
            "quiz session started"
        );
        Ok(session)
    }

    /// Judge an answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session is already complete.
    pub fn answer_current(
        &self,
        session: &mut SessionService,
        answer: &str,
    ) -> Result<JudgedResult, SessionError> {
        let judged = session.submit_answer(answer, self.clock.now())?;
        tracing::debug!(
            question = %judged.question_id,
            correct = judged.correct,
            first_mistake = judged.first_mistake,
            "answer judged"
        );
        Ok(judged)
    }

    /// Record an expired answer timer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session is already complete.
    pub fn timeout_current(&self, session: &mut SessionService) -> Result<JudgedResult, SessionError> {
        let judged = session.record_timeout(self.clock.now())?;
        tracing::debug!(question = %judged.question_id, "answer timed out");
        Ok(judged)
    }

    /// Reveal the next hint tier for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` when no hint is available.
    pub fn hint_current(&self, session: &mut SessionService) -> Result<Hint, SessionError> {
        let hint = session.request_hint()?;
        tracing::debug!(level = hint.level, "hint revealed");
        Ok(hint)
    }

    /// Mark the explanation of the current question as reviewed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session is already complete.
    pub fn review_explanation(&self, session: &mut SessionService) -> Result<(), SessionError> {
        session.mark_explanation_reviewed()
    }

    /// Move past the current question, persisting its study log, and the quiz result
    /// once the last question was passed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session cannot advance. A storage failure is
    /// returned as `SessionError::Storage` after the session advanced; the unsaved
    /// entries are retried by the next `advance` or by `finalize_result`.
    pub async fn advance(&self, session: &mut SessionService) -> Result<QuizStep, SessionError> {
        let outcome = session.advance(self.clock.now())?;
        let logs_written = self.flush_logs(session).await?;

        let result_id = if outcome.advance == Advance::Complete {
            Some(self.persist_result(session).await?)
        } else {
            None
        };

        Ok(QuizStep {
            advance: outcome.advance,
            logs_written,
            result_id,
        })
    }

    /// Retry persistence after a completed session.
    ///
    /// This is useful when the final append failed (e.g. transient storage error).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if the session is not complete.
    /// Returns `SessionError::Storage` if persistence fails.
    pub async fn finalize_result(
        &self,
        session: &mut SessionService,
    ) -> Result<QuizResultId, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::Incomplete);
        }
        self.flush_logs(session).await?;
        self.persist_result(session).await
    }

    /// Load the persisted result of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotPersisted` if the result was never stored.
    pub async fn load_result(&self, session: &SessionService) -> Result<QuizResult, SessionError> {
        let id = session.result_id().ok_or(SessionError::NotPersisted)?;
        Ok(self.results.get_result(id).await?)
    }

    async fn flush_logs(&self, session: &mut SessionService) -> Result<usize, SessionError> {
        let mut written = 0;
        while let Some(log) = session.pending_logs().first() {
            if let Err(err) = self.study_logs.append_log(log).await {
                tracing::warn!(
                    question = %log.question_id,
                    error = %err,
                    "failed to persist study log"
                );
                return Err(err.into());
            }
            session.mark_oldest_log_persisted();
            written += 1;
        }
        Ok(written)
    }

    async fn persist_result(&self, session: &mut SessionService) -> Result<QuizResultId, SessionError> {
        if let Some(id) = session.result_id() {
            return Ok(id);
        }

        let result = session.build_result()?;
        let id = match self.results.append_result(&result).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(user = %result.user_id(), error = %err, "failed to persist quiz result");
                return Err(err.into());
            }
        };
        session.set_result_id(id);
        tracing::info!(
            user = %result.user_id(),
            result_id = id,
            final_percent = result.final_percent(),
            "quiz session completed"
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use quiz_core::model::{Question, QuestionId, QuizError, StudyLog};
    use quiz_core::time::fixed_now;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage::repository::{InMemoryRepository, StorageError};

    fn unit() -> UnitName {
        UnitName::new("Fractions").unwrap()
    }

    async fn seeded_repo(answers: &[&str]) -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        for (i, answer) in answers.iter().enumerate() {
            let id = u64::try_from(i).unwrap() + 1;
            let q = Question::input(
                QuestionId::new(id),
                unit(),
                format!("Q{id}"),
                vec![(*answer).to_string()],
                "",
            )
            .unwrap();
            repo.upsert_question(&q).await.unwrap();
        }
        repo
    }

    /// Study log store that fails the first `failures` appends.
    struct FlakyLogs {
        inner: InMemoryRepository,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl StudyLogRepository for FlakyLogs {
        async fn append_log(&self, log: &StudyLog) -> Result<i64, StorageError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.append_log(log).await
        }

        async fn logs_for_user(&self, user_id: UserId) -> Result<Vec<StudyLog>, StorageError> {
            self.inner.logs_for_user(user_id).await
        }
    }

    #[tokio::test]
    async fn unknown_unit_refuses_to_start() {
        let repo = seeded_repo(&["a"]).await;
        let svc = QuizLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        let err = svc
            .start_session(
                UserId::random(),
                &[UnitName::new("History").unwrap()],
                QuestionCount::All,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Quiz(QuizError::EmptySelection)));
    }

    #[tokio::test]
    async fn failed_log_is_retried_on_next_advance() {
        let repo = seeded_repo(&["a", "b"]).await;
        let logs = Arc::new(FlakyLogs {
            inner: repo.clone(),
            failures: AtomicUsize::new(1),
        });
        let svc = QuizLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            logs,
            Arc::new(repo.clone()),
        )
        .with_shuffle(false);
        let user = UserId::random();
        let mut session = svc
            .start_session(user, &[unit()], QuestionCount::All)
            .await
            .unwrap();

        svc.answer_current(&mut session, "a").unwrap();
        let err = svc.advance(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert_eq!(session.pending_logs().len(), 1);
        assert_eq!(session.progress().answered, 1);

        svc.answer_current(&mut session, "b").unwrap();
        let step = svc.advance(&mut session).await.unwrap();
        assert_eq!(step.advance, Advance::Complete);
        assert_eq!(step.logs_written, 2);
        assert!(step.result_id.is_some());
        assert_eq!(repo.logs_for_user(user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn finalize_requires_completion_and_is_idempotent() {
        let repo = seeded_repo(&["a"]).await;
        let svc = QuizLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let mut session = svc
            .start_session(UserId::random(), &[unit()], QuestionCount::All)
            .await
            .unwrap();

        assert!(matches!(
            svc.finalize_result(&mut session).await,
            Err(SessionError::Incomplete)
        ));
        assert!(matches!(
            svc.load_result(&session).await,
            Err(SessionError::NotPersisted)
        ));

        svc.answer_current(&mut session, "a").unwrap();
        let step = svc.advance(&mut session).await.unwrap();
        let id = step.result_id.unwrap();

        assert_eq!(svc.finalize_result(&mut session).await.unwrap(), id);
        let stored = svc.load_result(&session).await.unwrap();
        assert_eq!(stored.final_percent(), 100);
    }
}
