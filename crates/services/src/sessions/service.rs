use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{
    Advance, Hint, JudgedResult, Question, QuizError, QuizResult, QuizSession, ScoreReport,
    StudyLog, UnitName, UserId,
};
use quiz_core::time::millis_between;
use storage::repository::QuizResultId;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── ADVANCE OUTCOME ───────────────────────────────────────────────────────────
//

/// What happened when the student moved past a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// Log entry for the question just left.
    pub log: StudyLog,
    pub advance: Advance,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// A `QuizSession` with a timeline and the student it belongs to.
///
/// Timestamps are passed in by the caller so the services layer clock stays the
/// single time source. Logs produced by `advance` stay pending until the workflow
/// has persisted them.
pub struct SessionService {
    user_id: UserId,
    units: Vec<UnitName>,
    session: QuizSession,
    started_at: DateTime<Utc>,
    presented_at: DateTime<Utc>,
    correct_at: Option<DateTime<Utc>>,
    timed_out: bool,
    explanation_reviewed: bool,
    pending_logs: Vec<StudyLog>,
    completed_at: Option<DateTime<Utc>>,
    result_id: Option<QuizResultId>,
}

impl SessionService {
    /// Start a session over an already planned question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz(QuizError::EmptySelection)` if `questions` is empty.
    pub fn start(
        user_id: UserId,
        units: Vec<UnitName>,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let session = QuizSession::start(questions)?;
        Ok(Self {
            user_id,
            units,
            session,
            started_at,
            presented_at: started_at,
            correct_at: None,
            timed_out: false,
            explanation_reviewed: false,
            pending_logs: Vec::new(),
            completed_at: None,
            result_id: None,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn units(&self) -> &[UnitName] {
        &self.units
    }

    /// Read-only view of the underlying engine state.
    #[must_use]
    pub fn quiz(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn result_id(&self) -> Option<QuizResultId> {
        self.result_id
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    /// Logs produced by `advance` that have not been persisted yet, oldest first.
    #[must_use]
    pub fn pending_logs(&self) -> &[StudyLog] {
        &self.pending_logs
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.session.len();
        let answered = self.session.position().min(total);
        SessionProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn score(&self) -> ScoreReport {
        self.session.score()
    }

    /// Judge an answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session is already complete.
    pub fn submit_answer(
        &mut self,
        answer: &str,
        at: DateTime<Utc>,
    ) -> Result<JudgedResult, SessionError> {
        let judged = self.session.submit_answer(answer)?;
        self.correct_at = judged.correct.then_some(at);
        Ok(judged)
    }

    /// Record that the answer timer ran out: judged as an empty answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session is already complete.
    pub fn record_timeout(&mut self, at: DateTime<Utc>) -> Result<JudgedResult, SessionError> {
        let judged = self.submit_answer("", at)?;
        self.timed_out = true;
        Ok(judged)
    }

    /// Reveal the next hint tier for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` when no hint is available or the session is complete.
    pub fn request_hint(&mut self) -> Result<Hint, SessionError> {
        Ok(self.session.request_hint()?)
    }

    /// Note that the student opened the explanation of the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the session is already complete.
    pub fn mark_explanation_reviewed(&mut self) -> Result<(), SessionError> {
        if self.session.current_question().is_none() {
            return Err(QuizError::NoCurrentQuestion.into());
        }
        self.explanation_reviewed = true;
        Ok(())
    }

    /// Move past the current question and produce its study log.
    ///
    /// `at` becomes the presentation time of the next question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` when the current question has not been answered
    /// correctly or the session is already complete. The session is unchanged then.
    pub fn advance(&mut self, at: DateTime<Utc>) -> Result<AdvanceOutcome, SessionError> {
        let (question_id, unit) = match self.session.current_question() {
            Some(q) => (q.id(), q.unit().clone()),
            None => return Err(QuizError::NoCurrentQuestion.into()),
        };
        let advance = self.session.advance()?;

        let answered_at = self.correct_at.unwrap_or(at);
        let answer_time_ms = millis_between(self.presented_at, answered_at);
        let log = StudyLog {
            user_id: self.user_id,
            unit,
            question_id,
            correct: !self.session.is_mistake(question_id),
            timed_out: self.timed_out,
            answer_time_ms,
            explanation_reviewed: self.explanation_reviewed,
            suspicious: StudyLog::is_suspicious_latency(answer_time_ms),
            answered_at,
        };

        self.presented_at = at;
        self.correct_at = None;
        self.timed_out = false;
        self.explanation_reviewed = false;
        if advance == Advance::Complete {
            self.completed_at = Some(at);
        }
        self.pending_logs.push(log.clone());

        Ok(AdvanceOutcome { log, advance })
    }

    /// Build the result of a completed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` before the last question was passed.
    pub fn build_result(&self) -> Result<QuizResult, SessionError> {
        let completed_at = self.completed_at.ok_or(SessionError::Incomplete)?;
        Ok(QuizResult::from_score(
            self.user_id,
            self.units.clone(),
            self.started_at,
            completed_at,
            &self.session.score(),
        )?)
    }

    pub(crate) fn mark_oldest_log_persisted(&mut self) {
        if !self.pending_logs.is_empty() {
            self.pending_logs.remove(0);
        }
    }

    pub(crate) fn set_result_id(&mut self, id: QuizResultId) {
        self.result_id = Some(id);
    }
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("user_id", &self.user_id)
            .field("questions_len", &self.session.len())
            .field("position", &self.session.position())
            .field("pending_logs", &self.pending_logs.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("result_id", &self.result_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
