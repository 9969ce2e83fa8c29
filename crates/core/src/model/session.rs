use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::hint::{Hint, MAX_HINT_LEVEL, build_hint, hint_penalty};
use crate::model::ids::QuestionId;
use crate::model::question::Question;
use crate::model::score::{MistakeReview, ScoreReport, percent};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected engine operations. A rejected operation never changes the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions match the selected units")]
    EmptySelection,

    #[error("the quiz session is already complete")]
    NoCurrentQuestion,

    #[error("no further hint is available for this question")]
    NoHintAvailable,

    #[error("the current question has not been answered correctly yet")]
    NotAnsweredCorrectly,
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// How many questions a session should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionCount {
    #[default]
    All,
    Limit(usize),
}

impl QuestionCount {
    #[must_use]
    pub fn limit(self) -> Option<usize> {
        match self {
            QuestionCount::All => None,
            QuestionCount::Limit(n) => Some(n),
        }
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// UI-facing reaction to the last judged answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mood {
    #[default]
    Neutral,
    Happy,
    Sad,
}

/// Result of judging one submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgedResult {
    pub question_id: QuestionId,
    pub correct: bool,
    /// True when this judgement was the first mistake on the question.
    pub first_mistake: bool,
}

/// Result of advancing past the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { position: usize },
    Complete,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-progress quiz state. Owned by the caller and driven through `&mut self`.
///
/// The question set is fixed at start; `position` indexes into it and only moves
/// forward after the current question was judged correct.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    position: usize,
    answers: HashMap<QuestionId, String>,
    mistakes: HashSet<QuestionId>,
    first_mistake_answers: HashMap<QuestionId, String>,
    hint_levels: HashMap<QuestionId, u8>,
    current_judgement: Option<bool>,
    mood: Mood,
}

impl QuizSession {
    /// Start a session over an already selected and ordered question set.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptySelection` if `questions` is empty.
    pub fn start(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptySelection);
        }
        Ok(Self {
            questions,
            position: 0,
            answers: HashMap::new(),
            mistakes: HashSet::new(),
            first_mistake_answers: HashMap::new(),
            hint_levels: HashMap::new(),
            current_judgement: None,
            mood: Mood::Neutral,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn mood(&self) -> Mood {
        self.mood
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.position >= self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.position)
    }

    /// Latest judgement of the current question, if it has been answered.
    #[must_use]
    pub fn current_judgement(&self) -> Option<bool> {
        self.current_judgement
    }

    #[must_use]
    pub fn last_answer(&self, id: QuestionId) -> Option<&str> {
        self.answers.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn first_mistake_answer(&self, id: QuestionId) -> Option<&str> {
        self.first_mistake_answers.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn is_mistake(&self, id: QuestionId) -> bool {
        self.mistakes.contains(&id)
    }

    #[must_use]
    pub fn mistake_count(&self) -> usize {
        self.mistakes.len()
    }

    #[must_use]
    pub fn hint_level(&self, id: QuestionId) -> u8 {
        self.hint_levels.get(&id).copied().unwrap_or(0)
    }

    /// Judge `answer` against the current question and record it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoCurrentQuestion` if the session is complete.
    pub fn submit_answer(&mut self, answer: &str) -> Result<JudgedResult, QuizError> {
        let question = self
            .questions
            .get(self.position)
            .ok_or(QuizError::NoCurrentQuestion)?;
        let id = question.id();
        let correct = question.is_correct(answer);

        self.answers.insert(id, answer.to_owned());
        let first_mistake = !correct && self.mistakes.insert(id);
        if first_mistake {
            self.first_mistake_answers.insert(id, answer.to_owned());
        }
        self.current_judgement = Some(correct);
        self.mood = if correct { Mood::Happy } else { Mood::Sad };

        Ok(JudgedResult {
            question_id: id,
            correct,
            first_mistake,
        })
    }

    /// Reveal the next hint tier for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoCurrentQuestion` if the session is complete, and
    /// `QuizError::NoHintAvailable` for questions without hints or at the top tier.
    pub fn request_hint(&mut self) -> Result<Hint, QuizError> {
        let question = self
            .questions
            .get(self.position)
            .ok_or(QuizError::NoCurrentQuestion)?;
        let answer = question.hint_answer().ok_or(QuizError::NoHintAvailable)?;
        let id = question.id();
        let level = self.hint_level(id);
        if level >= MAX_HINT_LEVEL {
            return Err(QuizError::NoHintAvailable);
        }
        let hint = build_hint(answer, level + 1).ok_or(QuizError::NoHintAvailable)?;
        self.hint_levels.insert(id, hint.level);
        Ok(hint)
    }

    /// Move past the current question once it has been judged correct.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoCurrentQuestion` if already complete and
    /// `QuizError::NotAnsweredCorrectly` if the latest judgement was not correct.
    pub fn advance(&mut self) -> Result<Advance, QuizError> {
        if self.is_complete() {
            return Err(QuizError::NoCurrentQuestion);
        }
        if self.current_judgement != Some(true) {
            return Err(QuizError::NotAnsweredCorrectly);
        }
        self.position += 1;
        self.current_judgement = None;
        self.mood = Mood::Neutral;
        if self.is_complete() {
            Ok(Advance::Complete)
        } else {
            Ok(Advance::Next {
                position: self.position,
            })
        }
    }

    /// Compute the score. Pure: repeated calls return identical reports.
    ///
    /// Any question ever answered wrong counts as incorrect, and every hint tier taken
    /// costs points whether or not the question was solved afterwards.
    #[must_use]
    pub fn score(&self) -> ScoreReport {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let mistakes = u32::try_from(self.mistakes.len()).unwrap_or(u32::MAX);
        let correct = total.saturating_sub(mistakes);
        let raw_percent = percent(u64::from(correct), u64::from(total));
        let hint_penalty_percent: u32 = self
            .questions
            .iter()
            .map(|q| hint_penalty(self.hint_level(q.id())))
            .sum();

        let mistakes = self
            .questions
            .iter()
            .filter(|q| self.mistakes.contains(&q.id()))
            .map(|q| MistakeReview {
                question_id: q.id(),
                prompt: q.prompt().to_owned(),
                first_wrong_answer: self
                    .first_mistake_answers
                    .get(&q.id())
                    .cloned()
                    .unwrap_or_default(),
                correct_answer: q.display_answer(),
                explanation: q.explanation().to_owned(),
            })
            .collect();

        ScoreReport {
            total,
            correct,
            raw_percent,
            hint_penalty_percent,
            final_percent: raw_percent.saturating_sub(hint_penalty_percent),
            mistakes,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::unit::UnitName;

    fn input(id: u64, answer: &str) -> Question {
        Question::input(
            QuestionId::new(id),
            UnitName::new("U").unwrap(),
            format!("Q{id}"),
            vec![answer.to_string()],
            format!("because {id}"),
        )
        .unwrap()
    }

    fn choice(id: u64) -> Question {
        Question::multiple_choice(
            QuestionId::new(id),
            UnitName::new("U").unwrap(),
            format!("Q{id}"),
            vec!["a".into(), "b".into()],
            "a",
            "",
        )
        .unwrap()
    }

    #[test]
    fn empty_question_set_is_refused() {
        assert_eq!(
            QuizSession::start(Vec::new()).unwrap_err(),
            QuizError::EmptySelection
        );
    }

    #[test]
    fn correct_answer_does_not_record_mistake() {
        let mut session = QuizSession::start(vec![input(1, "Paris")]).unwrap();
        let judged = session.submit_answer("paris").unwrap();

        assert!(judged.correct);
        assert!(!judged.first_mistake);
        assert_eq!(session.mistake_count(), 0);
        assert_eq!(session.mood(), Mood::Happy);
        assert_eq!(session.last_answer(QuestionId::new(1)), Some("paris"));
    }

    #[test]
    fn mistake_sticks_after_correct_retry() {
        let mut session = QuizSession::start(vec![input(1, "Paris")]).unwrap();
        let first = session.submit_answer("Rome").unwrap();
        assert!(first.first_mistake);
        assert_eq!(session.mood(), Mood::Sad);

        let second = session.submit_answer("Berlin").unwrap();
        assert!(!second.first_mistake);

        session.submit_answer("Paris").unwrap();
        let id = QuestionId::new(1);
        assert!(session.is_mistake(id));
        assert_eq!(session.first_mistake_answer(id), Some("Rome"));
        assert_eq!(session.last_answer(id), Some("Paris"));
    }

    #[test]
    fn advance_requires_correct_judgement() {
        let mut session = QuizSession::start(vec![input(1, "x"), input(2, "y")]).unwrap();
        assert_eq!(session.advance().unwrap_err(), QuizError::NotAnsweredCorrectly);

        session.submit_answer("wrong").unwrap();
        assert_eq!(session.advance().unwrap_err(), QuizError::NotAnsweredCorrectly);
        assert_eq!(session.position(), 0);

        session.submit_answer("x").unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Next { position: 1 });
        assert_eq!(session.mood(), Mood::Neutral);
        assert_eq!(session.current_judgement(), None);
    }

    #[test]
    fn completed_session_rejects_further_operations() {
        let mut session = QuizSession::start(vec![input(1, "x")]).unwrap();
        session.submit_answer("x").unwrap();
        assert_eq!(session.advance().unwrap(), Advance::Complete);
        assert!(session.is_complete());

        assert_eq!(
            session.submit_answer("x").unwrap_err(),
            QuizError::NoCurrentQuestion
        );
        assert_eq!(session.advance().unwrap_err(), QuizError::NoCurrentQuestion);
        assert_eq!(
            session.request_hint().unwrap_err(),
            QuizError::NoCurrentQuestion
        );
    }

    #[test]
    fn hints_climb_to_three_then_stop() {
        let mut session =
            QuizSession::start(vec![input(1, "one two three four five six seven eight nine ten")])
                .unwrap();
        let id = QuestionId::new(1);

        let levels: Vec<(u8, usize)> = (0..3)
            .map(|_| {
                let hint = session.request_hint().unwrap();
                (hint.level, hint.revealed_words)
            })
            .collect();
        assert_eq!(levels, vec![(1, 2), (2, 5), (3, 10)]);
        assert_eq!(session.hint_level(id), 3);

        assert_eq!(
            session.request_hint().unwrap_err(),
            QuizError::NoHintAvailable
        );
        assert_eq!(session.hint_level(id), 3);
    }

    #[test]
    fn multiple_choice_has_no_hints() {
        let mut session = QuizSession::start(vec![choice(1)]).unwrap();
        assert_eq!(
            session.request_hint().unwrap_err(),
            QuizError::NoHintAvailable
        );
        assert_eq!(session.hint_level(QuestionId::new(1)), 0);
    }

    #[test]
    fn score_counts_mistakes_and_hint_penalties() {
        let mut session = QuizSession::start(vec![input(1, "a b c"), input(2, "d")]).unwrap();

        session.request_hint().unwrap();
        session.request_hint().unwrap();
        session.submit_answer("nope").unwrap();
        session.submit_answer("a b c").unwrap();
        session.advance().unwrap();
        session.submit_answer("d").unwrap();
        session.advance().unwrap();

        let report = session.score();
        assert_eq!(report.total, 2);
        assert_eq!(report.correct, 1);
        assert_eq!(report.raw_percent, 50);
        assert_eq!(report.hint_penalty_percent, 7);
        assert_eq!(report.final_percent, 43);
        assert_eq!(report.mistakes.len(), 1);
        let review = &report.mistakes[0];
        assert_eq!(review.prompt, "Q1");
        assert_eq!(review.first_wrong_answer, "nope");
        assert_eq!(review.correct_answer, "a b c");
        assert_eq!(review.explanation, "because 1");
    }

    #[test]
    fn final_percent_clamps_at_zero() {
        let mut session = QuizSession::start(vec![input(1, "a")]).unwrap();
        for _ in 0..3 {
            session.request_hint().unwrap();
        }
        session.submit_answer("b").unwrap();

        let report = session.score();
        assert_eq!(report.raw_percent, 0);
        assert_eq!(report.hint_penalty_percent, 17);
        assert_eq!(report.final_percent, 0);
    }

    #[test]
    fn score_is_idempotent() {
        let mut session = QuizSession::start(vec![input(1, "a"), input(2, "b")]).unwrap();
        session.submit_answer("x").unwrap();
        session.request_hint().unwrap();
        assert_eq!(session.score(), session.score());
    }

    #[test]
    fn question_count_limit() {
        assert_eq!(QuestionCount::Limit(3).limit(), Some(3));
        assert_eq!(QuestionCount::All.limit(), None);
    }
}
