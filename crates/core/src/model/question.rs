use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::unit::{UnitName, UnitNameError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has an empty prompt")]
    EmptyPrompt(QuestionId),

    #[error("multiple-choice question {0} has no choices")]
    MissingChoices(QuestionId),

    #[error("multiple-choice question {0} has no correct choice")]
    MissingCorrectChoice(QuestionId),

    #[error("multiple-choice question {0} lists its correct value outside its choices")]
    CorrectChoiceNotInChoices(QuestionId),

    #[error("input question {0} has no accepted answer")]
    NoAcceptedAnswer(QuestionId),

    #[error("question {id} has an invalid unit: {source}")]
    InvalidUnit {
        id: QuestionId,
        #[source]
        source: UnitNameError,
    },
}

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    MultipleChoice,
    Input,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::Input => "input",
        }
    }
}

//
// ─── WIRE RECORD ───────────────────────────────────────────────────────────────
//

/// One entry of an answer list as delivered by the catalog. Non-string entries are kept
/// as `Other` so a single bad value does not reject the whole question.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnswerEntry {
    Text(String),
    Other(IgnoredAny),
}

/// The overloaded `correct` field: either a single string or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CorrectField {
    One(String),
    Many(Vec<AnswerEntry>),
    Other(IgnoredAny),
}

/// Loose catalog shape of a question, before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub unit: String,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default)]
    pub correct: Option<CorrectField>,
    #[serde(default)]
    pub correct_answers: Option<Vec<AnswerEntry>>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

fn clean_entries(entries: &[AnswerEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            AnswerEntry::Text(text) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

impl QuestionRecord {
    /// Accepted answers in source priority order: `correct` as array, `correctAnswers`,
    /// `correctAnswer`, `correct` as string. The first source that is non-empty after
    /// dropping blank entries wins.
    #[must_use]
    pub fn accepted_answers(&self) -> Vec<String> {
        if let Some(CorrectField::Many(entries)) = &self.correct {
            let cleaned = clean_entries(entries);
            if !cleaned.is_empty() {
                return cleaned;
            }
        }
        if let Some(entries) = &self.correct_answers {
            let cleaned = clean_entries(entries);
            if !cleaned.is_empty() {
                return cleaned;
            }
        }
        if let Some(single) = non_blank(self.correct_answer.as_ref()) {
            return vec![single];
        }
        if let Some(CorrectField::One(single)) = &self.correct {
            if let Some(single) = non_blank(Some(single)) {
                return vec![single];
            }
        }
        Vec::new()
    }

    fn correct_choice(&self) -> Option<String> {
        non_blank(self.correct_answer.as_ref())
            .or_else(|| match &self.correct {
                Some(CorrectField::One(single)) => non_blank(Some(single)),
                _ => None,
            })
            .or_else(|| self.accepted_answers().into_iter().next())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Type-specific answer data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice { choices: Vec<String>, correct: String },
    Input { accepted: Vec<String> },
}

/// A validated question. Read-only to the quiz engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    unit: UnitName,
    prompt: String,
    kind: QuestionKind,
    explanation: String,
}

/// Normalization used for free-text comparison.
#[must_use]
pub fn normalize_answer(value: &str) -> String {
    value.trim().to_lowercase()
}

impl Question {
    /// Build a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, there are no choices, or the
    /// correct value is blank or not one of the choices.
    pub fn multiple_choice(
        id: QuestionId,
        unit: UnitName,
        prompt: impl Into<String>,
        choices: Vec<String>,
        correct: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let correct = correct.into();
        if choices.is_empty() {
            return Err(QuestionError::MissingChoices(id));
        }
        if correct.trim().is_empty() {
            return Err(QuestionError::MissingCorrectChoice(id));
        }
        if !choices.contains(&correct) {
            return Err(QuestionError::CorrectChoiceNotInChoices(id));
        }
        Self::build(
            id,
            unit,
            prompt.into(),
            QuestionKind::MultipleChoice { choices, correct },
            explanation.into(),
        )
    }

    /// Build a free-text input question. Blank accepted answers are dropped.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank or no accepted answer remains.
    pub fn input(
        id: QuestionId,
        unit: UnitName,
        prompt: impl Into<String>,
        accepted: Vec<String>,
        explanation: impl Into<String>,
    ) -> Result<Self, QuestionError> {
        let accepted: Vec<String> = accepted
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        if accepted.is_empty() {
            return Err(QuestionError::NoAcceptedAnswer(id));
        }
        Self::build(
            id,
            unit,
            prompt.into(),
            QuestionKind::Input { accepted },
            explanation.into(),
        )
    }

    fn build(
        id: QuestionId,
        unit: UnitName,
        prompt: String,
        kind: QuestionKind,
        explanation: String,
    ) -> Result<Self, QuestionError> {
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt(id));
        }
        Ok(Self {
            id,
            unit,
            prompt,
            kind,
            explanation,
        })
    }

    /// Normalize a catalog record into a `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the record cannot form a valid question.
    pub fn from_record(record: QuestionRecord) -> Result<Self, QuestionError> {
        let id = record.id;
        let unit = UnitName::new(record.unit.clone())
            .map_err(|source| QuestionError::InvalidUnit { id, source })?;
        let explanation = record.explanation.clone().unwrap_or_default();
        match record.kind {
            QuestionType::MultipleChoice => {
                let correct = record
                    .correct_choice()
                    .ok_or(QuestionError::MissingCorrectChoice(id))?;
                let choices = record.choices.unwrap_or_default();
                Self::multiple_choice(id, unit, record.prompt, choices, correct, explanation)
            }
            QuestionType::Input => {
                let accepted = record.accepted_answers();
                Self::input(id, unit, record.prompt, accepted, explanation)
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn unit(&self) -> &UnitName {
        &self.unit
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::Input { .. } => QuestionType::Input,
        }
    }

    /// Choices in catalog order; empty for input questions.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { choices, .. } => choices,
            QuestionKind::Input { .. } => &[],
        }
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Judge a submitted answer.
    ///
    /// Multiple-choice answers must match the correct value exactly; input answers are
    /// compared trimmed and case-folded against every accepted answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        match &self.kind {
            QuestionKind::MultipleChoice { correct, .. } => answer == correct,
            QuestionKind::Input { accepted } => {
                let given = normalize_answer(answer);
                accepted.iter().any(|a| normalize_answer(a) == given)
            }
        }
    }

    /// The answer shown in reviews. Multiple accepted answers are joined with " / ".
    #[must_use]
    pub fn display_answer(&self) -> String {
        match &self.kind {
            QuestionKind::MultipleChoice { correct, .. } => correct.clone(),
            QuestionKind::Input { accepted } => accepted.join(" / "),
        }
    }

    /// The answer hints are drawn from, if this question supports hints.
    #[must_use]
    pub fn hint_answer(&self) -> Option<&str> {
        match &self.kind {
            QuestionKind::Input { accepted } => accepted.first().map(String::as_str),
            QuestionKind::MultipleChoice { .. } => None,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> UnitName {
        UnitName::new(name).unwrap()
    }

    fn record(json: &str) -> QuestionRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn input_answers_are_trimmed_and_case_folded() {
        let q = Question::input(
            QuestionId::new(1),
            unit("Geo"),
            "Capital of France?",
            vec!["Paris".into()],
            "",
        )
        .unwrap();

        assert!(q.is_correct(" paris "));
        assert!(q.is_correct("PARIS"));
        assert!(!q.is_correct("Lyon"));
    }

    #[test]
    fn multiple_choice_requires_exact_match() {
        let q = Question::multiple_choice(
            QuestionId::new(2),
            unit("Geo"),
            "Pick the capital",
            vec!["Paris".into(), "Lyon".into()],
            "Paris",
            "",
        )
        .unwrap();

        assert!(q.is_correct("Paris"));
        assert!(!q.is_correct("paris"));
        assert!(!q.is_correct(" Paris"));
    }

    #[test]
    fn record_prefers_correct_array_over_other_sources() {
        let rec = record(
            r#"{"id":1,"unit":"U","type":"input","prompt":"p",
                "correct":["", "alpha", 3],
                "correctAnswers":["beta"],
                "correctAnswer":"gamma"}"#,
        );
        assert_eq!(rec.accepted_answers(), vec!["alpha".to_string()]);
    }

    #[test]
    fn record_falls_through_blank_sources() {
        let rec = record(
            r#"{"id":1,"unit":"U","type":"input","prompt":"p",
                "correct":["  "],
                "correctAnswers":[null, ""],
                "correctAnswer":"gamma"}"#,
        );
        assert_eq!(rec.accepted_answers(), vec!["gamma".to_string()]);

        let rec = record(r#"{"id":1,"unit":"U","type":"input","prompt":"p","correct":"delta"}"#);
        assert_eq!(rec.accepted_answers(), vec!["delta".to_string()]);
    }

    #[test]
    fn multiple_choice_record_normalizes() {
        let rec = record(
            r#"{"id":9,"unit":" Math ","type":"multiple-choice","question":"2+2?",
                "choices":["3","4"],"correct":"4","explanation":"basic"}"#,
        );
        let q = Question::from_record(rec).unwrap();
        assert_eq!(q.unit().as_str(), "Math");
        assert_eq!(q.prompt(), "2+2?");
        assert_eq!(q.choices().to_vec(), vec!["3".to_string(), "4".to_string()]);
        assert!(q.is_correct("4"));
        assert_eq!(q.explanation(), "basic");
    }

    #[test]
    fn multiple_choice_record_without_choices_is_rejected() {
        let rec = record(r#"{"id":3,"unit":"U","type":"multiple-choice","prompt":"p","correct":"a"}"#);
        assert_eq!(
            Question::from_record(rec).unwrap_err(),
            QuestionError::MissingChoices(QuestionId::new(3))
        );
    }

    #[test]
    fn blank_unit_is_rejected() {
        let rec = record(r#"{"id":4,"unit":" ","type":"input","prompt":"p"}"#);
        assert!(matches!(
            Question::from_record(rec),
            Err(QuestionError::InvalidUnit { .. })
        ));
    }

    #[test]
    fn input_without_usable_answers_is_rejected() {
        assert_eq!(
            Question::input(QuestionId::new(5), unit("U"), "p", vec![" ".into()], "").unwrap_err(),
            QuestionError::NoAcceptedAnswer(QuestionId::new(5))
        );

        let rec = record(r#"{"id":6,"unit":"U","type":"input","prompt":"p","correctAnswers":["  ",7]}"#);
        assert_eq!(
            Question::from_record(rec).unwrap_err(),
            QuestionError::NoAcceptedAnswer(QuestionId::new(6))
        );
    }

    #[test]
    fn correct_choice_must_be_listed() {
        let rec = record(
            r#"{"id":7,"unit":"U","type":"multiple-choice","prompt":"2+2?",
                "choices":["3","4"],"correct":"5"}"#,
        );
        assert_eq!(
            Question::from_record(rec).unwrap_err(),
            QuestionError::CorrectChoiceNotInChoices(QuestionId::new(7))
        );
    }
}
