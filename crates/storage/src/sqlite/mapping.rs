use chrono::{DateTime, Utc};
use quiz_core::model::{
    Question, QuestionId, QuestionKind, QuestionType, QuizResult, StudyLog, UnitName, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn user_id_from_str(v: &str) -> Result<UserId, StorageError> {
    v.parse::<UserId>().map_err(ser)
}

pub(crate) fn parse_question_type(s: &str) -> Result<QuestionType, StorageError> {
    match s {
        "multiple-choice" => Ok(QuestionType::MultipleChoice),
        "input" => Ok(QuestionType::Input),
        _ => Err(StorageError::Serialization(format!("invalid kind: {s}"))),
    }
}

/// Column values for a question: `(choices_json, accepted_json)`.
///
/// Multiple-choice questions store their single correct value as a one-element
/// `accepted` list.
pub(crate) fn question_columns(question: &Question) -> Result<(String, String), StorageError> {
    let choices = question.choices();
    let accepted: Vec<&String> = match question.kind() {
        QuestionKind::MultipleChoice { correct, .. } => vec![correct],
        QuestionKind::Input { accepted } => accepted.iter().collect(),
    };
    Ok((
        serde_json::to_string(choices).map_err(ser)?,
        serde_json::to_string(&accepted).map_err(ser)?,
    ))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let unit = UnitName::new(row.try_get::<String, _>("unit").map_err(ser)?).map_err(ser)?;
    let kind = parse_question_type(&row.try_get::<String, _>("kind").map_err(ser)?)?;
    let prompt: String = row.try_get("prompt").map_err(ser)?;
    let explanation: String = row.try_get("explanation").map_err(ser)?;
    let choices: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("choices").map_err(ser)?).map_err(ser)?;
    let mut accepted: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("accepted").map_err(ser)?).map_err(ser)?;

    let question = match kind {
        QuestionType::MultipleChoice => {
            if accepted.len() != 1 {
                return Err(StorageError::Serialization(format!(
                    "question {id} must store exactly one correct choice"
                )));
            }
            let correct = accepted.remove(0);
            Question::multiple_choice(id, unit, prompt, choices, correct, explanation)
        }
        QuestionType::Input => Question::input(id, unit, prompt, accepted, explanation),
    };
    question.map_err(ser)
}

pub(crate) fn map_study_log_row(row: &SqliteRow) -> Result<StudyLog, StorageError> {
    let answer_time_ms: i64 = row.try_get("answer_time_ms").map_err(ser)?;
    Ok(StudyLog {
        user_id: user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        unit: UnitName::new(row.try_get::<String, _>("unit").map_err(ser)?).map_err(ser)?,
        question_id: question_id_from_i64(row.try_get::<i64, _>("question_id").map_err(ser)?)?,
        correct: row.try_get("correct").map_err(ser)?,
        timed_out: row.try_get("timed_out").map_err(ser)?,
        answer_time_ms: i64_to_u64("answer_time_ms", answer_time_ms)?,
        explanation_reviewed: row.try_get("explanation_reviewed").map_err(ser)?,
        suspicious: row.try_get("suspicious").map_err(ser)?,
        answered_at: row.try_get("answered_at").map_err(ser)?,
    })
}

pub(crate) fn map_quiz_result_row(row: &SqliteRow) -> Result<QuizResult, StorageError> {
    let user_id = user_id_from_str(&row.try_get::<String, _>("user_id").map_err(ser)?)?;
    let units: Vec<UnitName> =
        serde_json::from_str(&row.try_get::<String, _>("units").map_err(ser)?).map_err(ser)?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let count = |field: &'static str| -> Result<u32, StorageError> {
        u32_from_i64(field, row.try_get::<i64, _>(field).map_err(ser)?)
    };

    QuizResult::from_persisted(
        user_id,
        units,
        started_at,
        completed_at,
        count("total")?,
        count("correct")?,
        count("raw_percent")?,
        count("hint_penalty_percent")?,
        count("final_percent")?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parsing_matches_storage_strings() {
        for kind in [QuestionType::MultipleChoice, QuestionType::Input] {
            assert_eq!(parse_question_type(kind.as_str()).unwrap(), kind);
        }
        assert!(parse_question_type("essay").is_err());
    }

    #[test]
    fn multiple_choice_columns_store_single_correct_value() {
        let q = Question::multiple_choice(
            QuestionId::new(1),
            UnitName::new("U").unwrap(),
            "p",
            vec!["a".into(), "b,\"c\"".into()],
            "a",
            "",
        )
        .unwrap();
        let (choices, accepted) = question_columns(&q).unwrap();
        assert_eq!(choices, r#"["a","b,\"c\""]"#);
        assert_eq!(accepted, r#"["a"]"#);
    }
}
