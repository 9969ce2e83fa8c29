mod hint;
mod ids;
mod question;
mod quiz_result;
mod report;
mod score;
mod session;
mod study_log;
mod unit;

pub use hint::{HINT_PENALTY_POINTS, Hint, MAX_HINT_LEVEL, build_hint, hint_penalty};
pub use ids::{ParseIdError, QuestionId, UserId};
pub use question::{
    AnswerEntry, CorrectField, Question, QuestionError, QuestionKind, QuestionRecord,
    QuestionType, normalize_answer,
};
pub use quiz_result::{QuizResult, QuizResultError};
pub use report::{DailyActivity, Grade, UnitSummary};
pub use score::{MistakeReview, ScoreReport, percent};
pub use session::{Advance, JudgedResult, Mood, QuestionCount, QuizError, QuizSession};
pub use study_log::{SUSPICIOUS_ANSWER_MS, StudyLog};
pub use unit::{UnitName, UnitNameError};
