use std::fmt;

use chrono::{DateTime, Duration, Utc};
use quiz_core::model::{Question, QuestionId, StudyLog, UnitName, UserId};
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    questions: u32,
    logs: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidQuestions { raw: String },
    InvalidLogs { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidLogs { raw } => write!(f, "invalid --logs value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite3?mode=rwc".into());
        let mut user_id = std::env::var("QUIZ_USER_ID")
            .ok()
            .and_then(|value| value.parse::<UserId>().ok())
            .unwrap_or_else(UserId::random);
        let mut questions = 8;
        let mut logs = 20;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--logs" => {
                    let value = require_value(&mut args, "--logs")?;
                    logs = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLogs { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            questions,
            logs,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite://quiz.sqlite3?mode=rwc)");
    eprintln!("  --user <uuid>         Student the sample logs belong to (default: random)");
    eprintln!("  --questions <n>       Number of sample questions to upsert (default: 8)");
    eprintln!("  --logs <n>            Number of sample study logs to append (default: 20)");
    eprintln!("  --now <rfc3339>       Fixed current time for deterministic seeding");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment: QUIZ_DB_URL, QUIZ_USER_ID, RUST_LOG");
}

// (unit, prompt, answer, choices); an empty choice list makes an input question.
const SAMPLES: [(&str, &str, &str, &[&str]); 4] = [
    ("Fractions", "1/2 + 1/4 = ?", "3/4", &["1/2", "3/4", "2/6"]),
    ("Fractions", "Simplify 6/8", "3/4", &[]),
    ("Geography", "Capital of France?", "Paris", &[]),
    ("Geography", "Longest river in Japan?", "Shinano", &["Tone", "Shinano", "Ishikari"]),
];

fn sample_question(index: u32) -> Result<Question, quiz_core::Error> {
    let slot = index as usize % SAMPLES.len();
    let (unit, prompt, answer, choices) = SAMPLES[slot];
    let id = QuestionId::new(u64::from(index) + 1);
    let unit = UnitName::new(unit)?;
    let explanation = format!("The answer is {answer}.");
    let question = if choices.is_empty() {
        Question::input(id, unit, prompt, vec![answer.to_string()], explanation)?
    } else {
        let choices = choices.iter().map(|c| (*c).to_string()).collect();
        Question::multiple_choice(id, unit, prompt, choices, answer, explanation)?
    };
    Ok(question)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut catalog = Vec::new();
    for i in 0..args.questions {
        let question = sample_question(i)?;
        storage.questions.upsert_question(&question).await?;
        catalog.push(question);
    }

    if !catalog.is_empty() {
        for i in 0..args.logs {
            let slot = usize::try_from(i)? % catalog.len();
            let question = &catalog[slot];
            let answer_time_ms = 2_000 + u64::from(i % 7) * 1_500;
            let log = StudyLog {
                user_id: args.user_id,
                unit: question.unit().clone(),
                question_id: question.id(),
                correct: i % 3 != 0,
                timed_out: false,
                answer_time_ms,
                explanation_reviewed: i % 3 == 0,
                suspicious: StudyLog::is_suspicious_latency(answer_time_ms),
                answered_at: now - Duration::hours(i64::from(i) * 5),
            };
            storage.study_logs.append_log(&log).await?;
        }
    }

    tracing::info!(
        user = %args.user_id,
        questions = args.questions,
        logs = args.logs,
        db = %args.db_url,
        "seed complete"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
