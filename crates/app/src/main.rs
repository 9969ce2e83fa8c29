use std::fmt;
use std::path::PathBuf;

use quiz_core::model::UserId;
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingUser,
    UnknownArg(String),
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingUser => write!(f, "a user is required (--user or QUIZ_USER_ID)"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- report  [--db <sqlite_url>] [--user <uuid>] [--json]");
    eprintln!("  cargo run -p app -- export  [--db <sqlite_url>] [--user <uuid>] [--out <path>]");
    eprintln!("  cargo run -p app -- results [--db <sqlite_url>] [--user <uuid>] [--days <n>] [--limit <n>]");
    eprintln!("  cargo run -p app -- import  [--db <sqlite_url>] --file <questions.json>");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!("  --out unit_report.csv");
    eprintln!("  --days 30, --limit 20");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER_ID, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Report,
    Export,
    Results,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "report" => Some(Self::Report),
            "export" => Some(Self::Export),
            "results" => Some(Self::Results),
            "import" => Some(Self::Import),
            _ => None,
        }
    }

    fn needs_user(self) -> bool {
        !matches!(self, Self::Import)
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    user_id: Option<UserId>,
    out: PathBuf,
    file: Option<PathBuf>,
    json: bool,
    days: i64,
    limit: u32,
}

impl Args {
    fn parse(
        cmd: Command,
        env_db: Option<String>,
        env_user: Option<String>,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env_db.map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut user_id = env_user.and_then(|value| value.parse::<UserId>().ok());
        let mut out = PathBuf::from("unit_report.csv");
        let mut file = None;
        let mut json = false;
        let mut days = 30;
        let mut limit = 20;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let parsed = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    user_id = Some(parsed);
                }
                "--out" => out = PathBuf::from(require_value(args, "--out")?),
                "--file" => file = Some(PathBuf::from(require_value(args, "--file")?)),
                "--json" => json = true,
                "--days" => {
                    let value = require_value(args, "--days")?;
                    days = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--days",
                        raw: value.clone(),
                    })?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--limit",
                        raw: value.clone(),
                    })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if cmd.needs_user() && user_id.is_none() {
            return Err(ArgsError::MissingUser);
        }
        if cmd == Command::Import && file.is_none() {
            return Err(ArgsError::MissingValue { flag: "--file" });
        }

        Ok(Self {
            db_url,
            user_id,
            out,
            file,
            json,
            days,
            limit,
        })
    }

    fn user(&self) -> Result<UserId, ArgsError> {
        self.user_id.ok_or(ArgsError::MissingUser)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(
        cmd,
        std::env::var("QUIZ_DB_URL").ok(),
        std::env::var("QUIZ_USER_ID").ok(),
        &mut argv,
    )
    .map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite here so services stay storage-agnostic.
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default()).await?;

    match cmd {
        Command::Report => {
            let rows = services.reports().unit_summaries(args.user()?).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    let last = row
                        .last_study_at
                        .map(|at| at.format("%Y/%m/%d").to_string())
                        .unwrap_or_else(|| "-".into());
                    println!(
                        "{}\t{}%\t{}\t{}/{}\t{} min\t{}",
                        row.unit,
                        row.accuracy,
                        row.grade().symbol(),
                        row.correct_count,
                        row.total_count,
                        row.minutes_spent(),
                        last
                    );
                }
            }
        }
        Command::Export => {
            let bytes = services.reports().export_csv(args.user()?).await?;
            std::fs::write(&args.out, &bytes)?;
            tracing::info!(path = %args.out.display(), bytes = bytes.len(), "report exported");
        }
        Command::Results => {
            let items = services
                .results()
                .list_recent_results(args.user()?, args.days, args.limit)
                .await?;
            for item in &items {
                println!(
                    "#{}\t{}\t{}/{}\t{}%",
                    item.id,
                    item.completed_at.format("%Y/%m/%d %H:%M"),
                    item.correct,
                    item.total,
                    item.final_percent
                );
            }
        }
        Command::Import => {
            let Some(path) = args.file.as_ref() else {
                return Err(ArgsError::MissingValue { flag: "--file" }.into());
            };
            let json = std::fs::read_to_string(path)?;
            let count = services.catalog().import_json(&json).await?;
            println!("imported {count} questions");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(cmd, None, None, &mut iter)
    }

    #[test]
    fn absolute_sqlite_urls_pass_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.db".into()),
            "sqlite:///tmp/quiz.db"
        );
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:/var/data/quiz.db".into()),
            "sqlite:///var/data/quiz.db"
        );
    }

    #[test]
    fn report_requires_a_user() {
        assert!(matches!(
            parse(Command::Report, &[]),
            Err(ArgsError::MissingUser)
        ));

        let user = UserId::random().to_string();
        let args = parse(Command::Export, &["--user", user.as_str(), "--out", "r.csv"]).unwrap();
        assert_eq!(args.out, PathBuf::from("r.csv"));
        assert_eq!(args.db_url, "sqlite://quiz.sqlite3");
    }

    #[test]
    fn import_needs_a_file_but_no_user() {
        assert!(matches!(
            parse(Command::Import, &[]),
            Err(ArgsError::MissingValue { flag: "--file" })
        ));
        let args = parse(Command::Import, &["--file", "questions.json"]).unwrap();
        assert!(args.user_id.is_none());
    }

    #[test]
    fn rejects_unknown_flags_and_bad_numbers() {
        let user = UserId::random().to_string();
        assert!(matches!(
            parse(Command::Results, &["--user", user.as_str(), "--limit", "many"]),
            Err(ArgsError::InvalidNumber { flag: "--limit", .. })
        ));
        assert!(matches!(
            parse(Command::Report, &["--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }
}
