use std::fmt;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;

pub const DEFAULT_DB_URL: &str = "sqlite://lessons.sqlite3";
const MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug)]
pub enum ConfigError {
    InvalidDbUrl { raw: String },
    EmptyLearner,
    EmptyBody,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ConfigError::EmptyLearner => write!(f, "--learner must not be empty"),
            ConfigError::EmptyBody => write!(f, "request body is empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Parser)]
#[command(name = "lessons", about = "Spaced-repetition review scheduler")]
#[command(version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database URL or path
    #[arg(long, env = "LESSON_DB_URL", default_value = DEFAULT_DB_URL, global = true)]
    pub db: String,

    /// Keep everything in process memory instead of SQLite
    #[arg(long, global = true)]
    pub memory: bool,

    /// Learner the operation acts for
    #[arg(long, env = "LESSON_LEARNER_ID")]
    pub learner: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record one answer attempt and print the updated question progress
    Attempt(BodyArgs),
    /// Build the prioritized review summary for the available questions
    Queue(BodyArgs),
    /// Apply a finished lesson to the learner's XP, streak, hearts and badges
    LessonComplete(BodyArgs),
    /// Print the learner's current progress
    Progress,
}

#[derive(Debug, Args)]
pub struct BodyArgs {
    /// JSON request body; read from stdin when omitted
    #[arg(long)]
    pub body: Option<String>,
}

impl BodyArgs {
    pub async fn read(&self) -> Result<String, Box<dyn std::error::Error>> {
        let raw = match &self.body {
            Some(body) => body.clone(),
            None => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                buf
            }
        };
        if raw.trim().is_empty() {
            return Err(ConfigError::EmptyBody.into());
        }
        Ok(raw)
    }
}

/// Where the binary keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite(String),
}

impl Cli {
    /// Resolve the storage backend from `--memory` / `--db`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDbUrl` for a blank database URL.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        if self.memory {
            return Ok(Backend::Memory);
        }
        if self.db.trim().is_empty() {
            return Err(ConfigError::InvalidDbUrl {
                raw: self.db.clone(),
            });
        }
        Ok(Backend::Sqlite(normalize_sqlite_url(&self.db)))
    }

    pub fn learner_id(&self) -> Result<&str, ConfigError> {
        let learner = self.learner.trim();
        if learner.is_empty() {
            return Err(ConfigError::EmptyLearner);
        }
        Ok(learner)
    }
}

pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == MEMORY_URL || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
///
/// # Errors
///
/// Returns an error if the URL has no path or the filesystem refuses.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == MEMORY_URL {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ConfigError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ConfigError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
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
