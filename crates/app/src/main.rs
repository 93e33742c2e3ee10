use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use lesson_core::model::LearnerId;
use services::requests::{parse_attempt, parse_lesson_complete, parse_queue};
use services::{AppServices, Clock};

mod config;

use config::{Backend, Cli, Command, prepare_sqlite_file};

fn init_logging(verbose: bool) {
    // Logs go to stderr so stdout carries only the JSON response.
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_services(backend: &Backend) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    match backend {
        Backend::Memory => Ok(AppServices::in_memory(clock)),
        Backend::Sqlite(db_url) => {
            // Parent directories must exist before SQLite can create the file.
            prepare_sqlite_file(db_url)?;
            Ok(AppServices::new_sqlite(db_url, clock).await?)
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let backend = cli.backend()?;
    let learner = LearnerId::new(cli.learner_id()?);
    let app = open_services(&backend).await?;
    tracing::debug!(learner = %learner, backend = ?backend, "Services ready");

    match &cli.command {
        Command::Attempt(args) => {
            let input = parse_attempt(&args.read().await?)?;
            let progress = app.review().record_attempt(&learner, input).await?;
            print_json(&progress)
        }
        Command::Queue(args) => {
            let available = parse_queue(&args.read().await?)?;
            let summary = app
                .review()
                .build_review_summary(&learner, &available)
                .await?;
            print_json(&summary)
        }
        Command::LessonComplete(args) => {
            let completion = parse_lesson_complete(&args.read().await?)?;
            let result = app
                .learner_progress()
                .complete_lesson(&learner, &completion)
                .await?;
            print_json(&result)
        }
        Command::Progress => {
            let view = app.learner_progress().current(&learner).await?;
            print_json(&view)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        // Validation and storage errors alike: one line on stderr, nothing on stdout.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
