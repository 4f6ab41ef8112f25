//! LabelTool - report relevance annotation
//!
//! CLI entry point: one command per operator action.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use labelstore::{
    AnnotationData, BackendKind, CursorRecord, FileStore, LabelBackend, Report, SqliteStore, User,
};
use labeltool::cli::{Cli, Command};
use labeltool::config::Config;
use labeltool::render::{progress_bar, render_screen};
use labeltool::repl::AnnotationRepl;
use labeltool::{Decision, LabelError, Outcome, Session};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = std::env::var_os("LABELTOOL_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("labeltool")
                .join("logs")
        });

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("labeltool.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = config.storage.resolved_path();
    info!(backend = ?config.storage.backend, path = %store_path.display(), "labeltool starting");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Init { reset } => cmd_init(&config, &store_path, reset),
        Command::Import { reports, users } => cmd_import(config.storage.backend, &store_path, &reports, &users),
        Command::Status => cmd_status(&open_session(&config, &store_path)?),
        Command::Show => cmd_show(&open_session(&config, &store_path)?),
        Command::Start => {
            let session = open_session(&config, &store_path)?;
            report_outcome(&session, session.start())
        }
        Command::Mark { decision } => {
            let session = open_session(&config, &store_path)?;
            report_outcome(&session, session.decide(Decision::from(decision)))
        }
        Command::Run => {
            let session = open_session(&config, &store_path)?;
            AnnotationRepl::new(&session).run()
        }
        Command::Export { output } => cmd_export(&open_session(&config, &store_path)?, output.as_deref()),
    }
}

fn open_backend(config: &Config, store_path: &Path) -> Result<Box<dyn LabelBackend>> {
    labelstore::open_backend(config.storage.backend, store_path)
        .context(format!("Failed to open store at {}", store_path.display()))
}

fn open_session(config: &Config, store_path: &Path) -> Result<Session> {
    let backend = open_backend(config, store_path)?;
    Ok(Session::open(backend, config.session_settings())?)
}

fn cmd_init(config: &Config, store_path: &Path, reset: bool) -> Result<()> {
    let backend = open_backend(config, store_path)?;
    let state_row = config.storage.state_row_id;
    let annotations_row = config.storage.annotations_row_id;

    if reset || backend.fetch_cursor(state_row)?.is_none() {
        backend.upsert_cursor(state_row, &CursorRecord::default())?;
        println!("{} Cursor row {} set to the start of the tutorial", "✓".green(), state_row);
    } else {
        println!("{} Cursor row {} already exists", "-".dimmed(), state_row);
    }

    if reset || backend.fetch_annotations(annotations_row)?.is_none() {
        backend.upsert_annotations(annotations_row, &AnnotationData::new())?;
        println!("{} Annotation row {} emptied", "✓".green(), annotations_row);
    } else {
        println!("{} Annotation row {} already exists", "-".dimmed(), annotations_row);
    }
    Ok(())
}

fn cmd_import(kind: BackendKind, store_path: &Path, reports_path: &Path, users_path: &Path) -> Result<()> {
    let reports: Vec<Report> = labelstore::read_collection(reports_path)
        .context(format!("Failed to read reports from {}", reports_path.display()))?;
    let users: Vec<User> = labelstore::read_collection(users_path)
        .context(format!("Failed to read users from {}", users_path.display()))?;

    match kind {
        BackendKind::Sqlite => {
            let store = SqliteStore::open(store_path)?;
            store.replace_reports(&reports)?;
            store.replace_users(&users)?;
        }
        BackendKind::Files => {
            let store = FileStore::open(store_path)?;
            store.write_catalog("reports", &reports)?;
            store.write_catalog("users", &users)?;
        }
    }
    println!(
        "{} Imported {} reports and {} users",
        "✓".green(),
        reports.len().to_string().cyan(),
        users.len().to_string().cyan()
    );
    Ok(())
}

fn cmd_status(session: &Session) -> Result<()> {
    let cursor = session.cursor()?;
    let catalog = session.catalog();
    let (total_reports, total_users) = (catalog.total_reports(), catalog.total_users());
    let annotations = session.annotation_map()?;

    println!("Phase: {}", cursor.phase(total_reports).to_string().cyan());
    println!(
        "  Report: {} of {}",
        (cursor.report_index + 1).min(total_reports),
        total_reports
    );
    println!("  User: {} of {}", cursor.user_index + 1, total_users);
    println!("  {}", progress_bar(cursor.progress_fraction(total_reports, total_users)));
    println!("  Relevant judgments: {}", annotations.judgment_count());
    Ok(())
}

fn cmd_show(session: &Session) -> Result<()> {
    print!("{}", render_screen(&session.screen()?));
    Ok(())
}

fn report_outcome(session: &Session, outcome: Result<Outcome, LabelError>) -> Result<()> {
    match outcome {
        Ok(Outcome::Advanced { to, .. }) => {
            debug!(?to, "report_outcome: advanced");
            cmd_show(session)
        }
        Ok(Outcome::Ignored(phase)) => {
            println!("{} Nothing to do in phase {}", "-".dimmed(), phase.to_string().cyan());
            Ok(())
        }
        Err(err @ LabelError::Persistence(_)) => {
            eprintln!("{} Warning: Could not save progress to the database!", "⚠".yellow());
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn cmd_export(session: &Session, output: Option<&Path>) -> Result<()> {
    let data = session.export()?;
    let json = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => {
            fs::write(path, format!("{}\n", json)).context(format!("Failed to write {}", path.display()))?;
            println!(
                "{} Exported annotations for {} users to {}",
                "✓".green(),
                data.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}
