//! Command-line front end for the momentum engine.
//!
//! # Responsibility
//! - Parse commands and global options.
//! - Wire SQLite storage, the heuristic classifier and the system clock into
//!   `NoteService`.
//! - Print results as JSON on stdout.

use clap::{Parser, Subcommand};
use log::error;
use momentum_core::repo::note_repo::normalize_note_limit;
use momentum_core::{
    default_log_level, init_logging, open_db, EngineConfig, HeuristicClassifier, NoteId,
    NoteListQuery, NoteService, SqliteNoteRepository, SystemClock,
};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    version = momentum_core::core_version(),
    about = "Capture notes and surface what matters."
)]
struct Args {
    /// SQLite database file.
    #[arg(long, value_name = "FILE", default_value = "momentum.db", global = true)]
    db: PathBuf,
    /// JSON engine configuration.
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Directory for rolling log files. Logging is off when omitted.
    #[arg(long, value_name = "DIR", global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze and store a new note.
    Add { text: String },
    /// List notes, newest first, one page at a time.
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        favorites: bool,
        /// Page size; defaults to 20, capped at 100.
        #[arg(long, value_name = "N")]
        limit: Option<u32>,
        #[arg(long, value_name = "N", default_value_t = 0)]
        offset: u32,
    },
    /// Show one note and record the interaction.
    Show { id: NoteId },
    /// Toggle the favorite flag.
    Favorite { id: NoteId },
    /// Record an interaction without printing the note.
    Touch { id: NoteId },
    /// Record that a resurfaced note was seen.
    Seen { id: NoteId },
    /// Rerun classification and scoring.
    Reanalyze { id: NoteId },
    Delete { id: NoteId },
    /// Notes worth revisiting now.
    Resurface {
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// Cross-note suggestions.
    Suggest {
        #[arg(long, default_value_t = 5)]
        max: usize,
    },
    Analytics,
    /// Plain-text export of one note.
    Share { id: NoteId },
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = args.log_dir.as_deref() {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, absolute(log_dir)?)?;
    }

    let config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let mut conn = open_db(&args.db)?;
    let repo = SqliteNoteRepository::try_new(&mut conn)?;
    let mut service = NoteService::new(
        repo,
        Arc::new(HeuristicClassifier),
        SystemClock,
        config,
    );

    match args.command {
        Command::Add { text } => print_json(&service.create_analyzed_note(&text)?),
        Command::List {
            category,
            favorites,
            limit,
            offset,
        } => {
            let query = NoteListQuery {
                category,
                favorites_only: favorites,
                limit: Some(normalize_note_limit(limit)),
                offset,
            };
            print_json(&service.list_notes(&query)?)
        }
        Command::Show { id } => print_json(&service.mark_interacted(id)?),
        Command::Favorite { id } => print_json(&service.toggle_favorite(id)?),
        Command::Touch { id } => {
            service.mark_interacted(id)?;
            Ok(())
        }
        Command::Seen { id } => print_json(&service.mark_resurfaced(id)?),
        Command::Reanalyze { id } => print_json(&service.reanalyze_note(id)?),
        Command::Delete { id } => {
            service.delete_note(id)?;
            Ok(())
        }
        Command::Resurface { limit } => print_json(&service.get_resurfaced(limit)?),
        Command::Suggest { max } => print_json(&service.get_suggestions(max)?),
        Command::Analytics => print_json(&service.get_analytics()?),
        Command::Share { id } => {
            println!("{}", service.share_text(id)?);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
