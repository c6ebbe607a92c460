//! Maintenance CLI over the GoodNotes data directory.
//!
//! # Responsibility
//! - Expose index rebuild and read-only inspection of notes, action items and
//!   settings without running the API server.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use goodnotes_core::{
    init_from_config, open_service, ActionItemRepository, AppConfig, NoteDetail, NoteRepository,
    SettingsRepository, SettingsStore,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "goodnotes", version, about = "GoodNotes data maintenance")]
struct Cli {
    /// Data directory; defaults to GOODNOTES_BASE_DIR or ~/Documents/GoodNotes.
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rescan the notes tree and rewrite the note index.
    Reindex,
    /// List notes, newest first.
    Notes {
        /// Only notes created on this day (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print one note with its action items.
    Show { id: String },
    /// Oldest incomplete action items.
    Todo {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Print the current settings.
    Settings,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    config
        .ensure_directories()
        .context("failed to prepare data directory")?;
    init_from_config(&config).context("failed to start logging")?;
    info!(
        "event=cli_start module=cli status=ok base_dir={}",
        config.base_dir.display()
    );

    let service = open_service(&config);
    match cli.command {
        Command::Reindex => {
            let count = service.notes().rebuild_index()?;
            println!("indexed {count} notes");
        }
        Command::Notes { date } => {
            let notes = match date {
                Some(date) => service.list_by_date(date)?,
                None => service.list()?,
            };
            for detail in &notes {
                println!(
                    "{}  {}  {}",
                    detail.note.id,
                    detail.note.created_at.format("%Y-%m-%d %H:%M"),
                    detail.note.title
                );
            }
        }
        Command::Show { id } => match service.get(&id)? {
            Some(detail) => print_detail(&detail),
            None => bail!("note not found: {id}"),
        },
        Command::Todo { limit } => {
            for item in service.action_items().list_incomplete(Some(limit))? {
                let note = item.note_id.as_deref().unwrap_or("-");
                println!("{}  {}  (note: {note})", item.id, item.title);
            }
        }
        Command::Settings => {
            let store = SettingsStore::open(&config.settings_file, config.settings_defaults());
            let settings = store.get()?;
            println!(
                "notes_directory: {}",
                settings.notes_directory.as_deref().unwrap_or("-")
            );
            println!(
                "search_url: {}",
                settings.search_url.as_deref().unwrap_or("-")
            );
            println!("search_enabled: {}", settings.search_enabled);
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match cli.base_dir.as_ref() {
        Some(dir) => AppConfig::with_base_dir(absolute(dir)?),
        None => AppConfig::from_env().context("failed to read configuration")?,
    };
    if let Some(level) = cli.log_level.as_ref() {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn absolute(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve current directory")?;
    Ok(cwd.join(dir))
}

fn print_detail(detail: &NoteDetail) {
    let note = &detail.note;
    println!("# {}", note.title);
    println!("id: {}", note.id);
    println!("created: {}", note.created_at.to_rfc3339());
    if let Some(start) = note.meeting_start_time {
        println!("meeting: {}", start.to_rfc3339());
    }
    if !note.attendees.is_empty() {
        println!("attendees: {}", note.attendees.join(", "));
    }
    println!();
    println!("{}", note.content);
    if !detail.action_items.is_empty() {
        println!();
        for item in &detail.action_items {
            let mark = if item.completed { "x" } else { " " };
            println!("- [{mark}] {}", item.title);
        }
    }
}
