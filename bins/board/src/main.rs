//! Grievance complaint board.
//!
//! Interactive terminal host: connects the document database and file storage
//! from configuration, falls back to a local session when they are missing or
//! unreachable, and reads commands from stdin. Logs go to stderr.

mod command;
mod view;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use grievance_core::attachment::{FileSelection, PendingFile};
use grievance_core::lifecycle::DeleteOutcome;
use grievance_core::storage::{StorageConfig, StorageService};
use grievance_core::{Session, SessionSettings};
use grievance_db::migration::{Migrator, MigratorTrait};
use grievance_db::{SeaDocumentBackend, connect};
use grievance_shared::AppConfig;
use grievance_shared::config::LoggingConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use command::{Command, HELP, ISSUE_TYPES};
use view::{TerminalConfirm, TerminalNotifier, TerminalRenderer, format_file_size, render_board};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let remote = open_documents(&config).await;
    let storage = open_storage(&config);

    let session = Session::open(
        remote,
        storage,
        SessionSettings::from(&config.board),
        Arc::new(TerminalRenderer),
        Arc::new(TerminalNotifier),
    )
    .await?;

    info!(mode = %session.mode(), attachments = session.attachments_enabled(), "Board ready");
    println!("Type 'help' for commands.");

    run(&session).await?;

    session.close();
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.as_str().into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

/// Builds the document backend, if one is configured.
async fn open_documents(config: &AppConfig) -> Option<SeaDocumentBackend> {
    if !config.has_remote() {
        return None;
    }

    let db = match connect(&config.document).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(error = %err, "Invalid document database settings");
            return None;
        }
    };

    if config.document.run_migrations {
        if let Err(err) = Migrator::up(&db, None).await {
            tracing::warn!(error = %err, "Could not apply document migrations");
        }
    }

    let poll_interval = Duration::from_millis(config.document.poll_interval_ms);
    Some(SeaDocumentBackend::new(db).with_poll_interval(poll_interval))
}

/// Builds the storage service, if a provider is configured.
fn open_storage(config: &AppConfig) -> Option<StorageService> {
    let storage_config = StorageConfig::from_settings(&config.storage)?;
    match StorageService::from_config(storage_config) {
        Ok(storage) => Some(storage),
        Err(err) => {
            tracing::error!(error = %err, "Invalid file storage settings");
            None
        }
    }
}

async fn run(session: &Session<SeaDocumentBackend>) -> anyhow::Result<()> {
    let mut selection = FileSelection::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = tokio::task::block_in_place(|| io::stdin().lock().read_line(&mut line))?;
        if read == 0 {
            break;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        match command {
            Command::Empty => {}
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::List => println!("{}", render_board(&session.complaints(), chrono::Utc::now())),
            Command::Attach(path) => attach(&mut selection, &path).await,
            Command::Files => show_files(&selection),
            Command::Unattach(index) => match selection.remove(index) {
                Some(file) => println!("Removed {}", file.name),
                None => println!("No file number {}", index + 1),
            },
            Command::Post(form) => {
                if !form.issue_type.is_empty() && !ISSUE_TYPES.contains(&form.issue_type.as_str()) {
                    tracing::debug!(issue = %form.issue_type, "Unlisted issue type");
                }
                // Staged files are kept until a post goes through
                if session.submit(&form, selection.files().to_vec()).await.is_ok() {
                    selection.clear();
                }
            }
            Command::Resolve(id) => {
                let _ = session.toggle_resolved(&id).await;
            }
            Command::Delete(id) => {
                if let Ok(DeleteOutcome::Cancelled) = session.delete(&id, &TerminalConfirm).await {
                    println!("Delete cancelled.");
                }
            }
            Command::TestStorage => {
                if let Ok(url) = session.test_storage().await {
                    println!("Probe object was reachable at {url}");
                }
            }
        }
    }

    Ok(())
}

async fn attach(selection: &mut FileSelection, path: &str) {
    let path = Path::new(path);
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            println!("Cannot read {}: {err}", path.display());
            return;
        }
    };

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let file = PendingFile::new(name.clone(), content_type, bytes);
    if selection.add([file]) > 0 {
        println!("Skipped {name}: only images and audio can be attached");
    } else {
        println!("Attached {name} ({} files staged)", selection.len());
    }
}

fn show_files(selection: &FileSelection) {
    if selection.is_empty() {
        println!("No files staged.");
        return;
    }
    for (index, file) in selection.files().iter().enumerate() {
        println!(
            "  {}. {} ({}, {})",
            index + 1,
            file.name,
            file.content_type,
            format_file_size(file.size())
        );
    }
}
