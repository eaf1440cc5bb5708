//! Database layer with `SeaORM` entities and the document store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - A realtime `DocumentBackend` over a SQL table
//! - Database migrations

pub mod documents;
pub mod entities;
pub mod migration;

pub use documents::SeaDocumentBackend;

use grievance_shared::config::DocumentConfig;
use grievance_shared::{AppError, AppResult};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Establishes a connection pool to the document database.
///
/// The pool connects on first use, so an unreachable server surfaces at the
/// session's readiness ping rather than here.
///
/// # Errors
///
/// Returns an error if no URL is configured or the connection cannot be established.
pub async fn connect(config: &DocumentConfig) -> AppResult<DatabaseConnection> {
    let url = config
        .url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| AppError::Configuration("document database URL is not configured".to_string()))?;

    let mut options = ConnectOptions::new(url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_lazy(true)
        .sqlx_logging(false);

    Database::connect(options)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
