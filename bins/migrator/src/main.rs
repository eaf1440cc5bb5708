//! Document table migration runner for Grievance.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Connects with the board's `document` settings.

use anyhow::{Context, bail};
use grievance_db::connect;
use grievance_db::migration::{Migrator, MigratorTrait};
use grievance_shared::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sea_orm_migration=info,grievance=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let config = AppConfig::load().context("failed to load configuration")?;
    if !config.has_remote() {
        bail!("document.url is not configured (set GRIEVANCE__DOCUMENT__URL)");
    }
    let db = connect(&config.document)
        .await
        .context("failed to connect to the document database")?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("unknown command '{other}', expected up, down, status or fresh"),
    }

    tracing::info!(command = %command, "Migration command finished");
    Ok(())
}
