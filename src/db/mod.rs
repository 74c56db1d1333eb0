mod error;
mod models;
mod repositories;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config;

pub use error::DatabaseError;
pub use models::*;
pub use repositories::{
    BatchRepository, NotificationRepository, PurchaseOrderRepository, UserRepository,
};

/// Initialize the database connection pool from the global config
pub async fn init_pool() -> Result<SqlitePool> {
    let config = config::get();
    connect_pool(
        &config.database.url,
        config.database.max_connections.unwrap_or(10),
        config.database.min_connections.unwrap_or(1),
    )
    .await
}

/// Connect to a SQLite database and run the embedded migrations.
/// Foreign keys are enforced per connection; batch deletion relies on the
/// schema's ON DELETE actions.
pub async fn connect_pool(url: &str, max_connections: u32, min_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
