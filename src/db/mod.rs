//! Database initialization and migration runner.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to open the shared SQLite pool and make sure the
//! `live_chat` table exists before the router accepts traffic. The migration
//! only uses `IF NOT EXISTS` statements, so running it against an archive
//! created by an earlier build is a no-op.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::settings::env_parse;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

fn db_max_connections() -> u32 {
    env_parse("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)
}

/// Open the SQLite pool at `database_url` and run migrations.
///
/// The database file is created when missing.
///
/// # Errors
///
/// Returns an error if the URL is malformed, the connection fails, or the
/// migrations fail.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(db_max_connections())
        .connect_with(options)
        .await?;

    init(&pool).await?;

    Ok(pool)
}

/// Ensure the archive schema exists. Safe to call repeatedly.
///
/// # Errors
///
/// Returns an error if a migration statement fails.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("src/db/migrations").run(pool).await?;
    Ok(())
}

/// Private in-memory database with the schema applied.
///
/// Single connection: every pool gets its own database.
#[cfg(test)]
pub async fn init_memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::new().in_memory(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory sqlite should open");
    init(&pool).await.expect("migrations should apply");
    pool
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
