//! SQLite access layer
//!
//! Pool construction (WAL journaling, busy timeout) plus the embedded
//! migrations. Query logic lives in [`store`]; row types in [`models`].

pub mod models;
pub mod store;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Open the database at `path` (creating file and parent directory if
/// missing) and apply migrations.
pub async fn connect(path: &str) -> Result<SqlitePool, BoxError> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{path}"))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .create_if_missing(true)
        .pragma("foreign_keys", "ON")
        .optimize_on_close(true, None);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Wait on write contention instead of failing immediately
    sqlx::query("PRAGMA busy_timeout = 5000;").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!(path, "Database ready (WAL mode, migrations applied)");

    Ok(pool)
}
