//! SQLite pool factory and migration tooling.
//!
//! The service keeps its whole state in one local SQLite file. [`connect`]
//! creates that file on first use and [`run_migrations`] brings its schema up
//! to date, so a fresh checkout only needs `bookstore serve`.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

pub mod error;
pub mod migrate;

pub use error::{DbError, DbResult};
pub use sqlx;
pub use migrate::{run_migrations, Migration};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a pooled connection to the SQLite database at `url`.
///
/// The database file is created when it does not exist yet.
pub async fn connect(url: &str, max_connections: u32) -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|source| DbError::Connect {
            url: url.to_string(),
            source,
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|source| DbError::Connect {
            url: url.to_string(),
            source,
        })?;

    tracing::info!(target: "bookstore-db", %url, max_connections, "database pool ready");
    Ok(pool)
}

/// Open a private in-memory database.
///
/// Every SQLite connection to `:memory:` sees its own database, so the pool
/// is pinned to a single connection that is never recycled.
pub async fn connect_in_memory() -> DbResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .map_err(|source| DbError::Connect {
            url: "sqlite::memory:".to_string(),
            source,
        })?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(|source| DbError::Connect {
            url: "sqlite::memory:".to_string(),
            source,
        })
}
