//! SQLite index store utilities.
//!
//! Runtime defaults are intentionally conservative:
//! - `journal_mode = WAL` for on-disk stores so readers never block ingestion
//! - `busy_timeout = 5s` to reduce transient lock failures under contention
//! - `foreign_keys = ON` to protect relational integrity
//!
//! Reads issued by the retrieval layer run under an optional deadline (see
//! [`with_deadline`]); an interrupted statement surfaces as
//! [`RetrievalError::RetrievalTimeout`].

pub mod fts;
pub mod introspect;
pub mod load;
pub mod schema;
pub mod vector;

use crate::config::StoreConfig;
use crate::error::{Result, RetrievalError};
use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Busy timeout used for store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Virtual machine instructions between deadline checks.
const PROGRESS_CHECK_OPS: i32 = 100;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Open (or create) the store database described by `config` and apply
/// runtime pragmas.
///
/// When `config.vector_extension` is set, `sqlite-vec` is registered before
/// the connection opens. A failed registration is logged and dense search
/// falls back to in-process cosine similarity.
///
/// # Errors
///
/// Returns an error if opening or configuring the database fails.
pub fn open_store(config: &StoreConfig) -> anyhow::Result<Connection> {
    if config.vector_extension
        && let Err(err) = relir_sqlite_vec::register_auto_extension()
    {
        warn!("sqlite-vec unavailable, dense search will use in-process cosine: {err}");
    }

    let conn = if config.path == Path::new(IN_MEMORY_PATH) {
        Connection::open_in_memory().context("open in-memory store")?
    } else {
        let path = config.path.as_path();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store directory {}", parent.display()))?;
        }
        Connection::open(path).with_context(|| format!("open store {}", path.display()))?
    };

    configure_connection(&conn).context("configure sqlite pragmas")?;
    debug!(path = %config.path.display(), "store opened");
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

/// Run `read` with an interrupt deadline installed on `conn`.
///
/// SQLite polls the deadline every few VM instructions and aborts the
/// running statement once it passes. The handler is removed before
/// returning, whatever the outcome.
///
/// # Errors
///
/// Returns [`RetrievalError::RetrievalTimeout`] when the deadline interrupts
/// the statement, or whatever `read` returns otherwise.
pub fn with_deadline<T>(
    conn: &Connection,
    table: &str,
    timeout: Option<Duration>,
    read: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    let Some(timeout) = timeout else {
        return read(conn);
    };

    let deadline = Instant::now() + timeout;
    conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= deadline));
    let outcome = read(conn);
    conn.progress_handler(0, None::<fn() -> bool>);

    match outcome {
        Err(RetrievalError::Store(err)) if is_interrupted(&err) => {
            warn!(table, ?timeout, "retrieval interrupted by deadline");
            Err(RetrievalError::RetrievalTimeout {
                table: table.to_string(),
                timeout,
            })
        }
        other => other,
    }
}

fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == rusqlite::ErrorCode::OperationInterrupted
    )
}
