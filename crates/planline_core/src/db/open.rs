//! Connection bootstrap for the cache database.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Apply the tab-sharing pragmas selected by [`TabManager`].
//! - Run schema migrations before returning a usable connection.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::TabManager;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a cache database file and applies pending migrations.
///
/// Parent directories are created when missing.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, tabs: TabManager) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file tabs={}",
        tabs.as_str()
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(parent) {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=cache_dir_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    }

    let opened = Connection::open(path).map_err(Into::into);
    finish_open(opened, "file", tabs, started_at)
}

/// Opens a private in-memory cache and applies all migrations.
///
/// In-memory caches are never shared, so the tab manager is irrelevant.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");
    let opened = Connection::open_in_memory().map_err(Into::into);
    finish_open(opened, "memory", TabManager::Single, started_at)
}

fn finish_open(
    opened: DbResult<Connection>,
    mode: &str,
    tabs: TabManager,
    started_at: Instant,
) -> DbResult<Connection> {
    let result = opened.and_then(|mut conn| {
        bootstrap_connection(&mut conn, mode, tabs)?;
        Ok(conn)
    });

    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

fn bootstrap_connection(conn: &mut Connection, mode: &str, tabs: TabManager) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if mode == "file" {
        match tabs {
            // Both pragmas answer with a row.
            TabManager::Multiple => {
                conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
                conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
            }
            TabManager::Single => {
                conn.query_row("PRAGMA locking_mode = EXCLUSIVE;", [], |_| Ok(()))?;
            }
        }
    }
    apply_migrations(conn)?;
    Ok(())
}
