//! Database Connection Management
//!
//! Opens and configures the SQLite connection behind [`super::SqliteStore`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use super::schema::init_schema;
use super::sqlite_status;
use crate::store::{StoreResult, StoreStatus};

const MEMORY_PATH: &str = ":memory:";

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the database file
    pub path: PathBuf,
    /// Enable WAL mode for better concurrency
    pub wal_mode: bool,
    /// Overwrite deleted content on disk
    pub secure_delete: bool,
    /// How long to wait on a locked database before giving up
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            wal_mode: true,
            secure_delete: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConfig {
    /// Create config for in-memory database (testing)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::from(MEMORY_PATH),
            wal_mode: false,
            ..Default::default()
        }
    }

    /// Create config for a specific path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.to_str() == Some(MEMORY_PATH)
    }
}

/// Default store path (<data_dir>/keychain-kit/keychain.db)
fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keychain-kit")
        .join("keychain.db")
}

/// Open, configure and migrate a connection
pub(super) fn open_connection(config: &StoreConfig) -> StoreResult<Connection> {
    if !config.is_in_memory() {
        ensure_parent_dir(&config.path)?;
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;

    let conn = if config.is_in_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open_with_flags(&config.path, flags)
    }
    .map_err(sqlite_status)?;

    configure(&conn, config).map_err(sqlite_status)?;
    init_schema(&conn).map_err(sqlite_status)?;

    Ok(conn)
}

fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|e| {
        log::warn!("Failed to create store directory {}: {}", parent.display(), e);
        StoreStatus::IO
    })
}

fn configure(conn: &Connection, config: &StoreConfig) -> rusqlite::Result<()> {
    if config.wal_mode && !config.is_in_memory() {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }

    if config.secure_delete {
        conn.execute_batch("PRAGMA secure_delete = ON;")?;
    }

    conn.busy_timeout(config.busy_timeout)?;
    Ok(())
}
