pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;

pub use error::{Result, StoreError};

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handle to the carpool SQLite file.
///
/// Holds only the path: every operation opens its own connection and closes
/// it when done, so there is no pool and no statement spans two operations.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let db = Self {
            path: path.to_path_buf(),
        };

        db.with_conn(|conn| {
            // WAL mode for concurrent reads across sessions
            conn.pragma_update(None, "journal_mode", "WAL")?;
            migrations::run(conn)
        })?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = Connection::open(&self.path)?;
        // The bundled SQLite enables foreign keys by default and the setting is
        // per connection. Rides may name users that do not exist.
        conn.pragma_update(None, "foreign_keys", "OFF")?;
        f(&conn)
    }
}
