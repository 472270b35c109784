//! Durable client-local storage.
//!
//! A small key/value table in SQLite that plays the part a browser's local
//! storage plays for a web console: values are strings, keys are unique, and
//! the data outlives any in-memory session object.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;

const APP_NAME: &str = "agenta";
const STORAGE_FILE: &str = "storage.db";

/// Local storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Storage path has no parent directory: {0}")]
    InvalidPath(PathBuf),

    #[error("Failed to apply migration {version} ({name}): {source}")]
    Migration {
        version: &'static str,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage lock poisoned")]
    Poisoned,
}

pub struct LocalStorage {
    conn: Arc<Mutex<Connection>>,
}

impl LocalStorage {
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidPath(path.clone()))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened local storage at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn default_path() -> Result<PathBuf, StorageError> {
        let dirs = directories::ProjectDirs::from("", "", APP_NAME).ok_or(StorageError::NoDataDir)?;
        Ok(dirs.data_dir().join(STORAGE_FILE))
    }

    pub fn open_default() -> Result<Self, StorageError> {
        Self::open(Self::default_path()?)
    }

    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    // ============================================================
    // Key/value operations
    // ============================================================

    /// Read the value stored under `key`, if any.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    /// Remove `key`. Removing a missing key is not an error.
    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM local_storage WHERE key = ?", [key])?;
        Ok(())
    }
}

impl Clone for LocalStorage {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> LocalStorage {
        let storage = LocalStorage::open_memory().unwrap();
        storage.migrate().unwrap();
        storage
    }

    #[test]
    fn missing_key_reads_as_none() {
        let storage = storage();
        assert_eq!(storage.get_item("isAuth").unwrap(), None);
    }

    #[test]
    fn set_item_overwrites_previous_value() {
        let storage = storage();
        storage.set_item("isAuth", "false").unwrap();
        storage.set_item("isAuth", "true").unwrap();
        assert_eq!(storage.get_item("isAuth").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn remove_item_is_idempotent() {
        let storage = storage();
        storage.set_item("isAuth", "true").unwrap();
        storage.remove_item("isAuth").unwrap();
        storage.remove_item("isAuth").unwrap();
        assert_eq!(storage.get_item("isAuth").unwrap(), None);
    }

    #[test]
    fn clones_share_the_same_connection() {
        let storage = storage();
        let other = storage.clone();
        other.set_item("theme", "dark").unwrap();
        assert_eq!(storage.get_item("theme").unwrap().as_deref(), Some("dark"));
        storage.remove_item("theme").unwrap();
        assert_eq!(other.get_item("theme").unwrap(), None);
    }
}
