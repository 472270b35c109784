use rusqlite::Connection;

use super::StorageError;

/// Stored in SQLite's `user_version` once the table exists.
const SCHEMA_VERSION: i32 = 1;

const LOCAL_STORAGE_SQL: &str = include_str!("migrations/001_local_storage.sql");

pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    tracing::info!("Creating local storage schema v{}", SCHEMA_VERSION);
    conn.execute_batch(&format!(
        "BEGIN; {LOCAL_STORAGE_SQL} PRAGMA user_version = {SCHEMA_VERSION}; COMMIT;"
    ))
    .map_err(|source| StorageError::Migration {
        version: "001",
        name: "local_storage",
        source,
    })?;
    Ok(())
}
