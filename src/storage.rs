//! # Persistence port
//!
//! The settings and conversation stores never touch a database directly. They
//! write opaque string blobs under fixed keys through the [`Storage`] trait:
//!
//! - [`SqliteStorage`] keeps the blobs in a single `storage_entries` table via
//!   Diesel. The table is created on open if it does not exist yet.
//! - [`MemoryStorage`] keeps them in a `HashMap`, for tests and throwaway
//!   sessions.
//!
//! There are no transactions spanning more than one statement and no locking:
//! the last writer wins.

use std::collections::HashMap;

use diesel::prelude::*;
use diesel::{Connection, SqliteConnection};
use thiserror::Error;
use tracing::debug;

use crate::models::StorageEntry;
use crate::schema::storage_entries;

/// Key the settings blob is stored under.
pub const SETTINGS_KEY: &str = "chatbot-settings";

/// Key the conversation list (summaries and histories) is stored under.
pub const CONVERSATIONS_KEY: &str = "chatbot-conversations";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS storage_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
)";

/// Failures raised by a [`Storage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unable to open storage at {url}: {source}")]
    Connection {
        url: String,
        source: diesel::ConnectionError,
    },

    #[error("storage query failed: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("unable to encode blob: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A key/value persistence port.
pub trait Storage {
    /// Read the blob stored under `key`, if any.
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing whatever was there.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Drop the blob stored under `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed [`Storage`].
pub struct SqliteStorage {
    connection: SqliteConnection,
}

impl SqliteStorage {
    /// Open (or create) the database at `db_url` and make sure the table exists.
    ///
    /// # Errors
    /// Returns [`StorageError::Connection`] when the file cannot be opened and
    /// [`StorageError::Database`] when the table cannot be created.
    pub fn open(db_url: &str) -> Result<Self, StorageError> {
        let mut connection =
            SqliteConnection::establish(db_url).map_err(|source| StorageError::Connection {
                url: db_url.to_string(),
                source,
            })?;

        diesel::sql_query(CREATE_TABLE).execute(&mut connection)?;
        debug!("Storage opened at {}", db_url);

        Ok(Self { connection })
    }
}

impl Storage for SqliteStorage {
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        let entry = storage_entries::table
            .find(key)
            .select(StorageEntry::as_select())
            .first(&mut self.connection)
            .optional()?;

        Ok(entry.map(|entry| entry.value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let entry = StorageEntry {
            key: key.to_string(),
            value: value.to_string(),
        };

        diesel::replace_into(storage_entries::table)
            .values(&entry)
            .execute(&mut self.connection)?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        diesel::delete(storage_entries::table.find(key)).execute(&mut self.connection)?;
        Ok(())
    }
}

/// In-memory [`Storage`]; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&mut self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get(SETTINGS_KEY).unwrap(), None);

        storage.set(SETTINGS_KEY, "{\"a\":1}").unwrap();
        assert_eq!(
            storage.get(SETTINGS_KEY).unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        storage.remove(SETTINGS_KEY).unwrap();
        assert_eq!(storage.get(SETTINGS_KEY).unwrap(), None);

        // Removing twice is fine.
        storage.remove(SETTINGS_KEY).unwrap();
    }

    #[test]
    fn test_sqlite_storage_overwrites_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("relay.db");
        let db_url = db_path.to_str().unwrap();

        {
            let mut storage = SqliteStorage::open(db_url).unwrap();
            storage.set(CONVERSATIONS_KEY, "[]").unwrap();
            storage.set(CONVERSATIONS_KEY, "[1]").unwrap();
            storage.set(SETTINGS_KEY, "{}").unwrap();
        }

        let mut storage = SqliteStorage::open(db_url).unwrap();
        assert_eq!(
            storage.get(CONVERSATIONS_KEY).unwrap().as_deref(),
            Some("[1]")
        );
        assert_eq!(storage.get(SETTINGS_KEY).unwrap().as_deref(), Some("{}"));

        storage.remove(SETTINGS_KEY).unwrap();
        assert_eq!(storage.get(SETTINGS_KEY).unwrap(), None);
        assert_eq!(storage.get("missing").unwrap(), None);
    }

    #[test]
    fn test_sqlite_storage_bad_path() {
        let result = SqliteStorage::open("/nonexistent/dir/for/relay/test.db");
        assert!(matches!(result, Err(StorageError::Connection { .. })));
    }
}
