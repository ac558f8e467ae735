//! # Database models
//!
//! Row types that map to the SQLite schema via **Diesel**.
//!
//! The relay only persists opaque key/value blobs, so there is a single table:
//!
//! - `storage_entries`: one row per persisted key (`chatbot-settings`,
//!   `chatbot-conversations`), holding a JSON document as text.
//!
//! ## Basic usage
//!
//! ```no_run
//! use diesel::prelude::*;
//! use chat_relay::schema::storage_entries;
//! use chat_relay::models::StorageEntry;
//!
//! # fn demo(conn: &mut SqliteConnection) -> Result<(), Box<dyn std::error::Error>> {
//! diesel::replace_into(storage_entries::table)
//!     .values(&StorageEntry { key: "demo".into(), value: "{}".into() })
//!     .execute(conn)?;
//! # Ok(()) }
//! ```
use diesel::prelude::*;

/// One persisted blob.
///
/// ### Table
/// - `storage_entries`
///
/// ### Notes
/// - `key` is the primary key; writes go through `REPLACE INTO` so the last
///   writer wins.
/// - `value` is never interpreted by the storage layer.
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::storage_entries)]
#[diesel(primary_key(key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StorageEntry {
    /// Fixed key the blob is stored under.
    pub key: String,
    /// Serialized document.
    pub value: String,
}
