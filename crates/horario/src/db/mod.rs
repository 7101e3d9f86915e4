/// Key/value persistence for the selection, manual courses and the course snapshot

mod memory;
mod types;

pub use memory::MemoryStore;
pub use types::StoreKey;

use crate::schedule::ScheduleError;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, warn};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)";

const UPSERT_SQL: &str = "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

/// A string-keyed store of JSON strings.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ScheduleError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ScheduleError>;

    /// Writes every entry or none of them.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ScheduleError>;
}

/// SQLite-backed store with a single `kv` table.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and initializes the schema
    pub fn open(path: &Path) -> Result<Self, ScheduleError> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database
    pub fn in_memory() -> Result<Self, ScheduleError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ScheduleError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ScheduleError> {
        self.db.lock().map_err(|_| ScheduleError::Store {
            message: "database connection lock poisoned".to_string(),
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScheduleError> {
        let db = self.conn()?;
        let value = db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ScheduleError> {
        let db = self.conn()?;
        db.execute(UPSERT_SQL, (key, value))?;
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), ScheduleError> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;
        for &(key, value) in entries {
            tx.execute(UPSERT_SQL, (key, value))?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Reads and decodes `key`, falling back to `T::default()` when the value is
/// absent, unreadable or not valid JSON for `T`.
pub fn load_or_default<T>(store: &dyn KeyValueStore, key: StoreKey) -> T
where
    T: DeserializeOwned + Default,
{
    match store.get(key.as_str()) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored value is corrupt, using default");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            error!(key = %key, error = %e, "Failed to read from store, using default");
            T::default()
        }
    }
}

/// Encodes and writes `value` under `key`. Failures are logged and reported
/// as `false`; they never abort the caller.
pub fn save<T>(store: &dyn KeyValueStore, key: StoreKey, value: &T) -> bool
where
    T: Serialize + ?Sized,
{
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(e) => {
            error!(key = %key, error = %e, "Failed to encode value for store");
            return false;
        }
    };

    match store.set(key.as_str(), &encoded) {
        Ok(()) => true,
        Err(e) => {
            error!(key = %key, error = %e, "Failed to write to store");
            false
        }
    }
}

/// Encodes `value` for storage under `key`.
pub fn encode<T>(key: StoreKey, value: &T) -> Result<String, ScheduleError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).map_err(|e| ScheduleError::Store {
        message: format!("failed to encode {key}: {e}"),
    })
}

/// Writes several already-encoded values in one atomic store operation.
pub fn save_all(store: &dyn KeyValueStore, entries: &[(StoreKey, String)]) -> Result<(), ScheduleError> {
    let raw: Vec<(&str, &str)> = entries
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    store.set_many(&raw).map_err(|e| {
        error!(keys = entries.len(), error = %e, "Failed to write to store, nothing was saved");
        e
    })
}
