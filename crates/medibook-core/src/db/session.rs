//! Session snapshot operations.

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Database, DbResult};

impl Database {
    /// Get a raw value by key.
    pub fn get_value(&self, key: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM session_state WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Set a raw value, replacing any previous one.
    pub fn set_value(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session_state (key, value, updated_at)
             VALUES (?, ?, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key. Returns whether anything was removed.
    pub fn remove_value(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM session_state WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Store a record as JSON under `key`.
    pub fn save_snapshot<T: Serialize>(&self, key: &str, record: &T) -> DbResult<()> {
        let json = serde_json::to_string(record)?;
        self.set_value(key, &json)
    }

    /// Load a JSON record stored under `key`.
    pub fn load_snapshot<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        self.get_value(key)?
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }
}
