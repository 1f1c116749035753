use rusqlite::OptionalExtension;
use serde_json::Value;

use super::{Database, DatabaseError};

impl Database {
    /// Raw settings overrides stored for an app, if any
    pub fn get_settings_value(&self, app: &str) -> Result<Option<Value>, DatabaseError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE app = ?1",
                rusqlite::params![app],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn put_settings_value(&self, app: &str, value: &Value) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO settings (app, value) VALUES (?1, ?2)
             ON CONFLICT(app) DO UPDATE SET value = excluded.value",
            rusqlite::params![app, raw],
        )?;
        Ok(())
    }

    pub fn delete_settings_value(&self, app: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM settings WHERE app = ?1", rusqlite::params![app])?;
        Ok(())
    }
}
