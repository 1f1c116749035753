use rusqlite::{Connection, ErrorCode};
use std::path::PathBuf;
use thiserror::Error;

mod entries;
mod settings;
mod spelling;
mod workouts;

pub use spelling::MAX_SESSIONS;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("SQLite error: {0}")]
    SqliteError(rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Stored record could not be (de)serialized: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid record: {0}")]
    ValidationError(String),
}

impl DatabaseError {
    /// True when the backing store itself refused the operation
    /// (full disk, read-only or locked database, unopenable file).
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, DatabaseError::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            let unavailable = matches!(
                failure.code,
                ErrorCode::DiskFull
                    | ErrorCode::ReadOnly
                    | ErrorCode::CannotOpen
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::PermissionDenied
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::OutOfMemory
            );
            if unavailable {
                return DatabaseError::StorageUnavailable(err.to_string());
            }
        }
        DatabaseError::SqliteError(err)
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        tracing::debug!(path = %db_path.display(), "opened database");

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a throwaway database that lives only as long as the value
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                journal_day     TEXT PRIMARY KEY,
                text            TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                year            INTEGER NOT NULL,
                month           INTEGER NOT NULL,
                day             INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS workouts (
                id              TEXT PRIMARY KEY,
                date            TEXT NOT NULL,
                type            TEXT NOT NULL,
                payload         TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS routines (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                exercises       TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS word_stats (
                word                TEXT PRIMARY KEY,
                attempts            INTEGER NOT NULL DEFAULT 0,
                correct             INTEGER NOT NULL DEFAULT 0,
                total_time          INTEGER NOT NULL DEFAULT 0,
                avg_time            INTEGER NOT NULL DEFAULT 0,
                struggled           INTEGER NOT NULL DEFAULT 0,
                last_attempt_time   INTEGER,
                last_attempt_date   TEXT
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                attempted       INTEGER NOT NULL,
                correct         INTEGER NOT NULL,
                accuracy        INTEGER NOT NULL,
                mode            TEXT NOT NULL,
                target_count    INTEGER,
                date            TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                app             TEXT PRIMARY KEY,
                value           TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_entries_month_day ON entries(month, day);
            CREATE INDEX IF NOT EXISTS idx_workouts_date ON workouts(date);",
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
