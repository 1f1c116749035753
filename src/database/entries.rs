use chrono::NaiveDate;
use rusqlite::OptionalExtension;

use super::{Database, DatabaseError};
use crate::models::Entry;

const ENTRY_COLUMNS: &str = "journal_day, text, created_at, year, month, day";

impl Database {
    /// Helper function to map a row to an Entry
    fn row_to_entry(row: &rusqlite::Row) -> Result<Entry, rusqlite::Error> {
        Ok(Entry {
            journal_day: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
            year: row.get(3)?,
            month: row.get(4)?,
            day: row.get(5)?,
        })
    }

    /// Insert or replace the entry stored under its journal day
    pub fn put_entry(&self, entry: &Entry) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO entries (journal_day, text, created_at, year, month, day)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(journal_day) DO UPDATE SET
                text = excluded.text,
                created_at = excluded.created_at,
                year = excluded.year,
                month = excluded.month,
                day = excluded.day",
            rusqlite::params![
                entry.journal_day,
                entry.text,
                entry.created_at,
                entry.year,
                entry.month,
                entry.day
            ],
        )?;
        tracing::debug!(journal_day = %entry.journal_day, "stored journal entry");
        Ok(())
    }

    /// Write `text` for `journal_day`, replacing any previous entry, and
    /// return what was stored
    pub fn save_entry(&self, journal_day: NaiveDate, text: &str) -> Result<Entry, DatabaseError> {
        let entry = Entry::new(journal_day, text);
        self.put_entry(&entry)?;
        Ok(entry)
    }

    /// Get the entry for a journal day, if one exists
    pub fn get_entry(&self, journal_day: NaiveDate) -> Result<Option<Entry>, DatabaseError> {
        let entry = self
            .conn
            .query_row(
                &format!("SELECT {} FROM entries WHERE journal_day = ?1", ENTRY_COLUMNS),
                rusqlite::params![journal_day],
                Self::row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    pub fn entry_exists(&self, journal_day: NaiveDate) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE journal_day = ?1",
            rusqlite::params![journal_day],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get all entries ordered by journal day ASC
    pub fn get_all_entries(&self) -> Result<Vec<Entry>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM entries ORDER BY journal_day ASC",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// All journal days that have an entry, oldest first
    pub fn get_all_journal_days(&self) -> Result<Vec<NaiveDate>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT journal_day FROM entries ORDER BY journal_day ASC")?;
        let days = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<NaiveDate>, _>>()?;
        Ok(days)
    }

    /// Entries written on `month`/`day` of any year, newest year first.
    ///
    /// When `exclude` is given, the entry for that journal day is left out so
    /// the current day never shows up among its own memories.
    pub fn same_day_across_years(
        &self,
        month: u32,
        day: u32,
        exclude: Option<NaiveDate>,
    ) -> Result<Vec<Entry>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM entries WHERE month = ?1 AND day = ?2 ORDER BY year DESC",
            ENTRY_COLUMNS
        ))?;
        let entries = stmt
            .query_map(rusqlite::params![month, day], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries
            .into_iter()
            .filter(|entry| Some(entry.journal_day) != exclude)
            .collect())
    }

    /// Delete the entry for a journal day. Deleting a missing day is a no-op.
    pub fn delete_entry(&self, journal_day: NaiveDate) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM entries WHERE journal_day = ?1",
            rusqlite::params![journal_day],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove every journal entry, returning how many were deleted
    pub fn clear_entries(&self) -> Result<usize, DatabaseError> {
        let removed = self.conn.execute("DELETE FROM entries", [])?;
        tracing::info!(removed, "cleared journal entries");
        Ok(removed)
    }
}
