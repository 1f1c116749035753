use rusqlite::OptionalExtension;
use rusqlite::types::Type;

use super::{Database, DatabaseError};
use crate::models::{Session, SessionMode, WordStat};

/// Number of practice sessions kept in history
pub const MAX_SESSIONS: usize = 50;

const WORD_STAT_COLUMNS: &str =
    "word, attempts, correct, total_time, avg_time, struggled, last_attempt_time, last_attempt_date";

/// Millisecond columns are stored as SQLite integers (i64)
fn millis_from_column(row: &rusqlite::Row, idx: usize) -> Result<Option<u64>, rusqlite::Error> {
    let Some(value) = row.get::<_, Option<i64>>(idx)? else {
        return Ok(None);
    };
    u64::try_from(value)
        .map(Some)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn millis_to_column(value: u64, word: &str) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::ValidationError(format!("'{}' has an out of range time: {} ms", word, value)))
}

impl Database {
    /// Helper function to map a row to a WordStat
    fn row_to_word_stat(row: &rusqlite::Row) -> Result<WordStat, rusqlite::Error> {
        Ok(WordStat {
            word: row.get(0)?,
            attempts: row.get(1)?,
            correct: row.get(2)?,
            total_time: millis_from_column(row, 3)?.unwrap_or_default(),
            avg_time: millis_from_column(row, 4)?.unwrap_or_default(),
            struggled: row.get::<_, i64>(5)? != 0,
            last_attempt_time: millis_from_column(row, 6)?,
            last_attempt_date: row.get(7)?,
        })
    }

    /// Get the statistics for a word (case-insensitive)
    pub fn get_word_stat(&self, word: &str) -> Result<Option<WordStat>, DatabaseError> {
        let stat = self
            .conn
            .query_row(
                &format!("SELECT {} FROM word_stats WHERE word = ?1", WORD_STAT_COLUMNS),
                rusqlite::params![word.to_lowercase()],
                Self::row_to_word_stat,
            )
            .optional()?;
        Ok(stat)
    }

    /// Get statistics for every practiced word, alphabetically
    pub fn get_word_stats(&self) -> Result<Vec<WordStat>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM word_stats ORDER BY word ASC",
            WORD_STAT_COLUMNS
        ))?;
        let stats = stmt
            .query_map([], Self::row_to_word_stat)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    /// Insert or replace the statistics for a word
    pub fn put_word_stat(&self, stat: &WordStat) -> Result<(), DatabaseError> {
        if stat.correct > stat.attempts {
            return Err(DatabaseError::ValidationError(format!(
                "'{}' has more correct answers than attempts",
                stat.word
            )));
        }
        let total_time = millis_to_column(stat.total_time, &stat.word)?;
        let avg_time = millis_to_column(stat.avg_time, &stat.word)?;
        let last_attempt_time = stat
            .last_attempt_time
            .map(|ms| millis_to_column(ms, &stat.word))
            .transpose()?;
        self.conn.execute(
            "INSERT INTO word_stats (word, attempts, correct, total_time, avg_time, struggled, last_attempt_time, last_attempt_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(word) DO UPDATE SET
                attempts = excluded.attempts,
                correct = excluded.correct,
                total_time = excluded.total_time,
                avg_time = excluded.avg_time,
                struggled = excluded.struggled,
                last_attempt_time = excluded.last_attempt_time,
                last_attempt_date = excluded.last_attempt_date",
            rusqlite::params![
                stat.word.to_lowercase(),
                stat.attempts,
                stat.correct,
                total_time,
                avg_time,
                if stat.struggled { 1 } else { 0 },
                last_attempt_time,
                stat.last_attempt_date
            ],
        )?;
        Ok(())
    }

    /// Append a finished session and drop the oldest beyond [`MAX_SESSIONS`]
    pub fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO sessions (attempted, correct, accuracy, mode, target_count, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                session.attempted,
                session.correct,
                session.accuracy,
                session.mode.to_string(),
                session.target_count,
                session.date
            ],
        )?;
        let dropped = tx.execute(
            "DELETE FROM sessions WHERE id NOT IN
                (SELECT id FROM sessions ORDER BY id DESC LIMIT ?1)",
            rusqlite::params![MAX_SESSIONS as i64],
        )?;
        tx.commit()?;
        if dropped > 0 {
            tracing::debug!(dropped, "trimmed session history");
        }
        Ok(())
    }

    /// Session history, oldest first
    pub fn get_sessions(&self) -> Result<Vec<Session>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT attempted, correct, accuracy, mode, target_count, date
             FROM sessions ORDER BY id ASC",
        )?;
        let sessions = stmt
            .query_map([], |row| {
                let mode: String = row.get(3)?;
                Ok(Session {
                    attempted: row.get(0)?,
                    correct: row.get(1)?,
                    accuracy: row.get(2)?,
                    mode: mode.parse::<SessionMode>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into())
                    })?,
                    target_count: row.get(4)?,
                    date: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Forget all word statistics and session history
    pub fn reset_stats(&self) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM word_stats", [])?;
        tx.execute("DELETE FROM sessions", [])?;
        tx.commit()?;
        tracing::info!("reset spelling statistics");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_word_stat_lookup_is_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        let mut stat = WordStat::new("Rhythm");
        stat.record(false, 1200, 10_000, Utc::now());
        db.put_word_stat(&stat).unwrap();

        let loaded = db.get_word_stat("RHYTHM").unwrap().unwrap();
        assert_eq!(loaded, stat);
        assert!(db.get_word_stat("rhyme").unwrap().is_none());
    }

    #[test]
    fn test_millisecond_columns_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut stat = WordStat::new("separate");
        stat.record(true, 4_321, 10_000, Utc::now());
        db.put_word_stat(&stat).unwrap();

        let loaded = db.get_word_stat("separate").unwrap().unwrap();
        assert_eq!(loaded.total_time, 4_321);
        assert_eq!(loaded.avg_time, 4_321);
        assert_eq!(loaded.last_attempt_time, Some(4_321));
    }

    #[test]
    fn test_put_rejects_time_beyond_sqlite_integer() {
        let db = Database::open_in_memory().unwrap();
        let mut stat = WordStat::new("forever");
        stat.attempts = 1;
        stat.total_time = u64::MAX;
        assert!(matches!(
            db.put_word_stat(&stat),
            Err(DatabaseError::ValidationError(_))
        ));
        assert!(db.get_word_stat("forever").unwrap().is_none());
    }

    #[test]
    fn test_negative_stored_time_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let mut stat = WordStat::new("broken");
        stat.record(true, 100, 10_000, Utc::now());
        db.put_word_stat(&stat).unwrap();
        db.conn()
            .execute("UPDATE word_stats SET avg_time = -5 WHERE word = 'broken'", [])
            .unwrap();
        assert!(matches!(
            db.get_word_stat("broken"),
            Err(DatabaseError::SqliteError(_))
        ));
    }

    #[test]
    fn test_unknown_session_mode_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.save_session(&Session::new(3, 2, SessionMode::Fixed, Some(3))).unwrap();
        db.conn()
            .execute("UPDATE sessions SET mode = 'sprint'", [])
            .unwrap();
        assert!(matches!(db.get_sessions(), Err(DatabaseError::SqliteError(_))));
    }

    #[test]
    fn test_put_rejects_more_correct_than_attempts() {
        let db = Database::open_in_memory().unwrap();
        let mut stat = WordStat::new("their");
        stat.correct = 1;
        assert!(db.put_word_stat(&stat).is_err());
    }

    #[test]
    fn test_session_history_is_capped() {
        let db = Database::open_in_memory().unwrap();
        for attempted in 1..=(MAX_SESSIONS as u32 + 1) {
            db.save_session(&Session::new(attempted, 0, SessionMode::Continuous, None))
                .unwrap();
        }

        let sessions = db.get_sessions().unwrap();
        assert_eq!(sessions.len(), MAX_SESSIONS);
        // the first session (attempted = 1) was dropped
        assert_eq!(sessions.first().unwrap().attempted, 2);
        assert_eq!(sessions.last().unwrap().attempted, MAX_SESSIONS as u32 + 1);
    }

    #[test]
    fn test_reset_stats_clears_sessions_too() {
        let db = Database::open_in_memory().unwrap();
        db.put_word_stat(&WordStat::new("because")).unwrap();
        db.save_session(&Session::new(1, 1, SessionMode::Fixed, Some(1)))
            .unwrap();

        db.reset_stats().unwrap();
        assert!(db.get_word_stats().unwrap().is_empty());
        assert!(db.get_sessions().unwrap().is_empty());
    }
}
