use chrono::{DateTime, Utc};

use crate::database::{Database, DatabaseError};
use crate::models::{OverallStats, Session, SessionMode, WordStat};
use crate::settings::{SpellingSettings, load_settings};

/// Spelling practice bookkeeping on top of the store
pub struct Trainer<'a> {
    db: &'a Database,
    struggle_threshold: u64,
}

impl<'a> Trainer<'a> {
    /// Trainer using the struggle threshold from the stored spelling settings
    pub fn new(db: &'a Database) -> Result<Self, DatabaseError> {
        let settings: SpellingSettings = load_settings(db)?;
        Ok(Self::with_threshold(db, settings.struggle_threshold))
    }

    pub fn with_threshold(db: &'a Database, struggle_threshold: u64) -> Self {
        Self {
            db,
            struggle_threshold,
        }
    }

    pub fn struggle_threshold(&self) -> u64 {
        self.struggle_threshold
    }

    /// Record one answer for `word` and return the updated statistics
    pub fn record_attempt(&self, word: &str, was_correct: bool, elapsed_ms: u64) -> Result<WordStat, DatabaseError> {
        self.record_attempt_at(word, was_correct, elapsed_ms, Utc::now())
    }

    pub fn record_attempt_at(
        &self,
        word: &str,
        was_correct: bool,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    ) -> Result<WordStat, DatabaseError> {
        let mut stat = self
            .db
            .get_word_stat(word)?
            .unwrap_or_else(|| WordStat::new(word));
        stat.record(was_correct, elapsed_ms, self.struggle_threshold, at);
        self.db.put_word_stat(&stat)?;
        tracing::debug!(
            word = %stat.word,
            was_correct,
            elapsed_ms,
            struggled = stat.struggled,
            "recorded attempt"
        );
        Ok(stat)
    }

    /// Words from `pool` currently flagged as a struggle
    pub fn struggled_words<S: AsRef<str>>(&self, pool: &[S]) -> Result<Vec<String>, DatabaseError> {
        self.filter_pool(pool, |stat| stat.struggled)
    }

    /// Words from `pool` that were answered wrong at least once
    pub fn incorrect_words<S: AsRef<str>>(&self, pool: &[S]) -> Result<Vec<String>, DatabaseError> {
        self.filter_pool(pool, WordStat::has_misses)
    }

    fn filter_pool<S: AsRef<str>>(
        &self,
        pool: &[S],
        keep: impl Fn(&WordStat) -> bool,
    ) -> Result<Vec<String>, DatabaseError> {
        let mut words = Vec::new();
        for word in pool {
            if let Some(stat) = self.db.get_word_stat(word.as_ref())? {
                if keep(&stat) {
                    words.push(word.as_ref().to_string());
                }
            }
        }
        Ok(words)
    }

    pub fn overall_stats(&self) -> Result<OverallStats, DatabaseError> {
        Ok(OverallStats::from_stats(&self.db.get_word_stats()?))
    }

    /// Store a finished session in the capped history
    pub fn finish_session(
        &self,
        attempted: u32,
        correct: u32,
        mode: SessionMode,
        target_count: Option<u32>,
    ) -> Result<Session, DatabaseError> {
        if correct > attempted {
            return Err(DatabaseError::ValidationError(
                "a session cannot have more correct answers than attempts".to_string(),
            ));
        }
        let session = Session::new(attempted, correct, mode, target_count);
        self.db.save_session(&session)?;
        Ok(session)
    }

    pub fn reset(&self) -> Result<(), DatabaseError> {
        self.db.reset_stats()
    }
}
