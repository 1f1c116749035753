//! Backup and restore.
//!
//! The journal exports to a flat text file, one `YYYY-MM-DD: text` line per
//! entry, and imports the same format with a choice of [`MergeStrategy`].
//! The workout tracker exports both of its stores to one JSON document and
//! restores by replacing everything.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::days::{DayKeyError, day_key, parse_day_key};
use crate::models::{MAX_ENTRY_CHARS, Routine, Workout};

/// Current version tag written into workout backups
pub const BACKUP_VERSION: u32 = 1;

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2}):\s*(.+)$").expect("journal line pattern is valid")
});

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to read or write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// What to do when an imported entry lands on a day that already has one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Leave existing entries alone
    #[default]
    KeepExisting,
    /// Imported entries replace existing ones
    PreferImported,
    /// Every imported entry is written. Entries missing from the file are
    /// kept, so for one-entry-per-day data this behaves like
    /// `PreferImported`.
    OverwriteAll,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeStrategy::KeepExisting => write!(f, "keep-existing"),
            MergeStrategy::PreferImported => write!(f, "prefer-imported"),
            MergeStrategy::OverwriteAll => write!(f, "overwrite-all"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep-existing" => Ok(MergeStrategy::KeepExisting),
            "prefer-imported" => Ok(MergeStrategy::PreferImported),
            "overwrite-all" => Ok(MergeStrategy::OverwriteAll),
            _ => Err(format!(
                "Invalid merge strategy '{}'. Valid options: keep-existing, prefer-imported, overwrite-all",
                s
            )),
        }
    }
}

/// Outcome of a journal import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// Non-blank lines seen
    pub total: usize,
    pub imported: usize,
    /// Writes that replaced an existing entry
    pub overwritten: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl fmt::Display for ImportResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total lines: {}", self.total)?;
        writeln!(f, "Imported: {}", self.imported)?;
        if self.overwritten > 0 {
            writeln!(f, "Overwritten: {}", self.overwritten)?;
        }
        if self.skipped > 0 {
            writeln!(f, "Skipped: {}", self.skipped)?;
        }
        if !self.errors.is_empty() {
            writeln!(f, "Errors:")?;
            for error in &self.errors {
                writeln!(f, "  - {}", error)?;
            }
        }
        Ok(())
    }
}

/// A line that passed validation and is ready to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub journal_day: NaiveDate,
    pub text: String,
}

/// Lines of a journal file split into valid entries and error messages
#[derive(Debug, Default)]
pub struct ParsedJournal {
    pub total: usize,
    pub entries: Vec<ParsedLine>,
    pub errors: Vec<String>,
}

fn preview(line: &str) -> String {
    let head: String = line.chars().take(50).collect();
    format!("{}...", head)
}

fn parse_line(line: &str) -> Result<ParsedLine, String> {
    let caps = LINE_PATTERN
        .captures(line)
        .ok_or_else(|| format!("Invalid format: {}", preview(line)))?;
    let key = &caps[1];
    let text = &caps[2];

    let journal_day = parse_day_key(key).map_err(|e| match e {
        DayKeyError::Format(_) => format!("Invalid date format: {}", key),
        DayKeyError::OutOfRange(_) => format!("Invalid date: {}", key),
    })?;

    let len = text.chars().count();
    if len > MAX_ENTRY_CHARS {
        return Err(format!("Entry too long ({} chars): {}", len, key));
    }
    if text.trim().is_empty() {
        return Err(format!("Empty entry: {}", key));
    }

    Ok(ParsedLine {
        journal_day,
        text: text.to_string(),
    })
}

/// Validate every non-blank line without touching the store
pub fn parse_journal(content: &str) -> ParsedJournal {
    let mut parsed = ParsedJournal::default();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        parsed.total += 1;
        match parse_line(line) {
            Ok(entry) => parsed.entries.push(entry),
            Err(message) => parsed.errors.push(message),
        }
    }
    parsed
}

/// Import journal text into the store.
///
/// All lines are validated first; only then are the valid ones merged one by
/// one. A failed write is recorded in `errors` and the import carries on, so
/// the write phase is not atomic as a whole.
pub fn import_journal(db: &Database, content: &str, strategy: MergeStrategy) -> ImportResult {
    let parsed = parse_journal(content);
    let mut result = ImportResult {
        total: parsed.total,
        errors: parsed.errors,
        ..Default::default()
    };

    for line in parsed.entries {
        let key = day_key(line.journal_day);
        let existed = match db.entry_exists(line.journal_day) {
            Ok(existed) => existed,
            Err(e) => {
                result.errors.push(format!("Failed to import {}: {}", key, e));
                continue;
            }
        };

        if existed && strategy == MergeStrategy::KeepExisting {
            continue;
        }

        match db.save_entry(line.journal_day, &line.text) {
            Ok(_) => {
                result.imported += 1;
                if existed {
                    result.overwritten += 1;
                }
            }
            Err(e) => {
                tracing::warn!(journal_day = %key, error = %e, "journal import write failed");
                result.errors.push(format!("Failed to import {}: {}", key, e));
            }
        }
    }

    result.skipped = result.total - result.imported - result.errors.len();
    tracing::info!(
        strategy = %strategy,
        total = result.total,
        imported = result.imported,
        overwritten = result.overwritten,
        skipped = result.skipped,
        errors = result.errors.len(),
        "journal import finished"
    );
    result
}

/// Read a journal file and import it. Failing to read the file aborts the
/// whole import.
pub fn import_journal_file(db: &Database, path: &Path, strategy: MergeStrategy) -> Result<ImportResult, TransferError> {
    let content = fs::read_to_string(path)?;
    Ok(import_journal(db, &content, strategy))
}

/// Every entry as `YYYY-MM-DD: text` lines, oldest day first
pub fn export_journal(db: &Database) -> Result<String, DatabaseError> {
    let mut entries = db.get_all_entries()?;
    entries.sort_by_key(|entry| entry.journal_day);
    Ok(entries
        .iter()
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn journal_export_filename(date: NaiveDate) -> String {
    format!("journal-export-{}.txt", day_key(date))
}

/// Write the journal export into `dir`, returning the file path and the
/// number of entries written
pub fn write_journal_export(db: &Database, dir: &Path, date: NaiveDate) -> Result<(PathBuf, usize), TransferError> {
    let content = export_journal(db)?;
    let count = if content.is_empty() { 0 } else { content.lines().count() };
    let path = dir.join(journal_export_filename(date));
    fs::write(&path, content)?;
    tracing::info!(path = %path.display(), count, "exported journal");
    Ok((path, count))
}

/// Full workout tracker backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutBackup {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub workouts: Vec<Workout>,
    pub routines: Vec<Routine>,
}

pub fn export_workouts(db: &Database, exported_at: DateTime<Utc>) -> Result<WorkoutBackup, DatabaseError> {
    Ok(WorkoutBackup {
        version: BACKUP_VERSION,
        exported_at: Some(exported_at),
        workouts: db.get_workouts()?,
        routines: db.get_routines()?,
    })
}

pub fn workout_export_filename(date: NaiveDate) -> String {
    format!("workout-data-{}.json", day_key(date))
}

/// Write the workout backup into `dir` as pretty JSON
pub fn write_workout_export(db: &Database, dir: &Path, exported_at: DateTime<Utc>) -> Result<PathBuf, TransferError> {
    let backup = export_workouts(db, exported_at)?;
    let path = dir.join(workout_export_filename(exported_at.date_naive()));
    fs::write(&path, serde_json::to_string_pretty(&backup)?)?;
    tracing::info!(
        path = %path.display(),
        workouts = backup.workouts.len(),
        routines = backup.routines.len(),
        "exported workout data"
    );
    Ok(path)
}

/// A parsed backup waiting for the user to confirm the replacement.
///
/// Nothing is written until [`PendingRestore::apply`] is called; dropping the
/// value cancels the restore.
#[derive(Debug)]
pub struct PendingRestore {
    backup: WorkoutBackup,
}

impl PendingRestore {
    pub fn workout_count(&self) -> usize {
        self.backup.workouts.len()
    }

    pub fn routine_count(&self) -> usize {
        self.backup.routines.len()
    }

    pub fn backup(&self) -> &WorkoutBackup {
        &self.backup
    }

    /// Replace all workouts and routines with the backup's contents
    pub fn apply(self, db: &Database) -> Result<WorkoutBackup, TransferError> {
        db.replace_workout_data(&self.backup.workouts, &self.backup.routines)?;
        Ok(self.backup)
    }
}

/// Parse and check a workout backup document.
///
/// The document must be a JSON object with `workouts` and `routines` arrays.
pub fn prepare_workout_restore(content: &str) -> Result<PendingRestore, TransferError> {
    let value: Value = serde_json::from_str(content)?;
    let has_array = |field: &str| value.get(field).is_some_and(Value::is_array);
    if !has_array("workouts") || !has_array("routines") {
        return Err(TransferError::InvalidFormat(
            "expected `workouts` and `routines` arrays".to_string(),
        ));
    }

    let backup: WorkoutBackup = serde_json::from_value(value)?;
    if backup.version != BACKUP_VERSION {
        tracing::warn!(
            version = backup.version,
            expected = BACKUP_VERSION,
            "restoring workout backup with unexpected version"
        );
    }
    Ok(PendingRestore { backup })
}

pub fn prepare_workout_restore_file(path: &Path) -> Result<PendingRestore, TransferError> {
    let content = fs::read_to_string(path)?;
    prepare_workout_restore(&content)
}
