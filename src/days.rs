//! Day arithmetic.
//!
//! The journal runs on *journal days* that turn over at noon: anything written
//! between midnight and noon still belongs to the previous day. The workout
//! tracker uses ordinary calendar days. Keep the two apart.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use thiserror::Error;

/// Hour (local time) at which a new journal day starts
pub const JOURNAL_DAY_START_HOUR: u32 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DayKeyError {
    #[error("Invalid date format: {0}")]
    Format(String),
    #[error("Invalid date: {0}")]
    OutOfRange(String),
}

/// Journal day for a local wall-clock time
pub fn journal_day_of(local: NaiveDateTime) -> NaiveDate {
    let date = local.date();
    if local.hour() < JOURNAL_DAY_START_HOUR {
        date.checked_sub_days(Days::new(1)).unwrap_or(date)
    } else {
        date
    }
}

/// Journal day for an instant, read in the instant's own time zone
pub fn journal_day_at<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    journal_day_of(instant.naive_local())
}

/// Journal day right now on the local clock
pub fn current_journal_day() -> NaiveDate {
    journal_day_of(Local::now().naive_local())
}

/// Calendar day used by the workout tracker (no noon offset)
pub fn calendar_day_of(local: NaiveDateTime) -> NaiveDate {
    local.date()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Prompt shown above the entry form
pub fn entry_message(local: NaiveDateTime) -> &'static str {
    if local.hour() < JOURNAL_DAY_START_HOUR {
        "You're writing about yesterday"
    } else {
        "You're writing about today"
    }
}

pub fn has_journal_day_passed(journal_day: NaiveDate, now: NaiveDateTime) -> bool {
    journal_day < journal_day_of(now)
}

pub fn is_journal_day_in_future(journal_day: NaiveDate, now: NaiveDateTime) -> bool {
    journal_day > journal_day_of(now)
}

/// e.g. `Wednesday, 24 January`
pub fn format_journal_day_display(journal_day: NaiveDate) -> String {
    journal_day.format("%A, %-d %B").to_string()
}

/// `YYYY-MM-DD`
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a strict `YYYY-MM-DD` key into a real calendar date
pub fn parse_day_key(key: &str) -> Result<NaiveDate, DayKeyError> {
    let bytes = key.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(DayKeyError::Format(key.to_string()));
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d").map_err(|_| DayKeyError::OutOfRange(key.to_string()))
}
