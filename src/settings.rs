//! Per-app settings.
//!
//! Each app owns one small settings object. What is persisted is only the
//! user's overrides; reading always starts from the app defaults and lays the
//! stored values over them key by key, so a new option added to a settings
//! type picks up its default for users who never touched it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::{Database, DatabaseError};
use crate::models::WorkoutType;

/// A settings object persisted under its own key
pub trait AppSettings: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;

    /// Reject values the app cannot work with
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Journal themes, first one is the default
pub const JOURNAL_THEMES: [&str; 3] = ["vintage-sepia", "autumn-leaves", "midnight-scholar"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSettings {
    pub theme: String,
}

impl Default for JournalSettings {
    fn default() -> Self {
        Self {
            theme: JOURNAL_THEMES[0].to_string(),
        }
    }
}

impl AppSettings for JournalSettings {
    const KEY: &'static str = "journal";

    fn validate(&self) -> Result<(), String> {
        if !JOURNAL_THEMES.contains(&self.theme.as_str()) {
            return Err(format!(
                "Unknown theme '{}'. Available: {}",
                self.theme,
                JOURNAL_THEMES.join(", ")
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSettings {
    /// Activity highlighted on the calendar; `None` shows every type alike
    pub primary_activity: Option<WorkoutType>,
}

impl AppSettings for WorkoutSettings {
    const KEY: &'static str = "workout";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingSettings {
    pub enabled_lists: Vec<String>,
    /// Milliseconds; a correct answer slower than this counts as a struggle
    pub struggle_threshold: u64,
}

impl Default for SpellingSettings {
    fn default() -> Self {
        Self {
            enabled_lists: vec![
                "basic".to_string(),
                "common".to_string(),
                "misspelt".to_string(),
            ],
            struggle_threshold: 10_000,
        }
    }
}

impl AppSettings for SpellingSettings {
    const KEY: &'static str = "spelling";

    fn validate(&self) -> Result<(), String> {
        if self.enabled_lists.is_empty() {
            return Err("Please select at least one word list".to_string());
        }
        Ok(())
    }
}

/// Shallow merge: every key of `overrides` replaces the same key of `defaults`
fn merge_over(defaults: Value, overrides: Value) -> Value {
    match (defaults, overrides) {
        (Value::Object(mut base), Value::Object(top)) => {
            for (key, value) in top {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (defaults, _) => defaults,
    }
}

/// Load settings for `T`, defaults overridden by whatever is stored.
///
/// Stored overrides that no longer fit the settings type are ignored with a
/// warning and the defaults are returned.
pub fn load_settings<T: AppSettings>(db: &Database) -> Result<T, DatabaseError> {
    let Some(stored) = db.get_settings_value(T::KEY)? else {
        return Ok(T::default());
    };
    let defaults = serde_json::to_value(T::default())?;
    match serde_json::from_value::<T>(merge_over(defaults, stored)) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!(app = T::KEY, error = %e, "ignoring unreadable stored settings");
            Ok(T::default())
        }
    }
}

/// Persist the full settings object and return it
pub fn save_settings<T: AppSettings>(db: &Database, settings: T) -> Result<T, DatabaseError> {
    settings.validate().map_err(DatabaseError::ValidationError)?;
    db.put_settings_value(T::KEY, &serde_json::to_value(&settings)?)?;
    Ok(settings)
}

/// Merge a partial update into the current settings, persist, and return the
/// result
pub fn update_settings<T: AppSettings>(db: &Database, patch: Map<String, Value>) -> Result<T, DatabaseError> {
    let current = serde_json::to_value(load_settings::<T>(db)?)?;
    let merged: T = serde_json::from_value(merge_over(current, Value::Object(patch)))
        .map_err(|e| DatabaseError::ValidationError(format!("Invalid {} settings: {}", T::KEY, e)))?;
    save_settings(db, merged)
}

/// Drop stored overrides so the defaults apply again
pub fn reset_settings<T: AppSettings>(db: &Database) -> Result<T, DatabaseError> {
    db.delete_settings_value(T::KEY)?;
    Ok(T::default())
}
