use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ConfigError;
use crate::database::{Database, DatabaseError};
use crate::days::{self, DayKeyError};
use crate::models::{
    Activity, CardioData, FreeTextData, Intensity, LoggedExercise, RoutineExercise, SessionMode, SetEntry,
    WeightsData, WorkoutType, validate_entry_text,
};
use crate::practice::Trainer;
use crate::settings::{
    JournalSettings, SpellingSettings, WorkoutSettings, load_settings, save_settings, update_settings,
};
use crate::transfer::{self, MergeStrategy, TransferError};

#[derive(Parser)]
#[command(name = "daybook")]
#[command(about = "Daybook - journal, workout log and spelling practice, stored locally")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// One short entry per journal day
    #[command(subcommand)]
    Journal(JournalCommand),
    /// Log and review workouts
    #[command(subcommand)]
    Workout(WorkoutCommand),
    /// Manage weight-training routines
    #[command(subcommand)]
    Routine(RoutineCommand),
    /// Spelling practice statistics
    #[command(subcommand)]
    Spelling(SpellingCommand),
}

#[derive(Subcommand)]
pub enum JournalCommand {
    /// Write the entry for the current journal day
    Write {
        /// Entry text (at most 300 characters)
        text: String,
        /// Journal day to write instead of the current one (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Show the entry for a journal day
    Show {
        /// Journal day (YYYY-MM-DD), defaults to the current one
        #[arg(value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Entries written on this calendar day in earlier years
    Memories {
        #[arg(value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// List every journal day that has an entry
    Days,
    /// Delete the entry for a journal day
    Delete {
        #[arg(value_parser = parse_date_arg)]
        date: NaiveDate,
    },
    /// Export all entries to journal-export-<date>.txt
    Export {
        /// Output directory, defaults to the configured export directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Import entries from a text file of `YYYY-MM-DD: text` lines
    Import {
        file: PathBuf,
        /// keep-existing, prefer-imported or overwrite-all
        #[arg(long, default_value = "keep-existing")]
        strategy: MergeStrategy,
    },
    /// Show or set the journal theme
    Theme { name: Option<String> },
}

#[derive(Subcommand)]
pub enum WorkoutCommand {
    /// Log a workout
    #[command(subcommand)]
    Log(LogCommand),
    /// List workouts, optionally for one date
    List {
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Dates with workouts and the activity types done on each
    Calendar,
    /// Delete a workout by id
    Delete { id: String },
    /// Export workouts and routines to workout-data-<date>.json
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace all workouts and routines with a backup file
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Delete all workouts and routines
    Clear {
        /// Required, there is no undo
        #[arg(long)]
        yes: bool,
    },
    /// Show or set the primary activity (`none` to unset)
    Primary { activity: Option<String> },
}

#[derive(Subcommand)]
pub enum LogCommand {
    Cardio {
        /// Running, Cycling, Swimming, ...
        activity: String,
        /// Minutes
        duration: u32,
        #[arg(long, default_value = "moderate")]
        intensity: Intensity,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    Weights {
        /// Routine id
        #[arg(long)]
        routine: String,
        /// A completed set as `Exercise:WEIGHTxREPS`, repeatable
        #[arg(long = "set")]
        sets: Vec<String>,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    Hockey {
        description: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    Other {
        description: String,
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
pub enum RoutineCommand {
    /// Create a routine
    Add {
        name: String,
        /// An exercise as `Name:SETS`, repeatable
        #[arg(long = "exercise", required = true)]
        exercises: Vec<String>,
    },
    List,
    /// Delete a routine; workouts logged from it are kept
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum SpellingCommand {
    /// Record one answer for a word
    Attempt {
        word: String,
        /// The answer was wrong
        #[arg(long)]
        wrong: bool,
        /// Time taken in milliseconds
        #[arg(long, default_value_t = 0)]
        time_ms: u64,
    },
    /// Overall statistics and the struggled words
    Stats,
    /// Record a finished session
    Session {
        attempted: u32,
        correct: u32,
        #[arg(long, default_value = "continuous")]
        mode: SessionMode,
        /// Target word count for fixed sessions
        #[arg(long)]
        target: Option<u32>,
    },
    /// Session history, oldest first
    Sessions,
    /// Clear all word statistics and session history
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Show or set the struggle threshold in seconds
    Threshold { seconds: Option<u64> },
    /// Show or set the enabled word lists (comma-separated)
    Lists { lists: Option<String> },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    TransferError(#[from] TransferError),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Failed to parse date: {0}")]
    DateParseError(#[from] DayKeyError),
    #[error("{0}")]
    ValidationError(String),
    #[error("Failed to read input: {0}")]
    IoError(#[from] io::Error),
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    days::parse_day_key(s).map_err(|e| e.to_string())
}

/// Parse `Bench Press:60x8` into an exercise name and a set
pub fn parse_set(s: &str) -> Result<(String, SetEntry), CliError> {
    let invalid = || CliError::ValidationError(format!("Invalid set '{}', expected Exercise:WEIGHTxREPS", s));
    let (name, set) = s.rsplit_once(':').ok_or_else(invalid)?;
    let (weight, reps) = set.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let weight: f64 = weight.trim().parse().map_err(|_| invalid())?;
    let reps: u32 = reps.trim().parse().map_err(|_| invalid())?;
    let name = name.trim();
    if name.is_empty() || !weight.is_finite() || weight < 0.0 {
        return Err(invalid());
    }
    Ok((name.to_string(), SetEntry { weight, reps }))
}

/// Parse `Squat:3` into a routine exercise
pub fn parse_routine_exercise(s: &str) -> Result<RoutineExercise, CliError> {
    let invalid = || CliError::ValidationError(format!("Invalid exercise '{}', expected Name:SETS", s));
    let (name, sets) = s.rsplit_once(':').ok_or_else(invalid)?;
    let target_sets: u32 = sets.trim().parse().map_err(|_| invalid())?;
    Ok(RoutineExercise {
        name: name.trim().to_string(),
        target_sets,
    })
}

/// Fill the routine's exercises with the given sets, appending exercises the
/// routine does not list
pub fn collect_sets(mut exercises: Vec<LoggedExercise>, sets: &[String]) -> Result<Vec<LoggedExercise>, CliError> {
    for raw in sets {
        let (name, set) = parse_set(raw)?;
        match exercises.iter_mut().find(|e| e.name.eq_ignore_ascii_case(&name)) {
            Some(exercise) => exercise.sets.push(set),
            None => exercises.push(LoggedExercise {
                name,
                target_sets: None,
                sets: vec![set],
            }),
        }
    }
    Ok(exercises)
}

fn confirm(prompt: &str) -> Result<bool, CliError> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn handle_journal(command: JournalCommand, export_dir: &Path, db: &Database) -> Result<(), CliError> {
    match command {
        JournalCommand::Write { text, date } => {
            let now = Local::now().naive_local();
            let journal_day = date.unwrap_or_else(|| days::journal_day_of(now));
            validate_entry_text(&text).map_err(CliError::ValidationError)?;
            if days::is_journal_day_in_future(journal_day, now) {
                return Err(CliError::ValidationError(format!(
                    "{} has not started yet",
                    days::day_key(journal_day)
                )));
            }
            if days::has_journal_day_passed(journal_day, now) && db.entry_exists(journal_day)? {
                return Err(CliError::ValidationError(format!(
                    "The entry for {} is already written",
                    days::day_key(journal_day)
                )));
            }
            if date.is_none() {
                println!("{}", days::entry_message(now));
            }
            let entry = db.save_entry(journal_day, &text)?;
            println!("Saved entry for {}", days::format_journal_day_display(entry.journal_day));
        }
        JournalCommand::Show { date } => {
            let journal_day = date.unwrap_or_else(days::current_journal_day);
            match db.get_entry(journal_day)? {
                Some(entry) => println!("{}", entry),
                None => println!("No entry for {}", days::day_key(journal_day)),
            }
        }
        JournalCommand::Memories { date } => {
            let journal_day = date.unwrap_or_else(days::current_journal_day);
            let memories = db.same_day_across_years(journal_day.month(), journal_day.day(), Some(journal_day))?;
            if memories.is_empty() {
                println!("No memories for {}", journal_day.format("%-d %B"));
            }
            for entry in memories {
                println!("{}", entry);
            }
        }
        JournalCommand::Days => {
            for day in db.get_all_journal_days()? {
                println!("{}", days::day_key(day));
            }
        }
        JournalCommand::Delete { date } => {
            db.delete_entry(date)?;
            println!("Deleted entry for {}", days::day_key(date));
        }
        JournalCommand::Export { dir } => {
            let dir = dir.unwrap_or_else(|| export_dir.to_path_buf());
            let (path, count) = transfer::write_journal_export(db, &dir, days::today())?;
            println!("Exported {} entries to {}", count, path.display());
        }
        JournalCommand::Import { file, strategy } => {
            let result = transfer::import_journal_file(db, &file, strategy)?;
            print!("{}", result);
        }
        JournalCommand::Theme { name } => match name {
            Some(theme) => {
                let settings = save_settings(db, JournalSettings { theme })?;
                println!("Theme set to {}", settings.theme);
            }
            None => {
                let settings: JournalSettings = load_settings(db)?;
                println!("{}", settings.theme);
            }
        },
    }
    Ok(())
}

fn log_activity(command: LogCommand, db: &Database) -> Result<(NaiveDate, Activity), CliError> {
    Ok(match command {
        LogCommand::Cardio {
            activity,
            duration,
            intensity,
            date,
        } => (
            date.unwrap_or_else(days::today),
            Activity::Cardio(CardioData {
                activity_type: activity,
                duration,
                intensity,
            }),
        ),
        LogCommand::Weights {
            routine,
            sets,
            notes,
            date,
        } => {
            let routine = db
                .get_routine(&routine)?
                .ok_or_else(|| CliError::ValidationError(format!("No routine with id {}", routine)))?;
            let exercises = collect_sets(routine.to_logged_exercises(), &sets)?;
            (
                date.unwrap_or_else(days::today),
                Activity::Weights(WeightsData {
                    routine_id: routine.id,
                    routine_name: routine.name,
                    exercises,
                    notes,
                }),
            )
        }
        LogCommand::Hockey { description, date } => (
            date.unwrap_or_else(days::today),
            Activity::Hockey(FreeTextData {
                description: description.trim().to_string(),
            }),
        ),
        LogCommand::Other { description, date } => (
            date.unwrap_or_else(days::today),
            Activity::Other(FreeTextData {
                description: description.trim().to_string(),
            }),
        ),
    })
}

pub fn handle_workout(command: WorkoutCommand, export_dir: &Path, db: &Database) -> Result<(), CliError> {
    match command {
        WorkoutCommand::Log(log) => {
            let (date, activity) = log_activity(log, db)?;
            let workout = db.save_workout(date, activity)?;
            println!("Workout logged (ID: {})", workout.id);
        }
        WorkoutCommand::List { date } => {
            let workouts = match date {
                Some(date) => db.get_workouts_by_date(date)?,
                None => db.get_workouts()?,
            };
            if workouts.is_empty() {
                println!("No workouts");
            }
            for workout in workouts {
                println!("{}", workout);
            }
        }
        WorkoutCommand::Calendar => {
            let settings: WorkoutSettings = load_settings(db)?;
            for (date, kinds) in db.workout_dates()? {
                let marker = match settings.primary_activity {
                    Some(primary) if kinds.contains(&primary) => "*",
                    _ => " ",
                };
                let kinds: Vec<String> = kinds.iter().map(ToString::to_string).collect();
                println!("{} {} {}", marker, days::day_key(date), kinds.join(", "));
            }
        }
        WorkoutCommand::Delete { id } => {
            db.delete_workout(&id)?;
            println!("Deleted workout {}", id);
        }
        WorkoutCommand::Export { dir } => {
            let dir = dir.unwrap_or_else(|| export_dir.to_path_buf());
            let path = transfer::write_workout_export(db, &dir, Utc::now())?;
            println!("Exported workout data to {}", path.display());
        }
        WorkoutCommand::Import { file, yes } => {
            let pending = transfer::prepare_workout_restore_file(&file)?;
            let prompt = format!(
                "Replace all workout data with {} workouts and {} routines?",
                pending.workout_count(),
                pending.routine_count()
            );
            if !yes && !confirm(&prompt)? {
                println!("Import cancelled");
                return Ok(());
            }
            let backup = pending.apply(db)?;
            println!(
                "Imported {} workouts and {} routines",
                backup.workouts.len(),
                backup.routines.len()
            );
        }
        WorkoutCommand::Clear { yes } => {
            if !yes {
                return Err(CliError::ValidationError(
                    "Refusing to delete all workout data without --yes".to_string(),
                ));
            }
            db.clear_workout_data()?;
            println!("All workout data deleted");
        }
        WorkoutCommand::Primary { activity } => match activity {
            Some(raw) => {
                let primary = if raw.eq_ignore_ascii_case("none") {
                    Value::Null
                } else {
                    let kind: WorkoutType = raw.parse().map_err(CliError::ValidationError)?;
                    Value::String(kind.to_string())
                };
                let mut patch = Map::new();
                patch.insert("primaryActivity".to_string(), primary);
                let settings: WorkoutSettings = update_settings(db, patch)?;
                match settings.primary_activity {
                    Some(kind) => println!("Primary activity set to {}", kind),
                    None => println!("Primary activity cleared"),
                }
            }
            None => {
                let settings: WorkoutSettings = load_settings(db)?;
                match settings.primary_activity {
                    Some(kind) => println!("{}", kind),
                    None => println!("none"),
                }
            }
        },
    }
    Ok(())
}

pub fn handle_routine(command: RoutineCommand, db: &Database) -> Result<(), CliError> {
    match command {
        RoutineCommand::Add { name, exercises } => {
            let exercises = exercises
                .iter()
                .map(|raw| parse_routine_exercise(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let routine = db.save_routine(&name, exercises)?;
            println!("Routine created (ID: {})", routine.id);
        }
        RoutineCommand::List => {
            let routines = db.get_routines()?;
            if routines.is_empty() {
                println!("No routines");
            }
            for routine in routines {
                print!("{}", routine);
            }
        }
        RoutineCommand::Delete { id } => {
            db.delete_routine(&id)?;
            println!("Deleted routine {}", id);
        }
    }
    Ok(())
}

pub fn handle_spelling(command: SpellingCommand, db: &Database) -> Result<(), CliError> {
    match command {
        SpellingCommand::Attempt { word, wrong, time_ms } => {
            let stat = Trainer::new(db)?.record_attempt(&word, !wrong, time_ms)?;
            println!(
                "{}: {}/{} correct, avg {} ms{}",
                stat.word,
                stat.correct,
                stat.attempts,
                stat.avg_time,
                if stat.struggled { ", struggling" } else { "" }
            );
        }
        SpellingCommand::Stats => {
            let trainer = Trainer::new(db)?;
            let overall = trainer.overall_stats()?;
            println!("Words practiced: {}", overall.total_practiced);
            println!("Attempts: {}", overall.total_attempts);
            println!("Correct: {}", overall.total_correct);
            println!("Accuracy: {}%", overall.overall_accuracy);
            println!("Struggled words: {}", overall.struggled_count);
            for stat in db.get_word_stats()?.iter().filter(|s| s.struggled) {
                println!("  - {} ({}/{})", stat.word, stat.correct, stat.attempts);
            }
        }
        SpellingCommand::Session {
            attempted,
            correct,
            mode,
            target,
        } => {
            let session = Trainer::new(db)?.finish_session(attempted, correct, mode, target)?;
            println!("Session saved: {}", session);
        }
        SpellingCommand::Sessions => {
            let sessions = db.get_sessions()?;
            if sessions.is_empty() {
                println!("No sessions");
            }
            for session in sessions {
                println!("{}", session);
            }
        }
        SpellingCommand::Reset { yes } => {
            if !yes && !confirm("Clear all spelling statistics?")? {
                println!("Reset cancelled");
                return Ok(());
            }
            Trainer::new(db)?.reset()?;
            println!("Spelling statistics cleared");
        }
        SpellingCommand::Threshold { seconds } => match seconds {
            Some(seconds) => {
                let millis = seconds.checked_mul(1000).ok_or_else(|| {
                    CliError::ValidationError(format!("Threshold of {} seconds is too large", seconds))
                })?;
                let mut patch = Map::new();
                patch.insert("struggleThreshold".to_string(), Value::from(millis));
                let settings: SpellingSettings = update_settings(db, patch)?;
                println!("Struggle threshold set to {} s", settings.struggle_threshold / 1000);
            }
            None => {
                let settings: SpellingSettings = load_settings(db)?;
                println!("{} s", settings.struggle_threshold / 1000);
            }
        },
        SpellingCommand::Lists { lists } => match lists {
            Some(raw) => {
                let enabled: Vec<Value> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(Value::from)
                    .collect();
                let mut patch = Map::new();
                patch.insert("enabledLists".to_string(), Value::Array(enabled));
                let settings: SpellingSettings = update_settings(db, patch)?;
                println!("Enabled lists: {}", settings.enabled_lists.join(", "));
            }
            None => {
                let settings: SpellingSettings = load_settings(db)?;
                println!("{}", settings.enabled_lists.join(", "));
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        let (name, set) = parse_set("Bench Press:62.5x8").unwrap();
        assert_eq!(name, "Bench Press");
        assert_eq!(set, SetEntry { weight: 62.5, reps: 8 });

        assert!(parse_set("Bench Press 60x8").is_err());
        assert!(parse_set("Bench:60").is_err());
        assert!(parse_set(":60x8").is_err());
        assert!(parse_set("Squat:NaNx5").is_err());
        assert!(parse_set("Squat:infx5").is_err());
        assert!(parse_set("Squat:-20x5").is_err());
    }

    #[test]
    fn test_threshold_overflow_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let result = handle_spelling(
            SpellingCommand::Threshold {
                seconds: Some(u64::MAX / 10),
            },
            &db,
        );
        assert!(matches!(result, Err(CliError::ValidationError(_))));

        let settings: SpellingSettings = load_settings(&db).unwrap();
        assert_eq!(settings.struggle_threshold, 10_000);

        handle_spelling(SpellingCommand::Threshold { seconds: Some(4) }, &db).unwrap();
        let settings: SpellingSettings = load_settings(&db).unwrap();
        assert_eq!(settings.struggle_threshold, 4_000);
    }

    #[test]
    fn test_free_text_descriptions_are_trimmed() {
        let db = Database::open_in_memory().unwrap();
        let (_, activity) = log_activity(
            LogCommand::Hockey {
                description: "  Pickup game \n".to_string(),
                date: None,
            },
            &db,
        )
        .unwrap();
        assert_eq!(
            activity,
            Activity::Hockey(FreeTextData {
                description: "Pickup game".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_routine_exercise() {
        let exercise = parse_routine_exercise("Squat : 3").unwrap();
        assert_eq!(exercise.name, "Squat");
        assert_eq!(exercise.target_sets, 3);
        assert!(parse_routine_exercise("Squat").is_err());
    }

    #[test]
    fn test_collect_sets_matches_routine_exercises() {
        let base = vec![LoggedExercise {
            name: "Squat".to_string(),
            target_sets: Some(3),
            sets: Vec::new(),
        }];
        let sets = vec![
            "squat:100x5".to_string(),
            "Squat:100x5".to_string(),
            "Curl:12x10".to_string(),
        ];
        let exercises = collect_sets(base, &sets).unwrap();
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].sets.len(), 2);
        assert_eq!(exercises[1].name, "Curl");
        assert_eq!(exercises[1].target_sets, None);
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "daybook",
            "--dev",
            "journal",
            "import",
            "notes.txt",
            "--strategy",
            "prefer-imported",
        ])
        .unwrap();
        assert!(cli.dev);
        match cli.command {
            Commands::Journal(JournalCommand::Import { strategy, .. }) => {
                assert_eq!(strategy, MergeStrategy::PreferImported)
            }
            _ => panic!("expected journal import"),
        }

        assert!(Cli::try_parse_from(["daybook", "journal", "show", "2024-13-45"]).is_err());
    }

    #[test]
    fn test_write_refuses_past_day_with_entry() {
        let db = Database::open_in_memory().unwrap();
        let past = days::parse_day_key("2020-05-01").unwrap();
        db.save_entry(past, "first").unwrap();

        let result = handle_journal(
            JournalCommand::Write {
                text: "second".to_string(),
                date: Some(past),
            },
            Path::new("."),
            &db,
        );
        assert!(matches!(result, Err(CliError::ValidationError(_))));
        assert_eq!(db.get_entry(past).unwrap().unwrap().text, "first");
    }

    #[test]
    fn test_weights_log_uses_routine() {
        let db = Database::open_in_memory().unwrap();
        let routine = db
            .save_routine(
                "Legs",
                vec![RoutineExercise {
                    name: "Squat".to_string(),
                    target_sets: 3,
                }],
            )
            .unwrap();

        let (_, activity) = log_activity(
            LogCommand::Weights {
                routine: routine.id.clone(),
                sets: vec!["Squat:80x5".to_string()],
                notes: String::new(),
                date: None,
            },
            &db,
        )
        .unwrap();
        match activity {
            Activity::Weights(data) => {
                assert_eq!(data.routine_name, "Legs");
                assert_eq!(data.exercises[0].sets, vec![SetEntry { weight: 80.0, reps: 5 }]);
            }
            other => panic!("unexpected activity {:?}", other),
        }

        assert!(log_activity(
            LogCommand::Weights {
                routine: "missing".to_string(),
                sets: Vec::new(),
                notes: String::new(),
                date: None,
            },
            &db,
        )
        .is_err());
    }
}
