pub mod cli;
pub mod config;
pub mod database;
pub mod days;
pub mod models;
pub mod practice;
pub mod settings;
pub mod transfer;
pub mod utils;

pub use config::Config;
pub use database::{Database, DatabaseError};
pub use models::{Activity, Entry, Routine, Session, WordStat, Workout, WorkoutType};
pub use practice::Trainer;
pub use transfer::{ImportResult, MergeStrategy, PendingRestore, TransferError};
pub use utils::Profile;
