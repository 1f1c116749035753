use chrono::{TimeZone, Utc};
use daybook::models::{CardioData, FreeTextData, Intensity, RoutineExercise};
use daybook::transfer::{self, BACKUP_VERSION};
use daybook::{Activity, Database, TransferError, WorkoutType};
use tempfile::TempDir;

fn day(key: &str) -> chrono::NaiveDate {
    daybook::days::parse_day_key(key).unwrap()
}

fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.save_routine(
        "Push",
        vec![
            RoutineExercise {
                name: "Bench Press".to_string(),
                target_sets: 3,
            },
            RoutineExercise {
                name: "Dips".to_string(),
                target_sets: 2,
            },
        ],
    )
    .unwrap();
    db.save_workout(
        day("2024-05-01"),
        Activity::Cardio(CardioData {
            activity_type: "Running".to_string(),
            duration: 30,
            intensity: Intensity::Hard,
        }),
    )
    .unwrap();
    db.save_workout(
        day("2024-05-01"),
        Activity::Hockey(FreeTextData {
            description: "Pickup game".to_string(),
        }),
    )
    .unwrap();
    db
}

#[test]
fn export_then_restore_into_fresh_store() {
    let source = seeded();
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let backup = transfer::export_workouts(&source, at).unwrap();
    assert_eq!(backup.version, BACKUP_VERSION);
    let json = serde_json::to_string(&backup).unwrap();

    let target = Database::open_in_memory().unwrap();
    target
        .save_workout(
            day("2020-01-01"),
            Activity::Other(FreeTextData {
                description: "to be replaced".to_string(),
            }),
        )
        .unwrap();

    let pending = transfer::prepare_workout_restore(&json).unwrap();
    assert_eq!(pending.workout_count(), 2);
    assert_eq!(pending.routine_count(), 1);
    pending.apply(&target).unwrap();

    assert_eq!(target.get_workouts().unwrap(), source.get_workouts().unwrap());
    assert_eq!(target.get_routines().unwrap(), source.get_routines().unwrap());
}

#[test]
fn backup_json_uses_camel_case_and_type_tag() {
    let db = seeded();
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let value = serde_json::to_value(transfer::export_workouts(&db, at).unwrap()).unwrap();

    assert_eq!(value["version"], 1);
    assert!(value["exportedAt"].is_string());
    let cardio = &value["workouts"][0];
    assert_eq!(cardio["type"], "cardio");
    assert_eq!(cardio["date"], "2024-05-01");
    assert_eq!(cardio["data"]["activityType"], "Running");
    assert_eq!(cardio["data"]["intensity"], "hard");
    assert!(cardio["createdAt"].is_string());
    assert_eq!(value["routines"][0]["exercises"][0]["targetSets"], 3);
}

#[test]
fn dropping_pending_restore_writes_nothing() {
    let db = seeded();
    let pending = transfer::prepare_workout_restore(r#"{"workouts": [], "routines": []}"#).unwrap();
    drop(pending);
    assert_eq!(db.get_workouts().unwrap().len(), 2);
}

#[test]
fn restore_rejects_missing_arrays_and_bad_json() {
    let db = seeded();
    assert!(matches!(
        transfer::prepare_workout_restore(r#"{"workouts": []}"#),
        Err(TransferError::InvalidFormat(_))
    ));
    assert!(matches!(
        transfer::prepare_workout_restore(r#"{"workouts": {}, "routines": []}"#),
        Err(TransferError::InvalidFormat(_))
    ));
    assert!(matches!(
        transfer::prepare_workout_restore("{not json"),
        Err(TransferError::Json(_))
    ));
    assert_eq!(db.get_workouts().unwrap().len(), 2);
}

#[test]
fn file_export_and_import() {
    let dir = TempDir::new().unwrap();
    let source = seeded();
    let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
    let path = transfer::write_workout_export(&source, dir.path(), at).unwrap();
    assert_eq!(path.file_name().unwrap(), "workout-data-2024-05-02.json");

    let target = Database::open_in_memory().unwrap();
    transfer::prepare_workout_restore_file(&path).unwrap().apply(&target).unwrap();
    assert_eq!(target.get_workouts().unwrap().len(), 2);
}

#[test]
fn deleting_routine_keeps_workouts_logged_from_it() {
    let db = seeded();
    let routine = db.get_routines().unwrap().remove(0);
    let workout = db
        .save_workout(
            day("2024-05-03"),
            Activity::Weights(daybook::models::WeightsData {
                routine_id: routine.id.clone(),
                routine_name: routine.name.clone(),
                exercises: routine.to_logged_exercises(),
                notes: String::new(),
            }),
        )
        .unwrap();

    db.delete_routine(&routine.id).unwrap();
    assert!(db.get_routine(&routine.id).unwrap().is_none());
    assert_eq!(db.get_workout(&workout.id).unwrap(), Some(workout));
}

#[test]
fn calendar_groups_distinct_types_by_date() {
    let db = seeded();
    db.save_workout(
        day("2024-05-01"),
        Activity::Hockey(FreeTextData {
            description: "Second skate".to_string(),
        }),
    )
    .unwrap();

    let dates = db.workout_dates().unwrap();
    let kinds = &dates[&day("2024-05-01")];
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&WorkoutType::Cardio));
    assert!(kinds.contains(&WorkoutType::Hockey));
}

#[test]
fn clear_removes_both_stores() {
    let db = seeded();
    db.clear_workout_data().unwrap();
    assert!(db.get_workouts().unwrap().is_empty());
    assert!(db.get_routines().unwrap().is_empty());
}

#[test]
fn non_finite_weight_is_never_stored() {
    let db = seeded();
    let routine = db.get_routines().unwrap().remove(0);
    let mut exercises = routine.to_logged_exercises();
    exercises[0].sets.push(daybook::models::SetEntry {
        weight: f64::NAN,
        reps: 5,
    });

    let result = db.save_workout(
        day("2024-05-04"),
        Activity::Weights(daybook::models::WeightsData {
            routine_id: routine.id.clone(),
            routine_name: routine.name.clone(),
            exercises,
            notes: String::new(),
        }),
    );
    assert!(matches!(result, Err(daybook::DatabaseError::ValidationError(_))));

    assert_eq!(db.get_workouts().unwrap().len(), 2);
    let at = Utc.with_ymd_and_hms(2024, 5, 4, 8, 0, 0).unwrap();
    assert!(transfer::export_workouts(&db, at).is_ok());
}
