use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;

use super::{Database, DatabaseError};
use crate::models::{Activity, Routine, RoutineExercise, Workout, WorkoutType};

struct WorkoutRow {
    id: String,
    date: NaiveDate,
    payload: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<WorkoutRow> for Workout {
    type Error = DatabaseError;

    fn try_from(row: WorkoutRow) -> Result<Self, Self::Error> {
        Ok(Workout {
            id: row.id,
            date: row.date,
            activity: serde_json::from_str(&row.payload)?,
            created_at: row.created_at,
        })
    }
}

struct RoutineRow {
    id: String,
    name: String,
    exercises: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoutineRow> for Routine {
    type Error = DatabaseError;

    fn try_from(row: RoutineRow) -> Result<Self, Self::Error> {
        Ok(Routine {
            id: row.id,
            name: row.name,
            exercises: serde_json::from_str(&row.exercises)?,
            created_at: row.created_at,
        })
    }
}

fn row_to_workout(row: &rusqlite::Row) -> Result<WorkoutRow, rusqlite::Error> {
    Ok(WorkoutRow {
        id: row.get(0)?,
        date: row.get(1)?,
        payload: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn row_to_routine(row: &rusqlite::Row) -> Result<RoutineRow, rusqlite::Error> {
    Ok(RoutineRow {
        id: row.get(0)?,
        name: row.get(1)?,
        exercises: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn query_workouts(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Workout>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, row_to_workout)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(Workout::try_from).collect()
}

fn write_workout(conn: &Connection, workout: &Workout) -> Result<(), DatabaseError> {
    let payload = serde_json::to_string(&workout.activity)?;
    conn.execute(
        "INSERT INTO workouts (id, date, type, payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            date = excluded.date,
            type = excluded.type,
            payload = excluded.payload,
            created_at = excluded.created_at",
        rusqlite::params![
            workout.id,
            workout.date,
            workout.kind().to_string(),
            payload,
            workout.created_at
        ],
    )?;
    Ok(())
}

fn write_routine(conn: &Connection, routine: &Routine) -> Result<(), DatabaseError> {
    let exercises = serde_json::to_string(&routine.exercises)?;
    conn.execute(
        "INSERT INTO routines (id, name, exercises, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            exercises = excluded.exercises,
            created_at = excluded.created_at",
        rusqlite::params![routine.id, routine.name, exercises, routine.created_at],
    )?;
    Ok(())
}

impl Database {
    /// Insert or replace a workout by id
    pub fn put_workout(&self, workout: &Workout) -> Result<(), DatabaseError> {
        write_workout(&self.conn, workout)
    }

    /// Log a new workout on `date`, assigning a fresh id
    pub fn save_workout(&self, date: NaiveDate, activity: Activity) -> Result<Workout, DatabaseError> {
        activity.validate().map_err(DatabaseError::ValidationError)?;
        let workout = Workout::new(date, activity);
        self.put_workout(&workout)?;
        tracing::debug!(id = %workout.id, date = %workout.date, kind = %workout.kind(), "logged workout");
        Ok(workout)
    }

    /// Replace the payload of an existing workout.
    ///
    /// Returns `None` when no workout has that id.
    pub fn update_workout(&self, id: &str, activity: Activity) -> Result<Option<Workout>, DatabaseError> {
        activity.validate().map_err(DatabaseError::ValidationError)?;
        let Some(mut workout) = self.get_workout(id)? else {
            return Ok(None);
        };
        workout.activity = activity;
        self.put_workout(&workout)?;
        Ok(Some(workout))
    }

    pub fn get_workout(&self, id: &str) -> Result<Option<Workout>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, date, payload, created_at FROM workouts WHERE id = ?1",
                rusqlite::params![id],
                row_to_workout,
            )
            .optional()?;
        row.map(Workout::try_from).transpose()
    }

    /// Get all workouts in the order they were logged
    pub fn get_workouts(&self) -> Result<Vec<Workout>, DatabaseError> {
        query_workouts(
            &self.conn,
            "SELECT id, date, payload, created_at FROM workouts ORDER BY rowid ASC",
            [],
        )
    }

    /// Workouts logged on a calendar day
    pub fn get_workouts_by_date(&self, date: NaiveDate) -> Result<Vec<Workout>, DatabaseError> {
        query_workouts(
            &self.conn,
            "SELECT id, date, payload, created_at FROM workouts WHERE date = ?1 ORDER BY rowid ASC",
            rusqlite::params![date],
        )
    }

    /// Calendar days with at least one workout, mapped to the distinct
    /// activity types logged that day in first-seen order.
    ///
    /// Days are plain calendar dates; there is no noon offset here.
    pub fn workout_dates(&self) -> Result<BTreeMap<NaiveDate, Vec<WorkoutType>>, DatabaseError> {
        let mut dates: BTreeMap<NaiveDate, Vec<WorkoutType>> = BTreeMap::new();
        for workout in self.get_workouts()? {
            let kinds = dates.entry(workout.date).or_default();
            if !kinds.contains(&workout.kind()) {
                kinds.push(workout.kind());
            }
        }
        Ok(dates)
    }

    /// Delete a workout by id. Deleting a missing id is a no-op.
    pub fn delete_workout(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM workouts WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(())
    }

    /// Insert or replace a routine by id
    pub fn put_routine(&self, routine: &Routine) -> Result<(), DatabaseError> {
        write_routine(&self.conn, routine)
    }

    /// Create a routine, assigning a fresh id
    pub fn save_routine(&self, name: &str, exercises: Vec<RoutineExercise>) -> Result<Routine, DatabaseError> {
        let routine = Routine::new(name.trim(), exercises);
        routine.validate().map_err(DatabaseError::ValidationError)?;
        self.put_routine(&routine)?;
        tracing::debug!(id = %routine.id, name = %routine.name, "saved routine");
        Ok(routine)
    }

    /// Rename a routine and replace its exercises.
    ///
    /// Returns `None` when no routine has that id.
    pub fn update_routine(
        &self,
        id: &str,
        name: &str,
        exercises: Vec<RoutineExercise>,
    ) -> Result<Option<Routine>, DatabaseError> {
        let Some(mut routine) = self.get_routine(id)? else {
            return Ok(None);
        };
        routine.name = name.trim().to_string();
        routine.exercises = exercises;
        routine.validate().map_err(DatabaseError::ValidationError)?;
        self.put_routine(&routine)?;
        Ok(Some(routine))
    }

    pub fn get_routine(&self, id: &str) -> Result<Option<Routine>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, exercises, created_at FROM routines WHERE id = ?1",
                rusqlite::params![id],
                row_to_routine,
            )
            .optional()?;
        row.map(Routine::try_from).transpose()
    }

    pub fn get_routines(&self) -> Result<Vec<Routine>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, exercises, created_at FROM routines ORDER BY rowid ASC")?;
        let rows = stmt
            .query_map([], row_to_routine)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(Routine::try_from).collect()
    }

    /// Delete a routine by id.
    /// Workouts that reference it keep their (now dangling) `routineId`.
    pub fn delete_routine(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM routines WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(())
    }

    /// Remove every workout and routine
    pub fn clear_workout_data(&self) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM workouts", [])?;
        tx.execute("DELETE FROM routines", [])?;
        tx.commit()?;
        tracing::info!("cleared workout data");
        Ok(())
    }

    /// Replace both workout stores with the given records in one transaction
    pub fn replace_workout_data(&self, workouts: &[Workout], routines: &[Routine]) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM workouts", [])?;
        tx.execute("DELETE FROM routines", [])?;
        for workout in workouts {
            write_workout(&tx, workout)?;
        }
        for routine in routines {
            write_routine(&tx, routine)?;
        }
        tx.commit()?;
        tracing::info!(
            workouts = workouts.len(),
            routines = routines.len(),
            "replaced workout data"
        );
        Ok(())
    }
}
