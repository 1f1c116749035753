use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of characters allowed in a journal entry
pub const MAX_ENTRY_CHARS: usize = 300;

/// One journal entry, keyed by its journal day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub journal_day: NaiveDate,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Entry {
    pub fn new(journal_day: NaiveDate, text: impl Into<String>) -> Self {
        Self {
            journal_day,
            text: text.into(),
            created_at: Utc::now(),
            year: journal_day.year(),
            month: journal_day.month(),
            day: journal_day.day(),
        }
    }

    /// The `YYYY-MM-DD` key this entry is stored under
    pub fn key(&self) -> String {
        self.journal_day.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key(), self.text)
    }
}

/// Check entry text against the journal limits.
///
/// Returns a human-readable reason when the text is rejected.
pub fn validate_entry_text(text: &str) -> Result<(), String> {
    let len = text.chars().count();
    if len > MAX_ENTRY_CHARS {
        return Err(format!("Entry too long ({} chars)", len));
    }
    if text.trim().is_empty() {
        return Err("Empty entry".to_string());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Cardio,
    Weights,
    Hockey,
    Other,
}

impl WorkoutType {
    pub const ALL: [WorkoutType; 4] = [
        WorkoutType::Cardio,
        WorkoutType::Weights,
        WorkoutType::Hockey,
        WorkoutType::Other,
    ];
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkoutType::Cardio => write!(f, "cardio"),
            WorkoutType::Weights => write!(f, "weights"),
            WorkoutType::Hockey => write!(f, "hockey"),
            WorkoutType::Other => write!(f, "other"),
        }
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cardio" => Ok(WorkoutType::Cardio),
            "weights" => Ok(WorkoutType::Weights),
            "hockey" => Ok(WorkoutType::Hockey),
            "other" => Ok(WorkoutType::Other),
            _ => Err(format!(
                "Invalid workout type '{}'. Valid options: cardio, weights, hockey, other",
                s
            )),
        }
    }
}

/// Cardio activities offered by the tracker
pub const CARDIO_ACTIVITIES: [&str; 9] = [
    "Running",
    "Cycling",
    "Swimming",
    "Walking",
    "Elliptical",
    "Rowing",
    "Jump Rope",
    "Stair Climber",
    "Other",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Easy,
    #[default]
    Moderate,
    Hard,
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intensity::Easy => write!(f, "easy"),
            Intensity::Moderate => write!(f, "moderate"),
            Intensity::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Intensity::Easy),
            "moderate" => Ok(Intensity::Moderate),
            "hard" => Ok(Intensity::Hard),
            _ => Err(format!(
                "Invalid intensity '{}'. Valid options: easy, moderate, hard",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioData {
    pub activity_type: String,
    /// Minutes
    pub duration: u32,
    #[serde(default)]
    pub intensity: Intensity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedExercise {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_sets: Option<u32>,
    #[serde(default)]
    pub sets: Vec<SetEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightsData {
    pub routine_id: String,
    #[serde(default)]
    pub routine_name: String,
    #[serde(default)]
    pub exercises: Vec<LoggedExercise>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeTextData {
    pub description: String,
}

/// Activity payload of a workout, discriminated by its `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Activity {
    Cardio(CardioData),
    Weights(WeightsData),
    Hockey(FreeTextData),
    Other(FreeTextData),
}

impl Activity {
    pub fn kind(&self) -> WorkoutType {
        match self {
            Activity::Cardio(_) => WorkoutType::Cardio,
            Activity::Weights(_) => WorkoutType::Weights,
            Activity::Hockey(_) => WorkoutType::Hockey,
            Activity::Other(_) => WorkoutType::Other,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Activity::Cardio(data) => {
                if data.duration == 0 {
                    return Err("Please enter a duration".to_string());
                }
                if data.activity_type.trim().is_empty() {
                    return Err("Please choose an activity".to_string());
                }
            }
            Activity::Weights(data) => {
                if data.routine_id.trim().is_empty() {
                    return Err("Please select a routine".to_string());
                }
                for exercise in &data.exercises {
                    if exercise.sets.iter().any(|set| !set.weight.is_finite() || set.weight < 0.0) {
                        return Err(format!("Invalid weight for {}", exercise.name));
                    }
                }
            }
            Activity::Hockey(data) | Activity::Other(data) => {
                if data.description.trim().is_empty() {
                    return Err("Please enter a description".to_string());
                }
            }
        }
        Ok(())
    }

    /// Short one-line description for listings
    pub fn summary(&self) -> String {
        match self {
            Activity::Cardio(data) => format!(
                "{} for {} min ({})",
                data.activity_type, data.duration, data.intensity
            ),
            Activity::Weights(data) => {
                let sets: usize = data.exercises.iter().map(|e| e.sets.len()).sum();
                format!(
                    "{}: {} exercises, {} sets",
                    data.routine_name,
                    data.exercises.len(),
                    sets
                )
            }
            Activity::Hockey(data) | Activity::Other(data) => data.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub activity: Activity,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    pub fn new(date: NaiveDate, activity: Activity) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            activity,
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> WorkoutType {
        self.activity.kind()
    }
}

impl fmt::Display for Workout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({})",
            self.date,
            self.kind(),
            self.activity.summary(),
            self.id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineExercise {
    pub name: String,
    pub target_sets: u32,
}

/// A reusable template of exercises for weight workouts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: String,
    pub name: String,
    pub exercises: Vec<RoutineExercise>,
    pub created_at: DateTime<Utc>,
}

impl Routine {
    pub fn new(name: impl Into<String>, exercises: Vec<RoutineExercise>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            exercises,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Routine name is required".to_string());
        }
        if self.exercises.is_empty() {
            return Err("A routine needs at least one exercise".to_string());
        }
        for exercise in &self.exercises {
            if exercise.name.trim().is_empty() {
                return Err("Exercise name is required".to_string());
            }
            if exercise.target_sets < 1 {
                return Err(format!(
                    "Exercise '{}' needs at least one target set",
                    exercise.name
                ));
            }
        }
        Ok(())
    }

    /// Exercises pre-filled for logging a weights workout from this routine
    pub fn to_logged_exercises(&self) -> Vec<LoggedExercise> {
        self.exercises
            .iter()
            .map(|e| LoggedExercise {
                name: e.name.clone(),
                target_sets: Some(e.target_sets),
                sets: Vec::new(),
            })
            .collect()
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        for exercise in &self.exercises {
            writeln!(f, "  - {} x{}", exercise.name, exercise.target_sets)?;
        }
        Ok(())
    }
}

/// Per-word spelling statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordStat {
    pub word: String,
    pub attempts: u32,
    pub correct: u32,
    /// Milliseconds across all attempts
    pub total_time: u64,
    pub avg_time: u64,
    pub struggled: bool,
    pub last_attempt_time: Option<u64>,
    pub last_attempt_date: Option<DateTime<Utc>>,
}

impl WordStat {
    pub fn new(word: &str) -> Self {
        Self {
            word: word.to_lowercase(),
            attempts: 0,
            correct: 0,
            total_time: 0,
            avg_time: 0,
            struggled: false,
            last_attempt_time: None,
            last_attempt_date: None,
        }
    }

    /// Fold one attempt into the statistics.
    ///
    /// `struggled` is recomputed from this attempt alone: an incorrect answer
    /// always sets it, a correct one sets it only when slower than
    /// `threshold_ms`.
    pub fn record(&mut self, was_correct: bool, elapsed_ms: u64, threshold_ms: u64, at: DateTime<Utc>) {
        self.attempts += 1;
        if was_correct {
            self.correct += 1;
        }
        self.total_time += elapsed_ms;
        self.avg_time = (self.total_time as f64 / self.attempts as f64).round() as u64;
        self.last_attempt_time = Some(elapsed_ms);
        self.last_attempt_date = Some(at);
        self.struggled = !was_correct || elapsed_ms > threshold_ms;
    }

    pub fn has_misses(&self) -> bool {
        self.correct < self.attempts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Continuous,
    Fixed,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::Continuous => write!(f, "continuous"),
            SessionMode::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continuous" => Ok(SessionMode::Continuous),
            "fixed" => Ok(SessionMode::Fixed),
            _ => Err(format!(
                "Invalid session mode '{}'. Valid options: continuous, fixed",
                s
            )),
        }
    }
}

/// A completed practice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub attempted: u32,
    pub correct: u32,
    pub accuracy: u32,
    pub mode: SessionMode,
    pub target_count: Option<u32>,
    pub date: DateTime<Utc>,
}

impl Session {
    pub fn new(attempted: u32, correct: u32, mode: SessionMode, target_count: Option<u32>) -> Self {
        Self {
            attempted,
            correct,
            accuracy: percent(correct as u64, attempted as u64),
            mode,
            target_count: match mode {
                SessionMode::Fixed => target_count,
                SessionMode::Continuous => None,
            },
            date: Utc::now(),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}/{} ({}%)",
            self.date.format("%Y-%m-%d %H:%M"),
            self.mode,
            self.correct,
            self.attempted,
            self.accuracy
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_practiced: u32,
    pub total_attempts: u64,
    pub total_correct: u64,
    pub overall_accuracy: u32,
    pub struggled_count: u32,
}

impl OverallStats {
    pub fn from_stats<'a>(stats: impl IntoIterator<Item = &'a WordStat>) -> Self {
        let mut overall = OverallStats::default();
        for stat in stats {
            overall.total_practiced += 1;
            overall.total_attempts += stat.attempts as u64;
            overall.total_correct += stat.correct as u64;
            if stat.struggled {
                overall.struggled_count += 1;
            }
        }
        overall.overall_accuracy = percent(overall.total_correct, overall.total_attempts);
        overall
    }
}

/// Rounded percentage, 0 when there is nothing to divide by
pub fn percent(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_entry_derives_date_parts() {
        let entry = Entry::new(NaiveDate::from_ymd_opt(2023, 7, 4).unwrap(), "fireworks");
        assert_eq!((entry.year, entry.month, entry.day), (2023, 7, 4));
        assert_eq!(entry.key(), "2023-07-04");
        assert_eq!(entry.to_string(), "2023-07-04: fireworks");
    }

    #[test]
    fn test_validate_entry_text_limits() {
        assert!(validate_entry_text(&"a".repeat(300)).is_ok());
        assert!(validate_entry_text(&"a".repeat(301)).is_err());
        assert!(validate_entry_text("   ").is_err());
        // counted in characters, not bytes
        assert!(validate_entry_text(&"é".repeat(300)).is_ok());
    }

    #[test]
    fn test_workout_type_from_str() {
        assert_eq!(WorkoutType::from_str("Cardio").unwrap(), WorkoutType::Cardio);
        assert_eq!(WorkoutType::from_str("HOCKEY").unwrap(), WorkoutType::Hockey);
        assert!(WorkoutType::from_str("yoga").is_err());
    }

    #[test]
    fn test_workout_serializes_with_type_and_data() {
        let workout = Workout {
            id: "w1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            activity: Activity::Hockey(FreeTextData {
                description: "pickup game".to_string(),
            }),
            created_at: at(),
        };
        let value = serde_json::to_value(&workout).unwrap();
        assert_eq!(value["type"], "hockey");
        assert_eq!(value["data"]["description"], "pickup game");
        assert_eq!(value["date"], "2024-01-02");
        assert!(value.get("createdAt").is_some());

        let back: Workout = serde_json::from_value(value).unwrap();
        assert_eq!(back, workout);
    }

    #[test]
    fn test_cardio_payload_field_names() {
        let json = r#"{
            "id": "abc",
            "date": "2024-02-03",
            "type": "cardio",
            "data": { "activityType": "Running", "duration": 30, "intensity": "hard" },
            "createdAt": "2024-02-03T18:00:00Z"
        }"#;
        let workout: Workout = serde_json::from_str(json).unwrap();
        match workout.activity {
            Activity::Cardio(ref data) => {
                assert_eq!(data.activity_type, "Running");
                assert_eq!(data.duration, 30);
                assert_eq!(data.intensity, Intensity::Hard);
            }
            ref other => panic!("unexpected activity {:?}", other),
        }
        assert_eq!(workout.activity.summary(), "Running for 30 min (hard)");
    }

    #[test]
    fn test_activity_validation() {
        let empty = Activity::Other(FreeTextData {
            description: "  ".to_string(),
        });
        assert!(empty.validate().is_err());

        let no_duration = Activity::Cardio(CardioData {
            activity_type: "Rowing".to_string(),
            duration: 0,
            intensity: Intensity::Easy,
        });
        assert!(no_duration.validate().is_err());

        let weights = |weight: f64| {
            Activity::Weights(WeightsData {
                routine_id: "r1".to_string(),
                routine_name: "Legs".to_string(),
                exercises: vec![LoggedExercise {
                    name: "Squat".to_string(),
                    target_sets: Some(3),
                    sets: vec![SetEntry { weight, reps: 5 }],
                }],
                notes: String::new(),
            })
        };
        assert!(weights(80.0).validate().is_ok());
        assert!(weights(f64::NAN).validate().is_err());
        assert!(weights(f64::INFINITY).validate().is_err());
        assert!(weights(-1.0).validate().is_err());
    }

    #[test]
    fn test_routine_validation_requires_target_sets() {
        let mut routine = Routine::new(
            "Push",
            vec![RoutineExercise {
                name: "Bench".to_string(),
                target_sets: 3,
            }],
        );
        assert!(routine.validate().is_ok());

        routine.exercises[0].target_sets = 0;
        assert!(routine.validate().is_err());

        routine.exercises.clear();
        assert!(routine.validate().is_err());
    }

    #[test]
    fn test_word_stat_averages_and_struggle() {
        let mut stat = WordStat::new("Necessary");
        assert_eq!(stat.word, "necessary");

        stat.record(true, 3000, 10_000, at());
        stat.record(true, 4001, 10_000, at());
        assert_eq!(stat.attempts, 2);
        assert_eq!(stat.correct, 2);
        assert_eq!(stat.total_time, 7001);
        assert_eq!(stat.avg_time, 3501);
        assert!(!stat.struggled);

        stat.record(true, 10_001, 10_000, at());
        assert!(stat.struggled);

        // exactly at the threshold is not a struggle
        stat.record(true, 10_000, 10_000, at());
        assert!(!stat.struggled);
        assert_eq!(stat.last_attempt_time, Some(10_000));
    }

    #[test]
    fn test_session_accuracy_and_mode() {
        let session = Session::new(3, 2, SessionMode::Continuous, Some(10));
        assert_eq!(session.accuracy, 67);
        assert_eq!(session.target_count, None);

        let fixed = Session::new(0, 0, SessionMode::Fixed, Some(10));
        assert_eq!(fixed.accuracy, 0);
        assert_eq!(fixed.target_count, Some(10));
    }
}
