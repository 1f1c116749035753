use daybook::database::MAX_SESSIONS;
use daybook::models::SessionMode;
use daybook::{Database, Trainer};

#[test]
fn struggle_flag_follows_latest_attempt() {
    let db = Database::open_in_memory().unwrap();
    let trainer = Trainer::with_threshold(&db, 10_000);

    assert!(trainer.record_attempt("necessary", false, 1_000).unwrap().struggled);
    assert!(trainer.record_attempt("necessary", true, 15_000).unwrap().struggled);
    assert!(!trainer.record_attempt("necessary", true, 3_000).unwrap().struggled);

    let stored = db.get_word_stat("NECESSARY").unwrap().unwrap();
    assert_eq!(stored.attempts, 3);
    assert_eq!(stored.correct, 2);
    assert_eq!(stored.total_time, 19_000);
    assert_eq!(stored.avg_time, 6_333);
    assert_eq!(stored.last_attempt_time, Some(3_000));
}

#[test]
fn session_history_is_capped() {
    let db = Database::open_in_memory().unwrap();
    let trainer = Trainer::with_threshold(&db, 10_000);

    for attempted in 1..=(MAX_SESSIONS as u32 + 1) {
        trainer
            .finish_session(attempted, 0, SessionMode::Continuous, None)
            .unwrap();
    }

    let sessions = db.get_sessions().unwrap();
    assert_eq!(sessions.len(), MAX_SESSIONS);
    assert_eq!(sessions.first().unwrap().attempted, 2);
    assert_eq!(sessions.last().unwrap().attempted, MAX_SESSIONS as u32 + 1);
}

#[test]
fn fixed_sessions_keep_target_and_continuous_drop_it() {
    let db = Database::open_in_memory().unwrap();
    let trainer = Trainer::with_threshold(&db, 10_000);
    trainer.finish_session(10, 7, SessionMode::Fixed, Some(10)).unwrap();
    trainer.finish_session(3, 3, SessionMode::Continuous, Some(10)).unwrap();

    let sessions = db.get_sessions().unwrap();
    assert_eq!(sessions[0].target_count, Some(10));
    assert_eq!(sessions[0].accuracy, 70);
    assert_eq!(sessions[1].target_count, None);
    assert_eq!(sessions[1].accuracy, 100);
}

#[test]
fn reset_clears_stats_and_sessions() {
    let db = Database::open_in_memory().unwrap();
    let trainer = Trainer::with_threshold(&db, 10_000);
    trainer.record_attempt("rhythm", false, 100).unwrap();
    trainer.finish_session(1, 0, SessionMode::Continuous, None).unwrap();

    trainer.reset().unwrap();
    assert!(db.get_word_stats().unwrap().is_empty());
    assert!(db.get_sessions().unwrap().is_empty());
    assert_eq!(trainer.overall_stats().unwrap().total_practiced, 0);
}
