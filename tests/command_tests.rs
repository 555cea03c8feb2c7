mod common;

use std::sync::Mutex;

use async_trait::async_trait;
use common::{day, seeded_session};
use tempfile::TempDir;
use timeflow::commands::*;
use timeflow::{
    EstimateAdvisor, FixedClock, JsonFileStorage, Result, StateStorage, Suggestion,
    SuggestionRequest, TimeflowError,
};

/// Answers with a fixed adjustment and remembers what it was asked.
struct StubAdvisor {
    adjustment: i64,
    seen: Mutex<Vec<SuggestionRequest>>,
}

impl StubAdvisor {
    fn new(adjustment: i64) -> Self {
        StubAdvisor {
            adjustment,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EstimateAdvisor for StubAdvisor {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Suggestion> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(Suggestion {
            suggested_adjustment: self.adjustment,
            reason: "stub".to_string(),
        })
    }
}

struct FailingAdvisor;

#[async_trait]
impl EstimateAdvisor for FailingAdvisor {
    async fn suggest(&self, _request: &SuggestionRequest) -> Result<Suggestion> {
        Err(TimeflowError::RemoteSuggestion("service unavailable".to_string()))
    }
}

#[test]
fn test_fresh_session_starts_from_seed() {
    let session = seeded_session("2024-01-02");
    assert_eq!(session.store.tasks().len(), 3);
    assert_eq!(session.store.streak(), 0);
    // nothing saved until something changes
    assert!(session.storage().load().unwrap().is_none());
}

#[test]
fn test_add_and_log_are_saved() {
    let mut session = seeded_session("2024-01-02");
    let task = cmd_add(&mut session, "Write report", 60, true).unwrap();
    assert_eq!(task.id, 4);

    cmd_log(&mut session, task.id, 50, Some("2024-01-01"), true, true).unwrap();
    cmd_log(&mut session, task.id, 70, None, true, true).unwrap();
    assert_eq!(session.store.streak(), 2);

    let saved = session.storage().load().unwrap().unwrap();
    assert_eq!(saved.tasks.len(), 4);
    assert_eq!(saved.task_logs.len(), 2);
    assert_eq!(saved.streak, 2);
}

#[test]
fn test_log_keeps_completion_unless_done() {
    let mut session = seeded_session("2024-01-02");
    cmd_complete(&mut session, 1, None, false, true).unwrap();

    let log = cmd_log(&mut session, 1, 20, None, false, true).unwrap();
    assert!(log.completed);
    assert_eq!(log.actual_time, 20);
}

#[test]
fn test_complete_and_undo() {
    let mut session = seeded_session("2024-01-02");
    let log = cmd_complete(&mut session, 3, Some("2024-01-02"), false, true).unwrap();
    assert!(log.completed);
    assert_eq!(log.actual_time, 0);
    assert_eq!(session.store.streak(), 1);

    let log = cmd_complete(&mut session, 3, Some("2024-01-02"), true, true).unwrap();
    assert!(!log.completed);
    assert_eq!(session.store.streak(), 0);
}

#[test]
fn test_bad_input_is_rejected_before_saving() {
    let mut session = seeded_session("2024-01-02");

    let err = cmd_log(&mut session, 1, 10, Some("01/02/2024"), false, true).unwrap_err();
    assert!(matches!(err, TimeflowError::InvalidDate { .. }));

    let err = cmd_log(&mut session, 1, -5, None, false, true).unwrap_err();
    assert!(matches!(err, TimeflowError::Validation { .. }));

    let err = cmd_remove(&mut session, 99, true).unwrap_err();
    assert!(err.is_not_found());

    assert!(cmd_day(&session, Some("2024-13-01")).is_err());
    assert!(cmd_calendar(&session, Some("2024-1")).is_err());
    assert!(session.storage().load().unwrap().is_none());
}

#[test]
fn test_edit_and_remove() {
    let mut session = seeded_session("2024-01-02");
    cmd_log(&mut session, 2, 90, None, true, true).unwrap();

    let task = cmd_edit(&mut session, 2, Some("Proposal"), Some(100), true).unwrap();
    assert_eq!(task.name, "Proposal");
    assert_eq!(task.estimated_time, 100);

    cmd_remove(&mut session, 2, true).unwrap();
    let saved = session.storage().load().unwrap().unwrap();
    assert!(saved.tasks.iter().all(|t| t.id != 2));
    assert!(saved.task_logs.is_empty());
    assert_eq!(saved.streak, 0);
}

#[test]
fn test_read_only_commands_run() {
    let mut session = seeded_session("2024-01-02");
    cmd_log(&mut session, 1, 15, None, true, true).unwrap();
    cmd_log(&mut session, 2, 30, Some("2023-12-31"), false, true).unwrap();

    cmd_list(&session);
    cmd_today(&session);
    cmd_streak(&session);
    cmd_day(&session, None).unwrap();
    cmd_history(&session, 2).unwrap();
    cmd_calendar(&session, Some("2023-12")).unwrap();
    assert!(cmd_history(&session, 42).unwrap_err().is_not_found());
}

#[test]
fn test_format_minutes() {
    assert_eq!(format_minutes(0), "0m");
    assert_eq!(format_minutes(45), "45m");
    assert_eq!(format_minutes(60), "1h");
    assert_eq!(format_minutes(130), "2h 10m");
}

#[test]
fn test_suggest_without_apply_changes_nothing() {
    let mut session = seeded_session("2024-01-02");
    cmd_log(&mut session, 2, 150, Some("2024-01-01"), true, true).unwrap();
    cmd_log(&mut session, 2, 140, None, true, true).unwrap();
    let advisor = StubAdvisor::new(25);

    let suggestion = cmd_suggest(&mut session, &advisor, 2, None, false, true).unwrap();
    assert_eq!(suggestion.suggested_adjustment, 25);
    assert_eq!(session.store.task(2).unwrap().estimated_time, 120);

    let seen = advisor.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].task_name, "Project Proposal Writing");
    assert_eq!(seen[0].estimated_time, 120);
    let mut actual = seen[0].actual_times.clone();
    actual.sort();
    assert_eq!(actual, vec![140, 150]);
}

#[test]
fn test_suggest_apply_updates_estimate() {
    let mut session = seeded_session("2024-01-02");
    cmd_log(&mut session, 2, 150, None, true, true).unwrap();

    cmd_suggest(&mut session, &StubAdvisor::new(25), 2, None, true, true).unwrap();
    assert_eq!(session.store.task(2).unwrap().estimated_time, 145);
    let saved = session.storage().load().unwrap().unwrap();
    assert_eq!(saved.tasks[1].estimated_time, 145);
}

#[test]
fn test_suggest_apply_never_goes_below_one_minute() {
    let mut session = seeded_session("2024-01-02");
    cmd_log(&mut session, 1, 2, None, true, true).unwrap();

    cmd_suggest(&mut session, &StubAdvisor::new(-500), 1, None, true, true).unwrap();
    assert_eq!(session.store.task(1).unwrap().estimated_time, 1);
}

#[test]
fn test_suggest_failure_leaves_task_alone() {
    let mut session = seeded_session("2024-01-02");
    cmd_log(&mut session, 3, 50, None, true, true).unwrap();

    let err = cmd_suggest(&mut session, &FailingAdvisor, 3, None, true, true).unwrap_err();
    assert!(matches!(err, TimeflowError::RemoteSuggestion(_)));
    assert_eq!(session.store.task(3).unwrap().estimated_time, 45);
}

#[test]
fn test_suggest_needs_timed_logs() {
    let mut session = seeded_session("2024-01-02");
    cmd_complete(&mut session, 3, None, false, true).unwrap();
    let advisor = StubAdvisor::new(10);

    let err = cmd_suggest(&mut session, &advisor, 3, None, false, true).unwrap_err();
    assert!(matches!(err, TimeflowError::RemoteSuggestion(_)));
    assert!(advisor.seen.lock().unwrap().is_empty());
}

#[test]
fn test_reset_clears_storage_and_reopens_with_seed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");

    let mut session = Session::open(Box::new(JsonFileStorage::new(&path)), FixedClock(day("2024-01-02")));
    cmd_add(&mut session, "Write report", 60, true).unwrap();
    assert!(path.exists());

    cmd_reset(&JsonFileStorage::new(&path), true).unwrap();
    assert!(!path.exists());

    let session = Session::open(Box::new(JsonFileStorage::new(&path)), FixedClock(day("2024-01-02")));
    assert_eq!(session.store.tasks().len(), 3);
}

#[test]
fn test_failed_save_keeps_the_change_in_memory() {
    let dir = TempDir::new().unwrap();
    // a directory where the file should be makes every save fail
    let path = dir.path().join("state.json");
    std::fs::create_dir(&path).unwrap();

    let mut session = Session::open(Box::new(JsonFileStorage::new(&path)), FixedClock(day("2024-01-02")));
    let task = cmd_add(&mut session, "Write report", 60, true).unwrap();
    assert!(session.store.task(task.id).is_some());
    assert!(session.commit().is_err());

    let reason = session.take_save_error().expect("save failure is reported");
    assert!(reason.contains("state.json"));
    // taken once
    assert!(session.take_save_error().is_none());

    cmd_log(&mut session, task.id, 30, None, true, true).unwrap();
    assert!(session.take_save_error().is_some());
}

#[test]
fn test_successful_save_reports_no_error() {
    let mut session = seeded_session("2024-01-02");
    cmd_add(&mut session, "Write report", 60, true).unwrap();
    assert!(session.take_save_error().is_none());
}

#[test]
fn test_terminal_io_errors_are_not_storage_errors() {
    let err = TimeflowError::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed"));
    assert!(matches!(err, TimeflowError::Io(_)));
    assert!(!err.to_string().contains("Storage"));
}
