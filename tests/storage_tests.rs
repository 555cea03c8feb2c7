mod common;

use std::fs;

use common::day;
use tempfile::TempDir;
use timeflow::commands::Session;
use timeflow::storage::{log_path, STORAGE_KEY};
use timeflow::{
    load_or_seed, AppState, FixedClock, JsonFileStorage, MemoryStorage, StateStorage, TaskStore,
    TimeflowError,
};

fn storage_in(dir: &TempDir) -> JsonFileStorage {
    JsonFileStorage::new(dir.path().join(format!("{}.json", STORAGE_KEY)))
}

#[test]
fn test_missing_file_loads_as_nothing() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(&dir);
    assert!(storage.load().unwrap().is_none());

    let state = load_or_seed(&storage);
    let names: Vec<&str> = state.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Morning Meditation", "Project Proposal Writing", "Exercise"]);
    assert!(state.task_logs.is_empty());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(&dir);

    let mut store = TaskStore::new(FixedClock(day("2024-01-02")));
    let task = store.add_task("Write report", 60).unwrap();
    store.log_task(task.id, day("2024-01-02"), 55, true).unwrap();
    storage.save(&store.to_state()).unwrap();

    let loaded = storage.load().unwrap().unwrap();
    assert_eq!(loaded, store.to_state());
    assert_eq!(loaded.streak, 1);
    assert!(!dir.path().join(format!("{}.json.tmp", STORAGE_KEY)).exists());
}

#[test]
fn test_file_uses_camel_case_fields() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(&dir);

    let mut store = TaskStore::new(FixedClock(day("2024-01-02")));
    let task = store.add_task("Write report", 60).unwrap();
    store.log_task(task.id, day("2024-01-02"), 55, false).unwrap();
    storage.save(&store.to_state()).unwrap();

    let raw = fs::read_to_string(storage.path()).unwrap();
    assert!(raw.contains("\"taskLogs\""));
    assert!(raw.contains("\"estimatedTime\": 60"));
    assert!(raw.contains("\"actualTime\": 55"));
    assert!(raw.contains("\"date\": \"2024-01-02\""));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let storage = JsonFileStorage::new(dir.path().join("nested").join("state.json"));
    storage.save(&AppState::seed()).unwrap();
    assert!(storage.path().exists());
}

#[test]
fn test_corrupt_file_falls_back_to_seed() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(&dir);
    fs::write(storage.path(), "{ not json").unwrap();

    assert!(matches!(storage.load().unwrap_err(), TimeflowError::Serialization(_)));
    let state = load_or_seed(&storage);
    assert_eq!(state.tasks.len(), 3);
}

#[test]
fn test_bad_date_in_file_is_rejected() {
    let storage = MemoryStorage::with_document(
        r#"{"tasks":[],"taskLogs":[{"id":1,"taskId":1,"date":"2024-1-2","actualTime":5,"completed":true}],"streak":0}"#,
    );
    assert!(storage.load().is_err());
}

#[test]
fn test_missing_fields_take_defaults() {
    let storage = MemoryStorage::with_document(r#"{"tasks":[]}"#);
    let state = storage.load().unwrap().unwrap();
    assert!(state.task_logs.is_empty());
    assert_eq!(state.streak, 0);
}

#[test]
fn test_clear_removes_the_file() {
    let dir = TempDir::new().unwrap();
    let storage = storage_in(&dir);
    storage.save(&AppState::seed()).unwrap();

    storage.clear().unwrap();
    assert!(!storage.path().exists());
    // clearing twice is fine
    storage.clear().unwrap();
}

#[test]
fn test_memory_storage_round_trips_state() {
    let storage = MemoryStorage::new();
    assert!(storage.document().is_none());

    storage.save(&AppState::seed()).unwrap();
    assert!(storage.document().unwrap().contains("Morning Meditation"));
    assert_eq!(storage.load().unwrap().unwrap().tasks.len(), 3);

    storage.clear().unwrap();
    assert!(storage.load().unwrap().is_none());
}

#[test]
fn test_bad_cached_streak_keeps_user_data() {
    for streak in ["-1", "2.5", "\"three\"", "null", "99999999999"] {
        let document = format!(
            r#"{{"tasks":[{{"id":7,"name":"Mine","estimatedTime":20,"createdAt":"2024-01-01T09:00:00+00:00"}}],"taskLogs":[{{"id":1,"taskId":7,"date":"2024-01-02","actualTime":20,"completed":true}}],"streak":{}}}"#,
            streak
        );
        let storage = MemoryStorage::with_document(document);
        let state = storage.load().unwrap().unwrap();
        assert_eq!(state.streak, 0, "streak {streak}");

        let session = Session::open(Box::new(storage), FixedClock(day("2024-01-02")));
        let names: Vec<&str> = session.store.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Mine"]);
        assert_eq!(session.store.streak(), 1);
    }
}

#[test]
fn test_log_path_honours_env() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.log");
    std::env::set_var("TIMEFLOW_LOG", &path);
    assert_eq!(log_path(), path);
    std::env::remove_var("TIMEFLOW_LOG");
    assert!(log_path().ends_with("timeflow.log"));
}
