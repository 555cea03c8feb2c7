mod common;

use chrono::Local;
use common::day;
use timeflow::summary::{logs_for_date, logs_for_task, month_totals, monthly_summaries};
use timeflow::{Task, TaskLog, YearMonth};

fn task(id: u64, estimated_time: u32) -> Task {
    Task {
        id,
        name: format!("Task {}", id),
        estimated_time,
        created_at: Local::now(),
    }
}

fn log(id: u64, task_id: u64, date: &str, actual_time: u32, completed: bool) -> TaskLog {
    TaskLog {
        id,
        task_id,
        date: day(date),
        actual_time,
        completed,
    }
}

fn january() -> YearMonth {
    YearMonth::parse("2024-01").unwrap()
}

#[test]
fn test_single_day_is_summed_in_any_order() {
    let tasks = vec![task(1, 15), task(2, 120), task(3, 45)];
    let mut logs = vec![
        log(1, 1, "2024-01-10", 20, true),
        log(2, 2, "2024-01-10", 100, false),
        log(3, 3, "2024-01-10", 50, true),
    ];

    let forward = monthly_summaries(&tasks, &logs, january());
    logs.reverse();
    let backward = monthly_summaries(&tasks, &logs, january());

    assert_eq!(forward, backward);
    assert_eq!(forward.len(), 1);
    let s = forward[&day("2024-01-10")];
    assert_eq!(s.total_tasks, 3);
    assert_eq!(s.completed_tasks, 2);
    assert_eq!(s.total_estimated_time, 180);
    assert_eq!(s.total_actual_time, 170);
}

#[test]
fn test_days_without_logs_are_omitted() {
    let tasks = vec![task(1, 30)];
    let logs = vec![
        log(1, 1, "2024-01-01", 30, true),
        log(2, 1, "2024-01-03", 30, true),
        log(3, 1, "2023-12-31", 30, true),
        log(4, 1, "2024-02-01", 30, true),
    ];

    let summaries = monthly_summaries(&tasks, &logs, january());
    let keys: Vec<String> = summaries.keys().map(|d| d.to_string()).collect();
    assert_eq!(keys, vec!["2024-01-01", "2024-01-03"]);
    assert!(!summaries.contains_key(&day("2024-01-02")));
}

#[test]
fn test_log_of_deleted_task_adds_no_estimate() {
    let tasks = vec![task(1, 30)];
    let logs = vec![
        log(1, 1, "2024-01-05", 25, true),
        log(2, 9, "2024-01-05", 10, false),
    ];

    let s = monthly_summaries(&tasks, &logs, january())[&day("2024-01-05")];
    assert_eq!(s.total_tasks, 2);
    assert_eq!(s.total_estimated_time, 30);
    assert_eq!(s.total_actual_time, 35);
}

#[test]
fn test_month_totals() {
    let tasks = vec![task(1, 30), task(2, 60)];
    let logs = vec![
        log(1, 1, "2024-01-01", 25, true),
        log(2, 2, "2024-01-01", 70, true),
        log(3, 1, "2024-01-02", 35, false),
    ];

    let totals = month_totals(&monthly_summaries(&tasks, &logs, january()));
    assert_eq!(totals.total_tasks, 3);
    assert_eq!(totals.completed_tasks, 2);
    assert_eq!(totals.total_estimated_time, 120);
    assert_eq!(totals.total_actual_time, 130);
}

#[test]
fn test_log_filters() {
    let logs = vec![
        log(1, 1, "2024-01-01", 25, true),
        log(2, 2, "2024-01-01", 70, true),
        log(3, 1, "2024-01-02", 35, false),
    ];

    let on_first: Vec<u64> = logs_for_date(&logs, &day("2024-01-01")).iter().map(|l| l.id).collect();
    assert_eq!(on_first, vec![1, 2]);

    let for_task: Vec<u64> = logs_for_task(&logs, 1).iter().map(|l| l.id).collect();
    assert_eq!(for_task, vec![1, 3]);
    assert!(logs_for_task(&logs, 5).is_empty());
}
