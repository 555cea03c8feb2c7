use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates::CalendarDay;

/// A piece of recurring work with a time estimate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task.
    pub id: u64,
    /// Display name, never empty.
    pub name: String,
    /// Estimated minutes the task takes.
    pub estimated_time: u32,
    /// When the task was created.
    pub created_at: DateTime<Local>,
}

/// Time spent on, and completion of, one task on one calendar day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskLog {
    /// Unique identifier for the log.
    pub id: u64,
    /// The task this log belongs to.
    pub task_id: u64,
    /// The day the time was spent.
    pub date: CalendarDay,
    /// Minutes actually spent that day.
    pub actual_time: u32,
    /// Whether the task counts as done for that day.
    #[serde(default)]
    pub completed: bool,
}

/// The persisted record: everything the store needs to be rebuilt.
///
/// `streak` is written for other readers of the file but is recomputed from
/// `task_logs` whenever the state is loaded, so a value that is not a
/// non-negative integer reads as 0 instead of failing the document.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub task_logs: Vec<TaskLog>,
    #[serde(default, deserialize_with = "lenient_streak")]
    pub streak: u32,
}

fn lenient_streak<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0))
}

impl AppState {
    /// Starting state for a fresh install: a few example tasks, no logs.
    pub fn seed() -> Self {
        let now = Local::now();
        let task = |id, name: &str, estimated_time| Task {
            id,
            name: name.to_string(),
            estimated_time,
            created_at: now,
        };
        AppState {
            tasks: vec![
                task(1, "Morning Meditation", 15),
                task(2, "Project Proposal Writing", 120),
                task(3, "Exercise", 45),
            ],
            task_logs: Vec::new(),
            streak: 0,
        }
    }
}

/// Per-day totals shown in the calendar.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// Number of logs that day (one per task).
    pub total_tasks: usize,
    /// Number of those logs marked completed.
    pub completed_tasks: usize,
    /// Sum of the estimates of the logged tasks.
    pub total_estimated_time: u64,
    /// Sum of the minutes logged.
    pub total_actual_time: u64,
}

/// A task still open today, with today's log if there is one.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTask {
    pub task: Task,
    pub log: Option<TaskLog>,
}
