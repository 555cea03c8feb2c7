//! The authoritative in-memory collection of tasks and logs.
//!
//! A [`TaskStore`] is built explicitly, usually from a loaded [`AppState`], and
//! handed to whatever needs it. Saving is the caller's job: snapshot with
//! [`TaskStore::to_state`] after a successful mutation.

use std::collections::{BTreeMap, HashSet};

use chrono::Local;
use tracing::{debug, warn};

use crate::dates::{CalendarDay, Clock, YearMonth};
use crate::error::{Result, TimeflowError};
use crate::models::{AppState, DailySummary, PendingTask, Task, TaskLog};
use crate::streak::calculate_streak;
use crate::summary;

pub struct TaskStore {
    tasks: Vec<Task>,
    logs: Vec<TaskLog>,
    streak: u32,
    clock: Box<dyn Clock>,
}

impl TaskStore {
    /// Creates an empty store.
    pub fn new(clock: impl Clock + 'static) -> Self {
        TaskStore {
            tasks: Vec::new(),
            logs: Vec::new(),
            streak: 0,
            clock: Box::new(clock),
        }
    }

    /// Rebuilds a store from persisted state.
    ///
    /// The state is not trusted: logs pointing at unknown tasks are dropped,
    /// repeated `(task, day)` logs collapse into the last one, and the stored
    /// streak is ignored in favour of a fresh calculation.
    pub fn from_state(state: AppState, clock: impl Clock + 'static) -> Self {
        let mut tasks: Vec<Task> = Vec::with_capacity(state.tasks.len());
        for task in state.tasks {
            if tasks.iter().any(|t| t.id == task.id) {
                warn!(task_id = task.id, "dropping task with duplicate id");
                continue;
            }
            tasks.push(task);
        }

        let known: HashSet<u64> = tasks.iter().map(|t| t.id).collect();
        let mut logs: Vec<TaskLog> = Vec::with_capacity(state.task_logs.len());
        for log in state.task_logs {
            if !known.contains(&log.task_id) {
                warn!(log_id = log.id, task_id = log.task_id, "dropping log for unknown task");
                continue;
            }
            if let Some(existing) = logs
                .iter_mut()
                .find(|l| l.task_id == log.task_id && l.date == log.date)
            {
                warn!(task_id = log.task_id, date = %log.date, "collapsing duplicate log");
                *existing = log;
                continue;
            }
            logs.push(log);
        }

        let mut store = TaskStore {
            tasks,
            logs,
            streak: 0,
            clock: Box::new(clock),
        };
        store.recalculate_streak();
        store
    }

    /// Snapshot for persistence.
    pub fn to_state(&self) -> AppState {
        AppState {
            tasks: self.tasks.clone(),
            task_logs: self.logs.clone(),
            streak: self.streak,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn logs(&self) -> &[TaskLog] {
        &self.logs
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn today(&self) -> CalendarDay {
        self.clock.today()
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn require_task(&self, id: u64) -> Result<&Task> {
        self.task(id).ok_or(TimeflowError::TaskNotFound { id })
    }

    /// Adds a task and returns it with its new id.
    pub fn add_task(&mut self, name: &str, estimated_time: i64) -> Result<Task> {
        let name = validate_name(name)?;
        let estimated_time = validate_estimate(estimated_time)?;
        let task = Task {
            id: next_id(self.tasks.iter().map(|t| t.id), "task id")?,
            name,
            estimated_time,
            created_at: Local::now(),
        };
        debug!(task_id = task.id, name = %task.name, estimated_time, "task added");
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Replaces the name and estimate of the stored task with `task.id`.
    ///
    /// `id` and `created_at` keep their stored values.
    pub fn update_task(&mut self, task: Task) -> Result<Task> {
        let name = validate_name(&task.name)?;
        let estimated_time = validate_estimate(i64::from(task.estimated_time))?;
        let stored = self
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(TimeflowError::TaskNotFound { id: task.id })?;
        stored.name = name;
        stored.estimated_time = estimated_time;
        debug!(task_id = stored.id, estimated_time, "task updated");
        Ok(stored.clone())
    }

    /// Changes only the given fields of a task.
    pub fn edit_task(&mut self, id: u64, name: Option<&str>, estimated_time: Option<i64>) -> Result<Task> {
        let mut task = self.require_task(id)?.clone();
        if let Some(n) = name {
            task.name = n.to_string();
        }
        if let Some(e) = estimated_time {
            task.estimated_time = validate_estimate(e)?;
        }
        self.update_task(task)
    }

    /// Removes a task together with all of its logs.
    pub fn delete_task(&mut self, id: u64) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimeflowError::TaskNotFound { id })?;
        let task = self.tasks.remove(index);
        let before = self.logs.len();
        self.logs.retain(|log| log.task_id != id);
        debug!(task_id = id, logs_removed = before - self.logs.len(), "task deleted");
        self.recalculate_streak();
        Ok(task)
    }

    /// Records the time spent and completion for a task on a day.
    ///
    /// A second call for the same task and day overwrites the existing log
    /// instead of adding another.
    pub fn log_task(
        &mut self,
        task_id: u64,
        date: CalendarDay,
        actual_time: i64,
        completed: bool,
    ) -> Result<TaskLog> {
        let actual_time = validate_actual(actual_time)?;
        self.require_task(task_id)?;

        let log = match self
            .logs
            .iter_mut()
            .find(|log| log.task_id == task_id && log.date == date)
        {
            Some(existing) => {
                existing.actual_time = actual_time;
                existing.completed = completed;
                existing.clone()
            }
            None => {
                let log = TaskLog {
                    id: next_id(self.logs.iter().map(|l| l.id), "log id")?,
                    task_id,
                    date,
                    actual_time,
                    completed,
                };
                self.logs.push(log.clone());
                log
            }
        };
        debug!(log_id = log.id, task_id, date = %date, actual_time, completed, "task logged");
        self.recalculate_streak();
        Ok(log)
    }

    /// Marks a day's log complete or incomplete, keeping any time already
    /// logged.
    pub fn set_completed(&mut self, task_id: u64, date: CalendarDay, completed: bool) -> Result<TaskLog> {
        let actual_time = self.log_for(task_id, &date).map(|l| l.actual_time).unwrap_or(0);
        self.log_task(task_id, date, i64::from(actual_time), completed)
    }

    /// Replaces a log by id.
    ///
    /// Moving a log onto a day its task already has a log for is rejected.
    pub fn update_log(&mut self, log: TaskLog) -> Result<TaskLog> {
        let index = self
            .logs
            .iter()
            .position(|l| l.id == log.id)
            .ok_or(TimeflowError::LogNotFound { id: log.id })?;
        self.require_task(log.task_id)?;
        if self
            .logs
            .iter()
            .any(|l| l.id != log.id && l.task_id == log.task_id && l.date == log.date)
        {
            return Err(TimeflowError::validation(
                "date",
                format!("task {} already has a log for {}", log.task_id, log.date),
            ));
        }
        self.logs[index] = log.clone();
        debug!(log_id = log.id, "log updated");
        self.recalculate_streak();
        Ok(log)
    }

    pub fn log_for(&self, task_id: u64, date: &CalendarDay) -> Option<&TaskLog> {
        self.logs
            .iter()
            .find(|log| log.task_id == task_id && log.date == *date)
    }

    pub fn logs_for_date(&self, date: &CalendarDay) -> Vec<&TaskLog> {
        summary::logs_for_date(&self.logs, date)
    }

    pub fn logs_for_task(&self, task_id: u64) -> Vec<&TaskLog> {
        summary::logs_for_task(&self.logs, task_id)
    }

    pub fn todays_pending_tasks(&self) -> Vec<PendingTask> {
        summary::pending_tasks(&self.tasks, &self.logs, &self.today())
    }

    pub fn monthly_summaries(&self, month: YearMonth) -> BTreeMap<CalendarDay, DailySummary> {
        summary::monthly_summaries(&self.tasks, &self.logs, month)
    }

    /// Recomputes the cached streak from the current logs.
    pub fn recalculate_streak(&mut self) -> u32 {
        self.streak = calculate_streak(&self.logs, self.today());
        self.streak
    }
}

/// One past the highest id in use.
fn next_id(ids: impl Iterator<Item = u64>, field: &str) -> Result<u64> {
    ids.max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| TimeflowError::validation(field, "no ids left"))
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TimeflowError::validation("name", "must not be empty"));
    }
    Ok(name.to_string())
}

fn validate_estimate(minutes: i64) -> Result<u32> {
    if minutes <= 0 {
        return Err(TimeflowError::validation("estimatedTime", "must be at least 1 minute"));
    }
    u32::try_from(minutes).map_err(|_| TimeflowError::validation("estimatedTime", "is too large"))
}

fn validate_actual(minutes: i64) -> Result<u32> {
    if minutes < 0 {
        return Err(TimeflowError::validation("actualTime", "cannot be negative"));
    }
    u32::try_from(minutes).map_err(|_| TimeflowError::validation("actualTime", "is too large"))
}
