//! # Timeflow
//!
//! A personal task-time tracker for the terminal. Record tasks with time
//! estimates, log the minutes actually spent each day, tick tasks off, and
//! keep a streak of consecutive days with at least one completed task.
//!
//! ## Features
//!
//! *   **Daily logs**: One log per task per day holds the minutes spent and
//!     whether the task was completed; logging again overwrites it.
//! *   **Streaks**: Consecutive days with a completion, ending today or
//!     yesterday.
//! *   **Monthly calendar**: Per-day totals of logged tasks, completions,
//!     estimated and actual minutes.
//! *   **Estimate advisor**: Sends a task's history to an OpenAI-compatible
//!     model and applies the suggested adjustment on request.
//! *   **Dual Interface**: A scriptable CLI and an interactive TUI.
//!
//! ## Usage
//!
//! ```bash
//! # Add a task with a 60 minute estimate
//! timeflow add "Write report" --estimate 60
//!
//! # Log 70 minutes today and mark it done
//! timeflow log 4 70 --done
//!
//! # What is still open today?
//! timeflow today
//!
//! # This month at a glance
//! timeflow calendar --month 2024-01
//!
//! # Ask for a better estimate and apply it
//! timeflow suggest 4 --apply
//! ```
//!
//! ## Data Storage
//!
//! State is a single JSON document in your local data directory:
//! *   Linux: `~/.local/share/timeflow/timeflow-tracker-storage.json`
//! *   macOS: `~/Library/Application Support/timeflow/timeflow-tracker-storage.json`
//! *   Windows: `%LOCALAPPDATA%\timeflow\timeflow-tracker-storage.json`
//!
//! Override it with `TIMEFLOW_DB` or `[storage] path` in `config.toml`.
//!
//! ## Library
//!
//! ```rust
//! use timeflow::{CalendarDay, FixedClock, TaskStore};
//!
//! let today = CalendarDay::parse("2024-01-02").unwrap();
//! let mut store = TaskStore::new(FixedClock(today));
//! let task = store.add_task("Write report", 60).unwrap();
//! store.log_task(task.id, today, 50, true).unwrap();
//! assert_eq!(store.streak(), 1);
//! ```

pub mod advisor;
pub mod commands;
pub mod config;
pub mod dates;
pub mod error;
pub mod models;
pub mod storage;
pub mod store;
pub mod streak;
pub mod summary;
pub mod tui;

pub use advisor::{apply_suggestion, EstimateAdvisor, HttpAdvisor, Suggestion, SuggestionRequest};
pub use config::Config;
pub use dates::{CalendarDay, Clock, FixedClock, SystemClock, YearMonth};
pub use error::{Result, TimeflowError};
pub use models::{AppState, DailySummary, PendingTask, Task, TaskLog};
pub use storage::{load_or_seed, JsonFileStorage, MemoryStorage, StateStorage};
pub use store::TaskStore;
pub use streak::calculate_streak;
