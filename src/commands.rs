use std::io::{self, Write};

use chrono::Datelike;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tracing::warn;

use crate::advisor::{apply_suggestion, EstimateAdvisor, Suggestion, SuggestionRequest};
use crate::dates::{CalendarDay, Clock, YearMonth};
use crate::error::{Result, TimeflowError};
use crate::models::{Task, TaskLog};
use crate::storage::{load_or_seed, StateStorage};
use crate::store::TaskStore;
use crate::summary::month_totals;

/// A store together with the storage it was loaded from.
///
/// Commands mutate `store` and then call [`Session::commit`]; nothing is
/// written implicitly.
pub struct Session {
    pub store: TaskStore,
    storage: Box<dyn StateStorage>,
    save_error: Option<String>,
}

impl Session {
    pub fn new(store: TaskStore, storage: Box<dyn StateStorage>) -> Self {
        Session { store, storage, save_error: None }
    }

    /// Loads state from `storage` (or the seed state) and builds the store.
    pub fn open(storage: Box<dyn StateStorage>, clock: impl Clock + 'static) -> Self {
        let state = load_or_seed(storage.as_ref());
        Session {
            store: TaskStore::from_state(state, clock),
            storage,
            save_error: None,
        }
    }

    pub fn storage(&self) -> &dyn StateStorage {
        self.storage.as_ref()
    }

    /// Saves the current state.
    pub fn commit(&self) -> Result<()> {
        self.storage.save(&self.store.to_state())
    }

    /// The reason the last save after a command failed, if it did. Reading it
    /// clears it.
    pub fn take_save_error(&mut self) -> Option<String> {
        self.save_error.take()
    }
}

/// Saves after a mutation. The in-memory state stays authoritative, so a
/// failed save is reported and the command still succeeds. Silent callers
/// pick the failure up with [`Session::take_save_error`].
fn persist(session: &mut Session, silent: bool) {
    match session.commit() {
        Ok(()) => session.save_error = None,
        Err(e) => {
            warn!(error = %e, "failed to save state");
            if !silent { eprintln!("Warning: changes could not be saved: {}", e); }
            session.save_error = Some(e.to_string());
        }
    }
}

fn parse_day_or_today(session: &Session, date: Option<&str>) -> Result<CalendarDay> {
    match date {
        Some(d) => CalendarDay::parse(d),
        None => Ok(session.store.today()),
    }
}

fn require_task(session: &Session, id: u64) -> Result<Task> {
    session.store.task(id).cloned().ok_or(TimeflowError::TaskNotFound { id })
}

/// Formats minutes as `45m` or `1h 10m`.
pub fn format_minutes(minutes: u64) -> String {
    if minutes < 60 {
        format!("{}m", minutes)
    } else if minutes % 60 == 0 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)).collect()
}

/// Adds a new task.
pub fn cmd_add(session: &mut Session, name: &str, estimate: i64, silent: bool) -> Result<Task> {
    let task = session.store.add_task(name, estimate)?;
    persist(session, silent);
    if !silent { println!("Task added (id = {})", task.id); }
    Ok(task)
}

/// Edits a task's name and/or estimate.
pub fn cmd_edit(session: &mut Session, id: u64, name: Option<&str>, estimate: Option<i64>, silent: bool) -> Result<Task> {
    let task = session.store.edit_task(id, name, estimate)?;
    persist(session, silent);
    if !silent { println!("Task {} updated.", id); }
    Ok(task)
}

/// Removes a task and every log recorded for it.
pub fn cmd_remove(session: &mut Session, id: u64, silent: bool) -> Result<Task> {
    let task = session.store.delete_task(id)?;
    persist(session, silent);
    if !silent { println!("Task {} removed along with its logs.", id); }
    Ok(task)
}

/// Logs minutes for a task on a day (today by default).
///
/// The day's completion flag is kept as it was unless `done` is set.
pub fn cmd_log(session: &mut Session, id: u64, minutes: i64, date: Option<&str>, done: bool, silent: bool) -> Result<TaskLog> {
    let day = parse_day_or_today(session, date)?;
    let completed = done || session.store.log_for(id, &day).map_or(false, |l| l.completed);
    let log = session.store.log_task(id, day, minutes, completed)?;
    persist(session, silent);
    if !silent {
        println!(
            "Logged {} for task {} on {}{}.",
            format_minutes(u64::from(log.actual_time)),
            id,
            day,
            if log.completed { " (completed)" } else { "" }
        );
    }
    Ok(log)
}

/// Marks a task complete (or, with `undo`, incomplete) for a day.
pub fn cmd_complete(session: &mut Session, id: u64, date: Option<&str>, undo: bool, silent: bool) -> Result<TaskLog> {
    let day = parse_day_or_today(session, date)?;
    let log = session.store.set_completed(id, day, !undo)?;
    persist(session, silent);
    if !silent {
        if undo {
            println!("Task {} marked incomplete for {}.", id, day);
        } else {
            println!("Task {} marked complete for {}. Streak: {}", id, day, session.store.streak());
        }
    }
    Ok(log)
}

/// Lists every task with today's progress.
pub fn cmd_list(session: &Session) {
    let tasks = session.store.tasks();
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    let today = session.store.today();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Name", "Est", "Today", "Status", "Created"]));

    for t in tasks {
        let log = session.store.log_for(t.id, &today);
        let (status, status_color) = match log {
            Some(l) if l.completed => ("Done", Color::Green),
            Some(_) => ("Logged", Color::Yellow),
            None => ("Pending", Color::Grey),
        };
        let actual = log.map(|l| format_minutes(u64::from(l.actual_time))).unwrap_or_else(|| "-".into());
        let over = log.map_or(false, |l| l.actual_time > t.estimated_time);

        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.name),
            Cell::new(format_minutes(u64::from(t.estimated_time))),
            Cell::new(actual).fg(if over { Color::Red } else { Color::Reset }),
            Cell::new(status).fg(status_color),
            Cell::new(t.created_at.date_naive()),
        ]);
    }

    println!("{table}");
}

/// Shows the tasks still open today.
pub fn cmd_today(session: &Session) {
    let pending = session.store.todays_pending_tasks();
    let today = session.store.today();
    if pending.is_empty() {
        println!("Nothing pending for {}. Enjoy your free time!", today.display());
        return;
    }
    println!("Today's focus ({}):", today.display());
    for p in pending {
        let progress = match &p.log {
            Some(l) => format!("{} of {} logged", format_minutes(u64::from(l.actual_time)), format_minutes(u64::from(p.task.estimated_time))),
            None => format!("{} estimated, not started", format_minutes(u64::from(p.task.estimated_time))),
        };
        println!("  [{}] {} - {}", p.task.id, p.task.name, progress);
    }
}

/// Shows the logs recorded for a day (today by default).
pub fn cmd_day(session: &Session, date: Option<&str>) -> Result<()> {
    let day = parse_day_or_today(session, date)?;
    let logs = session.store.logs_for_date(&day);
    if logs.is_empty() {
        println!("No tasks logged for {}.", day.display());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["Task", "Estimated", "Actual", "Status"]));
    for log in logs {
        let task = session.store.task(log.task_id);
        table.add_row(vec![
            Cell::new(task.map(|t| t.name.as_str()).unwrap_or("(deleted)")),
            Cell::new(task.map(|t| format_minutes(u64::from(t.estimated_time))).unwrap_or_else(|| "-".into())),
            Cell::new(format_minutes(u64::from(log.actual_time))),
            if log.completed { Cell::new("Completed").fg(Color::Green) } else { Cell::new("Open").fg(Color::Yellow) },
        ]);
    }
    println!("{}", day.display());
    println!("{table}");
    Ok(())
}

/// Shows every log of one task, oldest first, against its estimate.
pub fn cmd_history(session: &Session, id: u64) -> Result<()> {
    let task = require_task(session, id)?;
    let mut logs = session.store.logs_for_task(id);
    if logs.is_empty() {
        println!("No history for '{}' yet.", task.name);
        return Ok(());
    }
    logs.sort_by_key(|l| l.date);

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["Date", "Actual", "Diff", "Completed"]));
    for log in &logs {
        let diff = i64::from(log.actual_time) - i64::from(task.estimated_time);
        table.add_row(vec![
            Cell::new(log.date),
            Cell::new(format_minutes(u64::from(log.actual_time))),
            Cell::new(format!("{:+}m", diff)).fg(if diff > 0 { Color::Red } else { Color::Green }),
            Cell::new(if log.completed { "yes" } else { "no" }),
        ]);
    }
    println!("{} (estimate {})", task.name, format_minutes(u64::from(task.estimated_time)));
    println!("{table}");

    let timed: Vec<u64> = logs.iter().map(|l| u64::from(l.actual_time)).filter(|m| *m > 0).collect();
    if !timed.is_empty() {
        let avg = timed.iter().sum::<u64>() / timed.len() as u64;
        println!("Average actual time: {} over {} day(s)", format_minutes(avg), timed.len());
    }
    Ok(())
}

/// Renders a month as a calendar grid of daily summaries.
pub fn cmd_calendar(session: &Session, month: Option<&str>) -> Result<()> {
    let month = match month {
        Some(m) => YearMonth::parse(m)?,
        None => session.store.today().month(),
    };
    let summaries = session.store.monthly_summaries(month);
    let today = session.store.today();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]));

    let offset = month.first_day().date().weekday().num_days_from_monday() as usize;
    let mut row: Vec<Cell> = (0..offset).map(|_| Cell::new("")).collect();
    for day in month.days() {
        let mut text = if day == today {
            format!("*{}*", day.day_of_month())
        } else {
            day.day_of_month().to_string()
        };
        let mut cell_color = Color::Reset;
        if let Some(s) = summaries.get(&day) {
            text.push_str(&format!("\n{}/{}", s.completed_tasks, s.total_tasks));
            if s.total_actual_time > 0 {
                text.push_str(&format!("\n{}", format_minutes(s.total_actual_time)));
            }
            cell_color = if s.completed_tasks == s.total_tasks { Color::Green } else { Color::Yellow };
        }
        row.push(Cell::new(text).fg(cell_color).set_alignment(CellAlignment::Center));
        if row.len() == 7 {
            table.add_row(std::mem::take(&mut row));
        }
    }
    if !row.is_empty() {
        while row.len() < 7 {
            row.push(Cell::new(""));
        }
        table.add_row(row);
    }

    println!("{}", month.display());
    println!("{table}");

    let totals = month_totals(&summaries);
    if summaries.is_empty() {
        println!("No activity logged this month.");
    } else {
        println!(
            "{} active day(s): {}/{} tasks completed, {} spent of {} estimated",
            summaries.len(),
            totals.completed_tasks,
            totals.total_tasks,
            format_minutes(totals.total_actual_time),
            format_minutes(totals.total_estimated_time),
        );
    }
    Ok(())
}

/// Prints the current streak.
pub fn cmd_streak(session: &Session) {
    match session.store.streak() {
        0 => println!("No active streak. Complete a task today to start one!"),
        1 => println!("Current streak: 1 day"),
        n => println!("Current streak: {} days", n),
    }
}

/// Asks the advisor for an estimate adjustment and optionally applies it.
///
/// The remote call runs on a single-threaded runtime created for it; the store
/// is only touched when `apply` is set.
pub fn cmd_suggest(
    session: &mut Session,
    advisor: &dyn EstimateAdvisor,
    id: u64,
    estimate: Option<i64>,
    apply: bool,
    silent: bool,
) -> Result<Suggestion> {
    let request = SuggestionRequest::for_task(&session.store, id, estimate)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TimeflowError::RemoteSuggestion(format!("failed to start runtime: {}", e)))?;
    let suggestion = runtime.block_on(advisor.suggest(&request))?;

    if !silent {
        println!("Suggested adjustment for '{}': {:+} minutes", request.task_name, suggestion.suggested_adjustment);
        println!("Reason: {}", suggestion.reason);
    }
    if apply {
        let task = apply_suggestion(&mut session.store, id, &suggestion)?;
        persist(session, silent);
        if !silent { println!("Estimated time for \"{}\" updated to {} minutes.", task.name, task.estimated_time); }
    }
    Ok(suggestion)
}

/// Deletes all stored state; the next run starts from the seed tasks.
pub fn cmd_reset(storage: &dyn StateStorage, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks and logs? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }

    storage.clear()?;
    println!("All data reset.");
    Ok(())
}
