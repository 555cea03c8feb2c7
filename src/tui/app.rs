use ratatui::widgets::TableState;
use tracing::warn;

use crate::commands::{cmd_add, cmd_complete, cmd_edit, cmd_log, cmd_remove, Session};
use crate::dates::{CalendarDay, YearMonth};
use crate::error::Result;
use crate::models::{Task, TaskLog};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
    Adding,
}

#[derive(PartialEq, Clone, Copy)]
pub enum ViewMode {
    Today,
    Calendar,
}

pub enum InputField {
    None,
    Name,
    Estimate,
    LogMinutes,
}

/// A task with whatever was logged for it on the selected day.
pub struct TaskRow {
    pub task: Task,
    pub log: Option<TaskLog>,
}

pub struct App {
    pub session: Session,
    pub rows: Vec<TaskRow>,
    pub state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_field: InputField,
    pub input_buffer: String,
    pub target_id: Option<u64>,
    pub add_state: AddState,
    /// Day shown in the calendar, and whose logs the task view edits.
    pub selected_day: CalendarDay,
    /// Outcome of the last action, shown above the help line.
    pub status: Option<String>,
}

/// State for the two-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub name: String,
    pub step: usize, // 0: Name, 1: Estimate
}

impl App {
    /// Creates a new App around an opened session.
    pub fn new(session: Session) -> App {
        let today = session.store.today();
        let mut app = App {
            session,
            rows: Vec::new(),
            state: TableState::default(),
            view_mode: ViewMode::Today,
            input_mode: InputMode::Normal,
            input_field: InputField::None,
            input_buffer: String::new(),
            target_id: None,
            add_state: AddState::default(),
            selected_day: today,
            status: None,
        };
        app.reload();
        app
    }

    pub fn today(&self) -> CalendarDay {
        self.session.store.today()
    }

    pub fn month(&self) -> YearMonth {
        self.selected_day.month()
    }

    /// Rebuilds the task rows for the selected day from the store.
    pub fn reload(&mut self) {
        let day = self.selected_day;
        let store = &self.session.store;
        self.rows = store
            .tasks()
            .iter()
            .map(|t| TaskRow {
                task: t.clone(),
                log: store.log_for(t.id, &day).cloned(),
            })
            .collect();

        if self.rows.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.rows.len() {
                self.state.select(Some(self.rows.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Records the outcome of an action in the status line.
    fn report<T>(&mut self, result: Result<T>, success: impl FnOnce(&T) -> String) {
        let save_error = self.session.take_save_error();
        self.status = Some(match result {
            Ok(value) => match save_error {
                Some(e) => format!("{} Not saved: {}", success(&value), e),
                None => success(&value),
            },
            Err(e) => {
                warn!(error = %e, "tui action failed");
                format!("Error: {}", e)
            }
        });
        self.reload();
    }

    fn selected_task_id(&self) -> Option<u64> {
        self.state
            .selected()
            .and_then(|i| self.rows.get(i))
            .map(|row| row.task.id)
    }

    /// Selects the next task.
    pub fn next(&mut self) {
        if self.rows.is_empty() { return; }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task.
    pub fn previous(&mut self) {
        if self.rows.is_empty() { return; }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Flips the selected task's completion for the selected day.
    pub fn toggle_selected(&mut self) {
        let Some(i) = self.state.selected() else { return };
        let Some(row) = self.rows.get(i) else { return };
        let id = row.task.id;
        let done = row.log.as_ref().map_or(false, |l| l.completed);
        let day = self.selected_day.to_string();
        let result = cmd_complete(&mut self.session, id, Some(&day), done, true);
        let streak = self.session.store.streak();
        self.report(result, |log| {
            if log.completed {
                format!("Task completed. Streak: {}", streak)
            } else {
                "Task marked incomplete.".to_string()
            }
        });
    }

    /// Deletes the selected task and its logs.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_task_id() else { return };
        let result = cmd_remove(&mut self.session, id, true);
        self.report(result, |task| format!("\"{}\" has been removed.", task.name));
    }

    /// Moves the selected day, carrying the calendar month along.
    pub fn shift_day(&mut self, days: i64) {
        if let Ok(day) = self.selected_day.add_days(days) {
            self.selected_day = day;
            self.reload();
        }
    }

    pub fn shift_month(&mut self, forward: bool) {
        let month = if forward { self.month().next() } else { self.month().previous() };
        // keep the day of month when it exists in the new month
        let day = month
            .days()
            .into_iter()
            .find(|d| d.day_of_month() == self.selected_day.day_of_month())
            .or_else(|| month.days().last().copied())
            .unwrap_or_else(|| month.first_day());
        self.selected_day = day;
        self.reload();
    }

    pub fn jump_to_today(&mut self) {
        self.selected_day = self.today();
        self.reload();
    }

    /// Toggles between the task list and the calendar.
    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Today => ViewMode::Calendar,
            ViewMode::Calendar => ViewMode::Today,
        };
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Initiates editing of a specific field for the selected task.
    pub fn start_edit(&mut self, field: InputField) {
        let Some(i) = self.state.selected() else { return };
        let Some(row) = self.rows.get(i) else { return };
        self.target_id = Some(row.task.id);

        // Pre-fill buffer for editing
        self.input_buffer = match field {
            InputField::Name => row.task.name.clone(),
            InputField::Estimate => row.task.estimated_time.to_string(),
            InputField::LogMinutes => row.log.as_ref().map(|l| l.actual_time.to_string()).unwrap_or_default(),
            InputField::None => String::new(),
        };
        self.input_field = field;
        self.input_mode = InputMode::Editing;
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles text input based on the current mode.
    pub fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input(),
            InputMode::Editing => self.handle_editing_input(),
            InputMode::Normal => {}
        }
    }

    fn handle_adding_input(&mut self) {
        match self.add_state.step {
            0 => { // Name
                if !self.input_buffer.trim().is_empty() {
                    self.add_state.name = self.input_buffer.clone();
                    self.add_state.step += 1;
                    self.input_buffer.clear();
                }
            }
            _ => { // Estimate
                let Ok(minutes) = self.input_buffer.trim().parse::<i64>() else {
                    self.status = Some("Estimated time must be a whole number of minutes.".to_string());
                    return;
                };
                let name = self.add_state.name.clone();
                let result = cmd_add(&mut self.session, &name, minutes, true);
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                self.report(result, |task| format!("\"{}\" added.", task.name));
            }
        }
    }

    fn handle_editing_input(&mut self) {
        let Some(id) = self.target_id else { return };
        let buffer = self.input_buffer.trim().to_string();
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();

        match self.input_field {
            InputField::Name => {
                let result = cmd_edit(&mut self.session, id, Some(&buffer), None, true);
                self.report(result, |task| format!("\"{}\" has been updated.", task.name));
            }
            InputField::Estimate => match buffer.parse::<i64>() {
                Ok(minutes) => {
                    let result = cmd_edit(&mut self.session, id, None, Some(minutes), true);
                    self.report(result, |task| format!("Estimate for \"{}\" is now {} min.", task.name, task.estimated_time));
                }
                Err(_) => self.status = Some("Estimated time must be a whole number of minutes.".to_string()),
            },
            InputField::LogMinutes => match buffer.parse::<i64>() {
                Ok(minutes) => {
                    let day = self.selected_day.to_string();
                    let result = cmd_log(&mut self.session, id, minutes, Some(&day), false, true);
                    self.report(result, |log| format!("Logged {} min.", log.actual_time));
                }
                Err(_) => self.status = Some("Actual time must be a whole number of minutes.".to_string()),
            },
            InputField::None => {}
        }
    }
}
