pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use app::{App, InputField, InputMode, ViewMode};
use ui::ui;

use crate::commands::Session;

pub fn run_tui(session: Session) -> Result<(), Box<dyn Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);

    // Run loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.map_err(|e| e.into())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match app.input_mode {
            InputMode::Normal => match (app.view_mode, key.code) {
                (_, KeyCode::Char('q')) => return Ok(()),
                (_, KeyCode::Char('v')) => app.toggle_view(),
                (_, KeyCode::Char('t')) => app.jump_to_today(),
                (ViewMode::Today, KeyCode::Down | KeyCode::Char('j')) => app.next(),
                (ViewMode::Today, KeyCode::Up | KeyCode::Char('k')) => app.previous(),
                (ViewMode::Today, KeyCode::Char(' ')) => app.toggle_selected(),
                (ViewMode::Today, KeyCode::Char('d') | KeyCode::Delete) => app.delete_selected(),
                (ViewMode::Today, KeyCode::Char('a')) => app.start_add(),
                (ViewMode::Today, KeyCode::Char('n')) => app.start_edit(InputField::Name),
                (ViewMode::Today, KeyCode::Char('e')) => app.start_edit(InputField::Estimate),
                (ViewMode::Today, KeyCode::Char('l')) => app.start_edit(InputField::LogMinutes),
                (ViewMode::Calendar, KeyCode::Left | KeyCode::Char('h')) => app.shift_day(-1),
                (ViewMode::Calendar, KeyCode::Right | KeyCode::Char('l')) => app.shift_day(1),
                (ViewMode::Calendar, KeyCode::Up | KeyCode::Char('k')) => app.shift_day(-7),
                (ViewMode::Calendar, KeyCode::Down | KeyCode::Char('j')) => app.shift_day(7),
                (ViewMode::Calendar, KeyCode::Char('[')) => app.shift_month(false),
                (ViewMode::Calendar, KeyCode::Char(']')) => app.shift_month(true),
                (ViewMode::Calendar, KeyCode::Enter) => app.toggle_view(),
                _ => {}
            },
            InputMode::Editing | InputMode::Adding => match key.code {
                KeyCode::Enter => app.handle_input(),
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Char(c) => {
                    app.input_buffer.push(c);
                }
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                }
                _ => {}
            }
        }
    }
}
