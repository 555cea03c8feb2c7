use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use super::app::{App, InputField, InputMode, ViewMode};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Main view
            Constraint::Length(3)  // Status + help
        ].as_ref())
        .split(f.area());

    match app.view_mode {
        ViewMode::Today => render_tasks(f, app, chunks[0]),
        ViewMode::Calendar => render_calendar(f, app, chunks[0]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Today => "q: Quit | a: Add | n: Name | e: Est | l: Log min | Space: Done | d: Del | t: Today | v: Calendar",
            ViewMode::Calendar => "q: Quit | h/l: Day | j/k: Week | [/]: Month | t: Today | Enter: Open day | v: Tasks",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };

    let mut lines = Vec::new();
    if let Some(status) = &app.status {
        lines.push(Line::styled(status.clone(), Style::default().fg(Color::Yellow)));
    }
    lines.push(Line::from(help_text));
    let help = Paragraph::new(lines)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::TOP));

    f.render_widget(help, chunks[1]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
        f.render_widget(Clear, area); // Clear the area first

        let title = match app.input_mode {
            InputMode::Adding => match app.add_state.step {
                0 => "Add Task: Enter Name",
                _ => "Add Task: Enter Estimated Minutes",
            },
            _ => match app.input_field {
                InputField::Name => "Edit Name",
                InputField::Estimate => "Edit Estimated Minutes",
                InputField::LogMinutes => "Log Minutes Spent",
                InputField::None => "Edit",
            },
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn render_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|r| {
            let (status, style) = match &r.log {
                Some(l) if l.completed => ("Done", Style::default().fg(Color::Green)),
                Some(_) => ("Logged", Style::default().fg(Color::Yellow)),
                None => ("Pending", Style::default()),
            };
            let actual = r.log.as_ref().map(|l| l.actual_time.to_string()).unwrap_or_else(|| "-".into());

            Row::new(vec![
                Cell::from(r.task.id.to_string()),
                Cell::from(r.task.name.clone()),
                Cell::from(r.task.estimated_time.to_string()),
                Cell::from(actual),
                Cell::from(status),
            ]).style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
    ];

    let day_label = if app.selected_day == app.today() {
        format!("Today, {}", app.selected_day.display())
    } else {
        app.selected_day.display()
    };
    let title = format!("Timeflow - {} - Streak: {}", day_label, app.session.store.streak());

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["ID", "Name", "Est", "Actual", "Status"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_calendar(f: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
        .split(area);

    let month = app.month();
    let summaries = app.session.store.monthly_summaries(month);
    let today = app.today();

    let offset = month.first_day().date().weekday().num_days_from_monday() as usize;
    let mut weeks: Vec<Row> = Vec::new();
    let mut week: Vec<Cell> = (0..offset).map(|_| Cell::from("")).collect();
    for day in month.days() {
        let mut lines = vec![Line::from(day.day_of_month().to_string())];
        let mut style = Style::default();
        if let Some(s) = summaries.get(&day) {
            if s.completed_tasks > 0 {
                lines.push(Line::from(format!("{}/{}", s.completed_tasks, s.total_tasks)));
            }
            if s.total_actual_time > 0 {
                lines.push(Line::from(format!("{}m", s.total_actual_time)));
            }
            style = style.fg(if s.completed_tasks == s.total_tasks { Color::Green } else { Color::Yellow });
        }
        if day == today {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if day == app.selected_day {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
        }
        week.push(Cell::from(lines).style(style));
        if week.len() == 7 {
            weeks.push(Row::new(std::mem::take(&mut week)).height(3));
        }
    }
    if !week.is_empty() {
        weeks.push(Row::new(week).height(3));
    }

    let widths = [Constraint::Ratio(1, 7); 7];
    let calendar = Table::new(weeks, widths)
        .header(Row::new(vec!["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} - Streak: {}",
            month.display(),
            app.session.store.streak()
        )));
    f.render_widget(calendar, columns[0]);

    // Selected day details
    let mut lines: Vec<Line> = Vec::new();
    let logs = app.session.store.logs_for_date(&app.selected_day);
    if logs.is_empty() {
        lines.push(Line::from("No tasks logged for this day."));
    }
    for log in logs {
        let (name, estimate) = app
            .session
            .store
            .task(log.task_id)
            .map(|t| (t.name.clone(), t.estimated_time.to_string()))
            .unwrap_or_else(|| ("(deleted)".to_string(), "-".to_string()));
        let style = if log.completed { Style::default().fg(Color::Green) } else { Style::default() };
        lines.push(Line::styled(name, style.add_modifier(Modifier::BOLD)));
        lines.push(Line::from(format!(
            "  Estimated: {} min, Actual: {} min{}",
            estimate,
            log.actual_time,
            if log.completed { " - Completed" } else { "" }
        )));
    }

    let details = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(app.selected_day.display()));
    f.render_widget(details, columns[1]);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
