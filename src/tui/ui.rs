use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode};
use crate::format::{format_currency, format_hours};
use crate::models::TaskStatus;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Agenda
            Constraint::Length(3), // Timer
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let symbol = app.config.currency_symbol.clone();
    let rows: Vec<Row> = app
        .instances
        .iter()
        .map(|t| {
            let style = match t.status {
                TaskStatus::Completed => Style::default().fg(Color::DarkGray),
                TaskStatus::InProgress => Style::default().fg(Color::Cyan),
                TaskStatus::Pending => Style::default(),
            };
            let tracking = app
                .session
                .as_ref()
                .is_some_and(|s| s.task_id == t.id);
            Row::new(vec![
                Cell::from(t.start_time.format("%a %m-%d").to_string()),
                Cell::from(format!(
                    "{}-{}",
                    t.start_time.format("%H:%M"),
                    t.end_time.format("%H:%M")
                )),
                Cell::from(if tracking { format!("● {}", t.title) } else { t.title.clone() }),
                Cell::from(format_hours(t.duration().num_seconds())),
                Cell::from(format_currency(t.hourly_rate, &symbol)),
                Cell::from(t.case_id.clone().unwrap_or_default()),
                Cell::from(t.repeat_rule.as_ref().map(|r| r.describe()).unwrap_or_default()),
                Cell::from(t.id.clone()),
            ])
            .style(style)
        })
        .collect();

    let header = Row::new(vec!["Day", "Time", "Title", "Hours", "Rate", "Case", "Repeats", "ID"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Percentage(30),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Percentage(20),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(format!(
        "Week {} to {}",
        app.week_start, app.week_end
    )))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let (timer_text, timer_style) = match app.timer_line() {
        Some(line) => (line, Style::default().fg(Color::Green)),
        None => (
            app.message.clone().unwrap_or_else(|| "No timer running".to_string()),
            Style::default().fg(Color::Gray),
        ),
    };
    let timer_title = match (&app.message, app.session.is_some()) {
        (Some(msg), true) => format!("Timer | {}", msg),
        _ => "Timer".to_string(),
    };
    let timer = Paragraph::new(timer_text)
        .style(timer_style)
        .block(Block::default().borders(Borders::ALL).title(timer_title));
    f.render_widget(timer, chunks[1]);

    let help_text = match app.input_mode {
        InputMode::Normal => {
            "q: Quit | j/k: Move | h/l: Week | t: Today | s: Start | p: Pause/Resume | x: Stop | c: Complete | a: Add | d: Delete"
        }
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);

    if app.input_mode == InputMode::Adding {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.add_state.step {
            0 => "Add Task: Enter Title",
            1 => "Add Task: Enter Start (YYYY-MM-DD HH:MM)",
            2 => "Add Task: Enter Length in Minutes (default 60)",
            3 => "Add Task: Enter Hourly Rate",
            _ => "Add Task: Enter Repeat (Optional: daily, weekly, biweekly, monthly, yearly)",
        };
        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
