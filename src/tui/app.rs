use anyhow::Result;
use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use ratatui::widgets::TableState;
use tracing::warn;

use crate::commands::{
    cmd_add, cmd_remove, cmd_set_status, cmd_track_pause, cmd_track_resume, cmd_track_start,
    cmd_track_stop, TaskDraft,
};
use crate::config::{load_config, Config};
use crate::format::{format_currency, format_duration};
use crate::models::{Task, TaskStatus};
use crate::stats::{week_bounds, week_range};
use crate::storage::{load_session, load_tasks};
use crate::tracker::{TimerState, TrackingSession};

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Adding,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub draft: TaskDraft,
    pub step: usize, // 0: Title, 1: Start, 2: Minutes, 3: Rate, 4: Repeat
}

pub struct App {
    pub config: Config,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub instances: Vec<Task>,
    pub state: TableState,
    pub session: Option<TrackingSession>,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub add_state: AddState,
    pub message: Option<String>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl App {
    /// Creates the app on the current week and loads its agenda.
    pub fn new() -> Result<App> {
        let (week_start, week_end) = week_bounds(Local::now().date_naive());
        let mut app = App {
            config: load_config()?,
            week_start,
            week_end,
            instances: Vec::new(),
            state: TableState::default(),
            session: None,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            add_state: AddState::default(),
            message: None,
        };
        app.reload();
        Ok(app)
    }

    /// Recomputes the week's occurrences and reloads the timer.
    pub fn reload(&mut self) {
        let (start, end) = week_range(self.week_start);
        self.instances = self
            .config
            .expander()
            .instances_in_range(&load_tasks(), start, end);
        self.session = load_session();

        if self.instances.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.instances.len() {
                self.state.select(Some(self.instances.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn selected(&self) -> Option<&Task> {
        self.state.selected().and_then(|i| self.instances.get(i))
    }

    /// Selects the next occurrence.
    pub fn next(&mut self) {
        if self.instances.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.instances.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous occurrence.
    pub fn previous(&mut self) {
        if self.instances.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.instances.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Moves the agenda by `weeks` weeks.
    pub fn shift_week(&mut self, weeks: i64) {
        let days = Days::new(7 * weeks.unsigned_abs());
        let moved = if weeks >= 0 {
            self.week_start.checked_add_days(days)
        } else {
            self.week_start.checked_sub_days(days)
        };
        if let Some(start) = moved {
            self.set_week(start);
        }
    }

    pub fn this_week(&mut self) {
        self.set_week(Local::now().date_naive());
    }

    fn set_week(&mut self, date: NaiveDate) {
        let (start, end) = week_bounds(date);
        self.week_start = start;
        self.week_end = end;
        self.state.select(None);
        self.reload();
    }

    /// Runs a command, turning its outcome into the status line.
    fn report(&mut self, result: Result<String>) {
        match result {
            Ok(msg) => self.message = Some(msg),
            Err(e) => {
                warn!("{:#}", e);
                self.message = Some(format!("Error: {:#}", e));
            }
        }
        self.reload();
    }

    /// Starts the timer on the selected occurrence.
    pub fn start_tracking(&mut self) {
        let Some(task) = self.selected().cloned() else {
            return;
        };
        let result = cmd_track_start(&task.id, now(), true).map(|_| format!("Tracking {}", task.title));
        self.report(result);
    }

    /// Pauses a running timer or resumes a paused one.
    pub fn toggle_pause(&mut self) {
        let result = match self.session.as_ref().map(|s| s.state) {
            Some(TimerState::Running) => cmd_track_pause(now(), true).map(|_| "Paused".to_string()),
            Some(TimerState::Paused) => cmd_track_resume(now(), true).map(|_| "Resumed".to_string()),
            _ => return,
        };
        self.report(result);
    }

    /// Stops the timer and records the entry.
    pub fn stop_tracking(&mut self) {
        if self.session.is_none() {
            return;
        }
        let symbol = self.config.currency_symbol.clone();
        let result = cmd_track_stop(now(), true).map(|entry| {
            format!(
                "Recorded {} for {}",
                format_duration(entry.duration),
                format_currency(entry.cost, &symbol)
            )
        });
        self.report(result);
    }

    /// Marks the selected task's series as completed.
    pub fn complete_selected(&mut self) {
        let Some(task) = self.selected().cloned() else {
            return;
        };
        let id = task.parent_task_id.clone().unwrap_or(task.id.clone());
        let result = cmd_set_status(&id, TaskStatus::Completed, true).map(|_| format!("Completed {}", task.title));
        self.report(result);
    }

    /// Deletes the selected template. Occurrences cannot be deleted on their own.
    pub fn delete_selected(&mut self) {
        let Some(task) = self.selected().cloned() else {
            return;
        };
        let result = cmd_remove(&task.id, true).map(|_| format!("Removed {}", task.title));
        self.report(result);
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    /// Handles input for the "Add Task" wizard.
    pub fn handle_input(&mut self) {
        let input = self.input_buffer.trim().to_string();
        let draft = &mut self.add_state.draft;
        match self.add_state.step {
            0 => {
                // Title
                if input.is_empty() {
                    return;
                }
                draft.title = input;
            }
            1 => {
                // Start
                if input.is_empty() {
                    return;
                }
                draft.start = input;
            }
            2 => {
                // Minutes
                if input.is_empty() {
                    draft.minutes = None;
                } else if let Ok(m) = input.parse::<i64>() {
                    draft.minutes = Some(m);
                } else {
                    return;
                }
            }
            3 => {
                // Rate
                if input.is_empty() {
                    draft.rate = 0.0;
                } else if let Ok(r) = input.parse::<f64>() {
                    draft.rate = r;
                } else {
                    return;
                }
            }
            _ => {
                // Repeat, then finish
                if !input.is_empty() {
                    draft.repeat = Some(input);
                }
                let draft = std::mem::take(&mut self.add_state.draft);
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                let result = cmd_add(draft, true).map(|id| format!("Added {}", id));
                self.report(result);
                return;
            }
        }
        self.add_state.step += 1;
        self.input_buffer.clear();
    }

    /// Live elapsed time and cost estimate for the status panel.
    pub fn timer_line(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        let at = now();
        let elapsed = format_duration(session.elapsed_seconds(at));
        let estimate = match session.estimate(at, &self.config.billing) {
            Ok(cost) => format_currency(cost, &self.config.currency_symbol),
            Err(e) => format!("({})", e),
        };
        Some(format!(
            "{} {} ({})  {}  {}",
            match session.state {
                TimerState::Paused => "⏸",
                _ => "⏱",
            },
            session.task_title,
            session.task_id,
            elapsed,
            estimate
        ))
    }
}
