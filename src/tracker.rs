use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::billing::{BillingError, BillingPolicy};
use crate::models::{Task, TimeEntry};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("cannot {action} a timer that is {from}")]
    InvalidTransition {
        from: TimerState,
        action: &'static str,
    },

    #[error(transparent)]
    Billing(#[from] BillingError),
}

/// The single timer running against a task.
///
/// `idle -> running -> paused -> running -> ... -> stopped`. Time accrues only
/// while running; stopping is terminal and yields one [`TimeEntry`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    pub task_id: String,
    pub task_title: String,
    pub hourly_rate: f64,
    pub state: TimerState,
    #[serde(default)]
    pub started_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub paused_at: Option<NaiveDateTime>,
    /// Seconds spent in completed pauses.
    #[serde(default)]
    pub paused_seconds: i64,
}

impl TrackingSession {
    /// An idle session for `task` (a template or one of its occurrences).
    pub fn new(task: &Task) -> Self {
        TrackingSession {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            hourly_rate: task.hourly_rate,
            state: TimerState::Idle,
            started_at: None,
            paused_at: None,
            paused_seconds: 0,
        }
    }

    fn transition(&self, allowed: &[TimerState], action: &'static str) -> Result<(), TrackerError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(TrackerError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    pub fn start(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        self.transition(&[TimerState::Idle], "start")?;
        self.started_at = Some(now);
        self.state = TimerState::Running;
        debug!(task = %self.task_id, at = %now, "Timer started");
        Ok(())
    }

    pub fn pause(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        self.transition(&[TimerState::Running], "pause")?;
        self.paused_at = Some(now);
        self.state = TimerState::Paused;
        debug!(task = %self.task_id, at = %now, "Timer paused");
        Ok(())
    }

    pub fn resume(&mut self, now: NaiveDateTime) -> Result<(), TrackerError> {
        self.transition(&[TimerState::Paused], "resume")?;
        self.close_pause(now);
        self.state = TimerState::Running;
        debug!(task = %self.task_id, paused = self.paused_seconds, "Timer resumed");
        Ok(())
    }

    fn close_pause(&mut self, now: NaiveDateTime) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_seconds += (now - paused_at).num_seconds().max(0);
        }
    }

    /// Seconds accrued as of `now`, paused intervals excluded. A paused
    /// timer reports the value it had when it was paused. Never negative,
    /// even if the clock has been set back since the timer started.
    pub fn elapsed_seconds(&self, now: NaiveDateTime) -> i64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let until = match (self.state, self.paused_at) {
            (TimerState::Paused, Some(paused_at)) => paused_at,
            _ => now,
        };
        let span = (until - started_at).num_seconds().max(0);
        (span - self.paused_seconds).max(0)
    }

    /// Running cost estimate, identical to what [`stop`](Self::stop) would
    /// record at the same instant.
    pub fn estimate(&self, now: NaiveDateTime, policy: &BillingPolicy) -> Result<f64, BillingError> {
        policy.cost(self.elapsed_seconds(now), self.hourly_rate)
    }

    /// Stops the timer and produces its time entry.
    ///
    /// The session stays unchanged if billing rejects the duration.
    pub fn stop(
        &mut self,
        now: NaiveDateTime,
        policy: &BillingPolicy,
        entry_id: String,
    ) -> Result<TimeEntry, TrackerError> {
        self.transition(&[TimerState::Running, TimerState::Paused], "stop")?;
        let duration = self.elapsed_seconds(now);
        let cost = policy.cost(duration, self.hourly_rate)?;
        let started_at = self.started_at.unwrap_or(now);

        self.close_pause(now);
        self.state = TimerState::Stopped;
        debug!(task = %self.task_id, duration, cost, "Timer stopped");

        Ok(TimeEntry {
            id: entry_id,
            task_id: self.task_id.clone(),
            start_time: started_at,
            end_time: Some(now),
            duration,
            cost,
            is_active: false,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 3)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn session() -> TrackingSession {
        TrackingSession {
            task_id: "task_1".into(),
            task_title: "Drafting".into(),
            hourly_rate: 500.0,
            state: TimerState::Idle,
            started_at: None,
            paused_at: None,
            paused_seconds: 0,
        }
    }

    #[test]
    fn idle_timer_has_no_elapsed_time() {
        assert_eq!(session().elapsed_seconds(at(12, 0, 0)), 0);
    }

    #[test]
    fn paused_timer_freezes() {
        let mut s = session();
        s.start(at(9, 0, 0)).unwrap();
        s.pause(at(9, 10, 0)).unwrap();
        assert_eq!(s.elapsed_seconds(at(9, 10, 0)), 600);
        assert_eq!(s.elapsed_seconds(at(11, 0, 0)), 600);
    }

    #[test]
    fn cannot_start_twice() {
        let mut s = session();
        s.start(at(9, 0, 0)).unwrap();
        assert_eq!(
            s.start(at(9, 1, 0)),
            Err(TrackerError::InvalidTransition {
                from: TimerState::Running,
                action: "start"
            })
        );
    }
}
