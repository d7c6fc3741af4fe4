use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Workflow status of a task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" | "inprogress" | "active" => Ok(TaskStatus::InProgress),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(format!(
                "unknown status '{}'. Supported: pending, in-progress, completed",
                s
            )),
        }
    }
}

/// How often a task repeats.
///
/// Stored rules are read leniently: a value this build does not know about is
/// kept as `Unknown` instead of failing the whole file, and expansion stops at
/// the template when it meets one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum RepeatType {
    Never,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    Custom,
    Unknown(String),
}

impl RepeatType {
    fn as_str(&self) -> &str {
        match self {
            RepeatType::Never => "never",
            RepeatType::Daily => "daily",
            RepeatType::Weekly => "weekly",
            RepeatType::Biweekly => "biweekly",
            RepeatType::Monthly => "monthly",
            RepeatType::Yearly => "yearly",
            RepeatType::Custom => "custom",
            RepeatType::Unknown(s) => s,
        }
    }
}

impl From<String> for RepeatType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "never" => RepeatType::Never,
            "daily" => RepeatType::Daily,
            "weekly" => RepeatType::Weekly,
            "biweekly" => RepeatType::Biweekly,
            "monthly" => RepeatType::Monthly,
            "yearly" => RepeatType::Yearly,
            "custom" => RepeatType::Custom,
            _ => RepeatType::Unknown(s),
        }
    }
}

impl From<RepeatType> for String {
    fn from(t: RepeatType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match RepeatType::from(s.to_lowercase()) {
            RepeatType::Unknown(_) => Err(format!(
                "unknown repeat type '{}'. Supported: never, daily, weekly, biweekly, monthly, yearly, custom",
                s
            )),
            t => Ok(t),
        }
    }
}

/// Unit of a custom repeat interval.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
    Year,
    Unknown(String),
}

impl RepeatUnit {
    fn as_str(&self) -> &str {
        match self {
            RepeatUnit::Day => "day",
            RepeatUnit::Week => "week",
            RepeatUnit::Month => "month",
            RepeatUnit::Year => "year",
            RepeatUnit::Unknown(s) => s,
        }
    }
}

impl From<String> for RepeatUnit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "day" => RepeatUnit::Day,
            "week" => RepeatUnit::Week,
            "month" => RepeatUnit::Month,
            "year" => RepeatUnit::Year,
            _ => RepeatUnit::Unknown(s),
        }
    }
}

impl From<RepeatUnit> for String {
    fn from(u: RepeatUnit) -> Self {
        u.as_str().to_string()
    }
}

impl fmt::Display for RepeatUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower).to_string();
        match RepeatUnit::from(singular) {
            RepeatUnit::Unknown(_) => Err(format!(
                "unknown repeat unit '{}'. Supported: day, week, month, year",
                s
            )),
            u => Ok(u),
        }
    }
}

/// Whether a repeat rule runs forever or until a date.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    #[default]
    Never,
    Date,
}

/// A repeat rule attached to a template task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepeatRule {
    #[serde(rename = "type")]
    pub kind: RepeatType,
    #[serde(default)]
    pub custom_interval: Option<u32>,
    #[serde(default)]
    pub custom_unit: Option<RepeatUnit>,
    #[serde(default)]
    pub end_type: EndType,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl RepeatRule {
    /// A rule of the given type that never ends.
    pub fn new(kind: RepeatType) -> Self {
        RepeatRule {
            kind,
            custom_interval: None,
            custom_unit: None,
            end_type: EndType::Never,
            end_date: None,
        }
    }

    /// Every `interval` `unit`s.
    pub fn custom(interval: u32, unit: RepeatUnit) -> Self {
        RepeatRule {
            custom_interval: Some(interval),
            custom_unit: Some(unit),
            ..RepeatRule::new(RepeatType::Custom)
        }
    }

    /// Ends the rule on `date` (inclusive).
    pub fn until(mut self, date: NaiveDate) -> Self {
        self.end_type = EndType::Date;
        self.end_date = Some(date);
        self
    }

    /// Checks the structural invariants of the rule.
    pub fn validate(&self) -> Result<(), String> {
        match &self.kind {
            RepeatType::Unknown(t) => return Err(format!("unknown repeat type '{}'", t)),
            RepeatType::Custom => {
                match self.custom_interval {
                    Some(n) if (1..=999).contains(&n) => {}
                    Some(n) => return Err(format!("custom interval {} is outside 1..=999", n)),
                    None => return Err("custom repeat needs an interval".into()),
                }
                match &self.custom_unit {
                    Some(RepeatUnit::Unknown(u)) => {
                        return Err(format!("unknown repeat unit '{}'", u))
                    }
                    Some(_) => {}
                    None => return Err("custom repeat needs a unit".into()),
                }
            }
            _ => {}
        }
        if self.end_type == EndType::Date && self.end_date.is_none() {
            return Err("repeat rule ends on a date but has no end date".into());
        }
        Ok(())
    }

    /// Short human-readable description, e.g. `every 2 weeks until 2025-06-30`.
    pub fn describe(&self) -> String {
        let base = match (&self.kind, self.custom_interval, &self.custom_unit) {
            (RepeatType::Custom, Some(n), Some(u)) => format!("every {} {}(s)", n, u),
            (kind, _, _) => kind.to_string(),
        };
        match (self.end_type, self.end_date) {
            (EndType::Date, Some(d)) => format!("{} until {}", base, d),
            _ => base,
        }
    }
}

/// A scheduled piece of work. Either a user-authored template or an
/// occurrence derived from one, in which case `parent_task_id` names the
/// template.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub hourly_rate: f64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub case_id: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub repeat_rule: Option<RepeatRule>,
    #[serde(default)]
    pub parent_task_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    /// Length of one occurrence.
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }

    /// Whether this value was derived from a template.
    pub fn is_instance(&self) -> bool {
        self.parent_task_id.is_some()
    }

    /// Whether the task has a rule that produces more than one occurrence.
    pub fn is_recurring(&self) -> bool {
        self.repeat_rule
            .as_ref()
            .is_some_and(|r| r.kind != RepeatType::Never)
    }

    /// Closed-interval overlap with `[start, end]`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_time <= end && self.end_time >= start
    }
}

/// Time tracked against a task. Created by stopping a tracking session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub task_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    /// Whole seconds, paused intervals excluded.
    pub duration: i64,
    pub cost: f64,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl TimeEntry {
    pub fn hours(&self) -> f64 {
        self.duration as f64 / 3600.0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    #[default]
    Active,
    Closed,
}

/// A client matter with a fixed total fee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub name: String,
    pub total_fee: f64,
    #[serde(default)]
    pub assigned_employees: Vec<String>,
    #[serde(default)]
    pub status: CaseStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub hourly_salary: f64,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: NaiveDateTime,
}
