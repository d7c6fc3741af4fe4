use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeDelta};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::{debug, info};

use crate::billing::BillingPolicy;
use crate::config::{load_config, Config};
use crate::format::{
    format_currency, format_datetime, format_duration, format_hours, parse_date, parse_datetime,
};
use crate::models::{Case, CaseStatus, Employee, RepeatRule, RepeatType, Task, TaskStatus, TimeEntry};
use crate::recurrence::{end_of_day, template_for};
use crate::stats::{case_progress, employee_stats, week_range, week_stats};
use crate::storage::{
    append_time_entry, clear_session, config_path, delete_database, load_cases, load_employees,
    load_session, load_task, load_tasks, load_time_entries, next_id, save_cases, save_employees,
    save_session, save_tasks,
};
use crate::tracker::{TimerState, TrackingSession};

/// Everything needed to create a task, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub start: String,
    pub end: Option<String>,
    /// Length in minutes, used when `end` is absent.
    pub minutes: Option<i64>,
    pub rate: f64,
    pub case_id: Option<String>,
    pub employee_id: Option<String>,
    pub color: Option<String>,
    pub repeat: Option<String>,
    pub every: Option<u32>,
    pub unit: Option<String>,
    pub until: Option<String>,
}

/// Field changes for an existing task. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub rate: Option<f64>,
    pub status: Option<String>,
    pub case_id: Option<String>,
    pub employee_id: Option<String>,
    pub color: Option<String>,
    pub repeat: Option<String>,
    pub every: Option<u32>,
    pub unit: Option<String>,
    pub until: Option<String>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Builds a repeat rule from CLI options. `never` (or no type) means none.
pub fn build_repeat_rule(
    repeat: Option<&str>,
    every: Option<u32>,
    unit: Option<&str>,
    until: Option<&str>,
) -> Result<Option<RepeatRule>> {
    let Some(kind) = repeat else {
        if every.is_some() || unit.is_some() || until.is_some() {
            bail!("--every, --unit and --until need --repeat");
        }
        return Ok(None);
    };
    let kind: RepeatType = kind.parse().map_err(|e: String| anyhow!(e))?;
    if kind == RepeatType::Never {
        return Ok(None);
    }
    let mut rule = RepeatRule::new(kind);
    if rule.kind == RepeatType::Custom {
        rule.custom_interval = every;
        rule.custom_unit = unit
            .map(|u| u.parse().map_err(|e: String| anyhow!(e)))
            .transpose()?;
    } else if every.is_some() || unit.is_some() {
        bail!("--every and --unit only apply to --repeat custom");
    }
    if let Some(d) = until {
        rule = rule.until(parse_date(d)?);
    }
    rule.validate().map_err(|e| anyhow!("Invalid repeat rule: {}", e))?;
    Ok(Some(rule))
}

fn check_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate < 0.0 {
        bail!("Hourly rate must be a non-negative number (got {}).", rate);
    }
    Ok(())
}

fn check_references(case_id: Option<&str>, employee_id: Option<&str>) -> Result<()> {
    if let Some(id) = case_id {
        if !load_cases().iter().any(|c| c.id == id) {
            bail!("Case {} not found.", id);
        }
    }
    if let Some(id) = employee_id {
        if !load_employees().iter().any(|e| e.id == id) {
            bail!("Employee {} not found.", id);
        }
    }
    Ok(())
}

/// Adds a new task template and returns its id.
pub fn cmd_add(draft: TaskDraft, silent: bool) -> Result<String> {
    if draft.title.trim().is_empty() {
        bail!("Task title cannot be empty.");
    }
    let start = parse_datetime(&draft.start)?;
    let end = match (&draft.end, draft.minutes) {
        (Some(e), _) => parse_datetime(e)?,
        (None, Some(m)) => TimeDelta::try_minutes(m)
            .and_then(|d| start.checked_add_signed(d))
            .ok_or_else(|| anyhow!("Task length of {} minutes is out of range.", m))?,
        (None, None) => start
            .checked_add_signed(TimeDelta::hours(1))
            .ok_or_else(|| anyhow!("Task start {} is out of range.", format_datetime(start)))?,
    };
    if end <= start {
        bail!("Task must end after it starts ({} >= {}).", format_datetime(start), format_datetime(end));
    }
    check_rate(draft.rate)?;
    check_references(draft.case_id.as_deref(), draft.employee_id.as_deref())?;
    let repeat_rule = build_repeat_rule(
        draft.repeat.as_deref(),
        draft.every,
        draft.unit.as_deref(),
        draft.until.as_deref(),
    )?;

    let mut tasks = load_tasks();
    let id = next_id("task", tasks.iter().map(|t| t.id.as_str()));
    let created = now();
    tasks.push(Task {
        id: id.clone(),
        title: draft.title,
        description: draft.description,
        start_time: start,
        end_time: end,
        hourly_rate: draft.rate,
        status: TaskStatus::Pending,
        case_id: draft.case_id,
        employee_id: draft.employee_id,
        color: draft.color,
        repeat_rule,
        parent_task_id: None,
        created_at: created,
        updated_at: created,
    });
    save_tasks(&tasks).context("Failed to save tasks")?;
    info!(task = %id, "Task added");
    if !silent {
        println!("Task added (id = {})", id);
    }
    Ok(id)
}

/// Edits a template. Occurrence ids are rejected: edits apply to the series.
pub fn cmd_edit(id: &str, edit: TaskEdit, silent: bool) -> Result<()> {
    let mut tasks = load_tasks();
    let Some(t) = tasks.iter_mut().find(|t| t.id == id) else {
        return Err(not_a_template(&load_tasks(), id));
    };

    if let Some(title) = edit.title {
        t.title = title;
    }
    if let Some(d) = edit.description {
        t.description = Some(d);
    }
    let duration = t.duration();
    if let Some(s) = edit.start {
        t.start_time = parse_datetime(&s)?;
        t.end_time = t
            .start_time
            .checked_add_signed(duration)
            .ok_or_else(|| anyhow!("New start {} pushes the end out of range.", s))?;
    }
    if let Some(e) = edit.end {
        t.end_time = parse_datetime(&e)?;
    }
    if t.end_time <= t.start_time {
        bail!("Task must end after it starts.");
    }
    if let Some(rate) = edit.rate {
        check_rate(rate)?;
        t.hourly_rate = rate;
    }
    if let Some(s) = edit.status {
        t.status = s.parse().map_err(|e: String| anyhow!(e))?;
    }
    if edit.case_id.is_some() || edit.employee_id.is_some() {
        check_references(edit.case_id.as_deref(), edit.employee_id.as_deref())?;
    }
    if let Some(c) = edit.case_id {
        t.case_id = Some(c);
    }
    if let Some(e) = edit.employee_id {
        t.employee_id = Some(e);
    }
    if let Some(c) = edit.color {
        t.color = Some(c);
    }
    if edit.repeat.is_some() {
        t.repeat_rule = build_repeat_rule(
            edit.repeat.as_deref(),
            edit.every,
            edit.unit.as_deref(),
            edit.until.as_deref(),
        )?;
    } else if edit.every.is_some() || edit.unit.is_some() || edit.until.is_some() {
        bail!("--every, --unit and --until need --repeat");
    }
    t.updated_at = now();

    save_tasks(&tasks).context("Failed to save tasks")?;
    if !silent {
        println!("Task {} updated.", id);
    }
    Ok(())
}

/// Error for an id that is not a stored template.
fn not_a_template(tasks: &[Task], id: &str) -> anyhow::Error {
    match template_for(tasks, id) {
        Some(t) => anyhow!(
            "{} is an occurrence of recurring task {}; change the series through {} instead.",
            id,
            t.id,
            t.id
        ),
        None => anyhow!("Task {} not found.", id),
    }
}

/// Sets the status of a template.
pub fn cmd_set_status(id: &str, status: TaskStatus, silent: bool) -> Result<()> {
    cmd_edit(
        id,
        TaskEdit {
            status: Some(status.to_string()),
            ..TaskEdit::default()
        },
        silent,
    )
}

/// Removes a template (and with it every occurrence).
pub fn cmd_remove(id: &str, silent: bool) -> Result<()> {
    let mut tasks = load_tasks();
    let len_before = tasks.len();
    tasks.retain(|t| t.id != id);
    if tasks.len() == len_before {
        return Err(not_a_template(&load_tasks(), id));
    }
    save_tasks(&tasks).context("Failed to save tasks")?;
    if !silent {
        println!("Task {} removed.", id);
    }
    Ok(())
}

fn task_table(instances: &[Task], config: &Config) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Start").add_attribute(Attribute::Bold),
            Cell::new("End").add_attribute(Attribute::Bold),
            Cell::new("Rate").add_attribute(Attribute::Bold),
            Cell::new("Case").add_attribute(Attribute::Bold),
            Cell::new("Repeats").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in instances {
        let status_color = match t.status {
            TaskStatus::Completed => Color::Green,
            TaskStatus::InProgress => Color::Cyan,
            TaskStatus::Pending => Color::Yellow,
        };
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.title),
            Cell::new(format_datetime(t.start_time)),
            Cell::new(t.end_time.format("%H:%M")),
            Cell::new(format_currency(t.hourly_rate, &config.currency_symbol)),
            Cell::new(t.case_id.clone().unwrap_or_default()),
            Cell::new(t.repeat_rule.as_ref().map(|r| r.describe()).unwrap_or_default()),
            Cell::new(t.status).fg(status_color),
        ]);
    }
    table
}

/// Occurrences overlapping `[from, to]` (whole days). Defaults to the
/// current week.
pub fn collect_range(from: Option<&str>, to: Option<&str>) -> Result<(NaiveDateTime, NaiveDateTime, Vec<Task>)> {
    let config = load_config()?;
    let (default_start, default_end) = week_range(Local::now().date_naive());
    let start = match from {
        Some(d) => parse_datetime(d)?,
        None => default_start,
    };
    let end = match to {
        Some(d) => end_of_day(parse_date(d)?),
        None if from.is_some() => end_of_day(start.date()),
        None => default_end,
    };
    if end < start {
        bail!("Range end {} is before its start {}.", format_datetime(end), format_datetime(start));
    }
    let instances = config.expander().instances_in_range(&load_tasks(), start, end);
    Ok((start, end, instances))
}

/// Lists task occurrences in a date range.
pub fn cmd_list(from: Option<&str>, to: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (start, end, instances) = collect_range(from, to)?;
    if instances.is_empty() {
        println!("No tasks between {} and {}.", start.date(), end.date());
        return Ok(());
    }
    println!("{}", task_table(&instances, &config));
    Ok(())
}

/// Shows every occurrence a template produces.
pub fn cmd_expand(id: &str, until: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let template = load_task(id).ok_or_else(|| not_a_template(&load_tasks(), id))?;
    let window_end = until.map(parse_date).transpose()?.map(end_of_day);
    let instances = config.expander().expand(&template, window_end);
    println!("{}", task_table(&instances, &config));
    println!("{} occurrence(s).", instances.len());
    Ok(())
}

fn resolve_occurrence(id: &str, config: &Config) -> Result<Task> {
    let tasks = load_tasks();
    if let Some(task) = config.expander().find_occurrence(&tasks, id) {
        return Ok(task);
    }
    match template_for(&tasks, id) {
        Some(t) => bail!("Recurring task {} has no occurrence {}.", t.id, id),
        None => bail!("Task {} not found.", id),
    }
}

/// Starts tracking time against a task or occurrence.
pub fn cmd_track_start(id: &str, at: NaiveDateTime, silent: bool) -> Result<()> {
    if let Some(active) = load_session() {
        bail!(
            "A timer is already {} for {} ({}). Stop it first.",
            active.state,
            active.task_title,
            active.task_id
        );
    }
    let config = load_config()?;
    let task = resolve_occurrence(id, &config)?;
    let mut session = TrackingSession::new(&task);
    session.start(at)?;

    if task.status == TaskStatus::Pending {
        let template_id = task.parent_task_id.clone().unwrap_or_else(|| task.id.clone());
        cmd_set_status(&template_id, TaskStatus::InProgress, true)?;
    }
    save_session(&session)?;
    if !silent {
        println!("Tracking {} ({}) at {}/h.", task.title, task.id, task.hourly_rate);
    }
    Ok(())
}

fn active_session() -> Result<TrackingSession> {
    load_session().ok_or_else(|| anyhow!("No timer is running."))
}

pub fn cmd_track_pause(at: NaiveDateTime, silent: bool) -> Result<()> {
    let mut session = active_session()?;
    session.pause(at)?;
    save_session(&session)?;
    if !silent {
        println!("Paused at {}.", format_duration(session.elapsed_seconds(at)));
    }
    Ok(())
}

pub fn cmd_track_resume(at: NaiveDateTime, silent: bool) -> Result<()> {
    let mut session = active_session()?;
    session.resume(at)?;
    save_session(&session)?;
    if !silent {
        println!("Resumed {}.", session.task_title);
    }
    Ok(())
}

/// Stops the timer and records its time entry.
pub fn cmd_track_stop(at: NaiveDateTime, silent: bool) -> Result<TimeEntry> {
    let config = load_config()?;
    let mut session = active_session()?;
    let entry_id = next_id("entry", load_time_entries().iter().map(|e| e.id.as_str()));
    let entry = session.stop(at, &config.billing, entry_id)?;
    append_time_entry(entry.clone()).context("Failed to save time entry")?;
    clear_session()?;
    info!(entry = %entry.id, task = %entry.task_id, duration = entry.duration, "Time entry recorded");
    if !silent {
        println!(
            "Stopped {}: {} billed {}.",
            session.task_title,
            format_duration(entry.duration),
            format_currency(entry.cost, &config.currency_symbol)
        );
    }
    Ok(entry)
}

/// Prints the running timer and its live cost estimate.
pub fn cmd_track_status(at: NaiveDateTime) -> Result<()> {
    let config = load_config()?;
    let Some(session) = load_session() else {
        println!("No timer is running.");
        return Ok(());
    };
    let elapsed = session.elapsed_seconds(at);
    let estimate = session.estimate(at, &config.billing)?;
    println!(
        "{} {} ({}): {} so far, {} at {}/h.",
        match session.state {
            TimerState::Paused => "Paused",
            _ => "Tracking",
        },
        session.task_title,
        session.task_id,
        format_duration(elapsed),
        format_currency(estimate, &config.currency_symbol),
        format_currency(session.hourly_rate, &config.currency_symbol),
    );
    Ok(())
}

/// Lists recorded time entries, optionally for one task and its occurrences.
pub fn cmd_entries(task: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let tasks = load_tasks();
    let mut entries = load_time_entries();
    if let Some(id) = task {
        entries.retain(|e| {
            e.task_id == id || template_for(&tasks, &e.task_id).is_some_and(|t| t.id == id)
        });
    }
    if entries.is_empty() {
        println!("No time entries found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Task", "Start", "End", "Duration", "Hours", "Cost"]);
    let mut total_seconds = 0;
    let mut total_cost = 0.0;
    for e in &entries {
        total_seconds += e.duration;
        total_cost += e.cost;
        let title = template_for(&tasks, &e.task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| e.task_id.clone());
        table.add_row(vec![
            e.id.clone(),
            title,
            format_datetime(e.start_time),
            e.end_time.map(format_datetime).unwrap_or_else(|| "-".into()),
            format_duration(e.duration),
            format_hours(e.duration),
            format_currency(e.cost, &config.currency_symbol),
        ]);
    }
    println!("{table}");
    println!(
        "Total: {}h, {}",
        format_hours(total_seconds),
        format_currency(total_cost, &config.currency_symbol)
    );
    Ok(())
}

/// Computes the billable cost of a duration without recording anything.
pub fn cmd_cost(seconds: i64, rate: f64, unit_minutes: Option<u32>) -> Result<f64> {
    let config = load_config()?;
    let policy = match unit_minutes {
        Some(m) => BillingPolicy::new(m)?,
        None => config.billing,
    };
    let billable = policy.billable_seconds(seconds)?;
    let amount = policy.cost(seconds, rate)?;
    println!(
        "{} elapsed, {} billed ({}-minute units): {}",
        format_duration(seconds),
        format_duration(billable),
        policy.minimum_billable_minutes,
        format_currency(amount, &config.currency_symbol)
    );
    Ok(amount)
}

pub fn cmd_stats_week(date: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let date = match date {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let stats = week_stats(
        date,
        &load_tasks(),
        &load_time_entries(),
        &load_employees(),
        &config.expander(),
    );
    let money = |v: f64| format_currency(v, &config.currency_symbol);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        format!("Week {} to {}", stats.week_start, stats.week_end),
        String::new(),
    ]);
    table.add_row(vec!["Clients".to_string(), stats.client_count.to_string()]);
    table.add_row(vec!["Hours".to_string(), format!("{:.2}", stats.total_hours)]);
    table.add_row(vec!["Revenue".to_string(), money(stats.total_revenue)]);
    table.add_row(vec!["Labour cost".to_string(), money(stats.total_cost)]);
    table.add_row(vec![
        Cell::new("Profit"),
        Cell::new(money(stats.profit)).fg(if stats.profit >= 0.0 { Color::Green } else { Color::Red }),
    ]);
    println!("{table}");
    Ok(())
}

pub fn cmd_stats_cases() -> Result<()> {
    let config = load_config()?;
    let progress = case_progress(&load_cases(), &load_tasks(), &load_time_entries(), &load_employees());
    if progress.is_empty() {
        println!("No cases found.");
        return Ok(());
    }
    let money = |v: f64| format_currency(v, &config.currency_symbol);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Case", "Fee", "Hours", "Billed", "Labour cost", "Profit"]);
    for p in progress {
        table.add_row(vec![
            Cell::new(format!("{} ({})", p.case_name, p.case_id)),
            Cell::new(money(p.total_fee)),
            Cell::new(format!("{:.2}", p.total_hours)),
            Cell::new(money(p.billed)),
            Cell::new(money(p.cost)),
            Cell::new(money(p.profit)).fg(if p.profit >= 0.0 { Color::Green } else { Color::Red }),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// `month` is `YYYY-MM`; defaults to the current month.
pub fn cmd_stats_employees(month: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let (year, month) = match month {
        Some(m) => {
            let d = NaiveDate::parse_from_str(&format!("{}-01", m.trim()), "%Y-%m-%d")
                .with_context(|| format!("Invalid month '{}'. Use YYYY-MM.", m))?;
            (d.year(), d.month())
        }
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };
    let stats = employee_stats(year, month, &load_employees(), &load_tasks(), &load_time_entries());
    if stats.is_empty() {
        println!("No employees found.");
        return Ok(());
    }
    let money = |v: f64| format_currency(v, &config.currency_symbol);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec![format!("{}-{:02}", year, month), "Hours".into(), "Revenue".into(), "Salary".into()]);
    for s in stats {
        table.add_row(vec![
            format!("{} ({})", s.employee_name, s.employee_id),
            format!("{:.2}", s.monthly_hours),
            money(s.monthly_revenue),
            money(s.monthly_salary),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Adds a case and returns its id.
pub fn cmd_case_add(name: String, fee: f64, employees: Vec<String>, silent: bool) -> Result<String> {
    if name.trim().is_empty() {
        bail!("Case name cannot be empty.");
    }
    if !fee.is_finite() || fee < 0.0 {
        bail!("Case fee must be a non-negative number (got {}).", fee);
    }
    let known = load_employees();
    for emp in &employees {
        if !known.iter().any(|e| &e.id == emp) {
            bail!("Employee {} not found.", emp);
        }
    }
    let mut cases = load_cases();
    let id = next_id("case", cases.iter().map(|c| c.id.as_str()));
    let created = now();
    cases.push(Case {
        id: id.clone(),
        name,
        total_fee: fee,
        assigned_employees: employees,
        status: CaseStatus::Active,
        created_at: created,
        updated_at: created,
    });
    save_cases(&cases).context("Failed to save cases")?;
    if !silent {
        println!("Case added (id = {})", id);
    }
    Ok(id)
}

pub fn cmd_case_list() -> Result<()> {
    let config = load_config()?;
    let cases = load_cases();
    if cases.is_empty() {
        println!("No cases found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Fee", "Employees", "Status"]);
    for c in cases {
        table.add_row(vec![
            c.id,
            c.name,
            format_currency(c.total_fee, &config.currency_symbol),
            c.assigned_employees.join(", "),
            match c.status {
                CaseStatus::Active => "active".into(),
                CaseStatus::Closed => "closed".into(),
            },
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Assigns an employee to a case.
pub fn cmd_case_assign(case_id: &str, employee_id: &str, silent: bool) -> Result<()> {
    check_references(None, Some(employee_id))?;
    let mut cases = load_cases();
    let case = cases
        .iter_mut()
        .find(|c| c.id == case_id)
        .ok_or_else(|| anyhow!("Case {} not found.", case_id))?;
    if !case.assigned_employees.iter().any(|e| e == employee_id) {
        case.assigned_employees.push(employee_id.to_string());
        case.updated_at = now();
    }
    save_cases(&cases).context("Failed to save cases")?;
    if !silent {
        println!("Employee {} assigned to case {}.", employee_id, case_id);
    }
    Ok(())
}

pub fn cmd_case_close(case_id: &str, silent: bool) -> Result<()> {
    let mut cases = load_cases();
    let case = cases
        .iter_mut()
        .find(|c| c.id == case_id)
        .ok_or_else(|| anyhow!("Case {} not found.", case_id))?;
    case.status = CaseStatus::Closed;
    case.updated_at = now();
    save_cases(&cases).context("Failed to save cases")?;
    if !silent {
        println!("Case {} closed.", case_id);
    }
    Ok(())
}

/// Removes a case and detaches the tasks that referenced it.
pub fn cmd_case_remove(case_id: &str, silent: bool) -> Result<()> {
    let mut cases = load_cases();
    let len_before = cases.len();
    cases.retain(|c| c.id != case_id);
    if cases.len() == len_before {
        bail!("Case {} not found.", case_id);
    }
    save_cases(&cases).context("Failed to save cases")?;

    let mut tasks = load_tasks();
    let mut updated = false;
    for t in tasks.iter_mut() {
        if t.case_id.as_deref() == Some(case_id) {
            t.case_id = None;
            updated = true;
        }
    }
    if updated {
        save_tasks(&tasks).context("Failed to update tasks")?;
    }
    if !silent {
        println!("Case {} removed.", case_id);
    }
    Ok(())
}

/// Adds an employee and returns their id.
pub fn cmd_employee_add(name: String, salary: f64, email: Option<String>, silent: bool) -> Result<String> {
    if name.trim().is_empty() {
        bail!("Employee name cannot be empty.");
    }
    if !salary.is_finite() || salary < 0.0 {
        bail!("Hourly salary must be a non-negative number (got {}).", salary);
    }
    let mut employees = load_employees();
    let id = next_id("emp", employees.iter().map(|e| e.id.as_str()));
    employees.push(Employee {
        id: id.clone(),
        name,
        hourly_salary: salary,
        email: email.map(|e| e.to_lowercase()),
        created_at: now(),
    });
    save_employees(&employees).context("Failed to save employees")?;
    if !silent {
        println!("Employee added (id = {})", id);
    }
    Ok(id)
}

pub fn cmd_employee_list() -> Result<()> {
    let config = load_config()?;
    let employees = load_employees();
    if employees.is_empty() {
        println!("No employees found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Hourly salary", "Email"]);
    for e in employees {
        table.add_row(vec![
            e.id,
            e.name,
            format_currency(e.hourly_salary, &config.currency_symbol),
            e.email.unwrap_or_else(|| "-".into()),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Removes an employee, unassigning them from cases and tasks.
pub fn cmd_employee_remove(employee_id: &str, silent: bool) -> Result<()> {
    let mut employees = load_employees();
    let len_before = employees.len();
    employees.retain(|e| e.id != employee_id);
    if employees.len() == len_before {
        bail!("Employee {} not found.", employee_id);
    }
    save_employees(&employees).context("Failed to save employees")?;

    let mut cases = load_cases();
    for c in cases.iter_mut() {
        c.assigned_employees.retain(|e| e != employee_id);
    }
    save_cases(&cases).context("Failed to update cases")?;

    let mut tasks = load_tasks();
    for t in tasks.iter_mut() {
        if t.employee_id.as_deref() == Some(employee_id) {
            t.employee_id = None;
        }
    }
    save_tasks(&tasks).context("Failed to update tasks")?;

    if !silent {
        println!("Employee {} removed.", employee_id);
    }
    Ok(())
}

/// Prints the effective configuration.
pub fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    println!("# {}", config_path().display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Resets the database by deleting all data files.
pub fn cmd_reset(force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks, time entries, cases and employees? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    delete_database().context("Failed to reset database")?;
    debug!("Database reset");
    println!("Database reset successfully.");
    Ok(())
}

