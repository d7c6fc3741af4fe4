//! Practice-level aggregates over tasks and tracked time.
//!
//! Revenue is what was billed (the frozen cost of each time entry); labour
//! cost is tracked hours times the hourly salary of the employee assigned
//! to the task the time was tracked against.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::models::{Case, Employee, Task, TimeEntry};
use crate::recurrence::{end_of_day, template_for, RecurrenceExpander};

#[derive(Debug, Clone, PartialEq)]
pub struct WeekStats {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub client_count: usize,
    pub total_hours: f64,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseProgress {
    pub case_id: String,
    pub case_name: String,
    pub total_fee: f64,
    pub total_hours: f64,
    pub billed: f64,
    pub cost: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeStats {
    pub employee_id: String,
    pub employee_name: String,
    pub monthly_hours: f64,
    pub monthly_revenue: f64,
    pub monthly_salary: f64,
}

/// Monday and Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let week = date.week(Weekday::Mon);
    (week.first_day(), week.last_day())
}

/// `[Monday 00:00, Sunday 23:59:59.999]` for the week containing `date`.
pub fn week_range(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let (monday, sunday) = week_bounds(date);
    (monday.and_time(NaiveTime::MIN), end_of_day(sunday))
}

/// Labour cost of one entry, zero when the task or employee is unknown.
fn labour_cost(entry: &TimeEntry, tasks: &[Task], salaries: &HashMap<&str, f64>) -> f64 {
    template_for(tasks, &entry.task_id)
        .and_then(|t| t.employee_id.as_deref())
        .and_then(|emp| salaries.get(emp))
        .map(|salary| entry.hours() * salary)
        .unwrap_or(0.0)
}

fn salary_map(employees: &[Employee]) -> HashMap<&str, f64> {
    employees
        .iter()
        .map(|e| (e.id.as_str(), e.hourly_salary))
        .collect()
}

/// Totals for the Monday-to-Sunday week containing `date`.
pub fn week_stats(
    date: NaiveDate,
    tasks: &[Task],
    entries: &[TimeEntry],
    employees: &[Employee],
    expander: &RecurrenceExpander,
) -> WeekStats {
    let (week_start, week_end) = week_bounds(date);
    let (start, end) = week_range(date);

    let clients: HashSet<String> = expander
        .instances_in_range(tasks, start, end)
        .into_iter()
        .filter_map(|i| i.case_id)
        .collect();

    let week_entries: Vec<&TimeEntry> = entries
        .iter()
        .filter(|e| e.start_time >= start && e.start_time <= end)
        .collect();

    let salaries = salary_map(employees);
    let total_seconds: i64 = week_entries.iter().map(|e| e.duration).sum();
    let total_revenue: f64 = week_entries.iter().map(|e| e.cost).sum();
    let total_cost: f64 = week_entries
        .iter()
        .map(|e| labour_cost(e, tasks, &salaries))
        .sum();

    WeekStats {
        week_start,
        week_end,
        client_count: clients.len(),
        total_hours: total_seconds as f64 / 3600.0,
        total_revenue,
        total_cost,
        profit: total_revenue - total_cost,
    }
}

/// Hours, labour cost and profit against the fixed fee, per case.
pub fn case_progress(
    cases: &[Case],
    tasks: &[Task],
    entries: &[TimeEntry],
    employees: &[Employee],
) -> Vec<CaseProgress> {
    let salaries = salary_map(employees);
    cases
        .iter()
        .map(|case| {
            let case_entries: Vec<&TimeEntry> = entries
                .iter()
                .filter(|e| {
                    template_for(tasks, &e.task_id)
                        .is_some_and(|t| t.case_id.as_deref() == Some(case.id.as_str()))
                })
                .collect();
            let total_seconds: i64 = case_entries.iter().map(|e| e.duration).sum();
            let billed: f64 = case_entries.iter().map(|e| e.cost).sum();
            let cost: f64 = case_entries
                .iter()
                .map(|e| labour_cost(e, tasks, &salaries))
                .sum();
            CaseProgress {
                case_id: case.id.clone(),
                case_name: case.name.clone(),
                total_fee: case.total_fee,
                total_hours: total_seconds as f64 / 3600.0,
                billed,
                cost,
                profit: case.total_fee - cost,
            }
        })
        .collect()
}

/// Hours, billed revenue and salary per employee for one calendar month.
pub fn employee_stats(
    year: i32,
    month: u32,
    employees: &[Employee],
    tasks: &[Task],
    entries: &[TimeEntry],
) -> Vec<EmployeeStats> {
    employees
        .iter()
        .map(|emp| {
            let emp_entries: Vec<&TimeEntry> = entries
                .iter()
                .filter(|e| e.start_time.year() == year && e.start_time.month() == month)
                .filter(|e| {
                    template_for(tasks, &e.task_id)
                        .is_some_and(|t| t.employee_id.as_deref() == Some(emp.id.as_str()))
                })
                .collect();
            let total_seconds: i64 = emp_entries.iter().map(|e| e.duration).sum();
            let monthly_hours = total_seconds as f64 / 3600.0;
            EmployeeStats {
                employee_id: emp.id.clone(),
                employee_name: emp.name.clone(),
                monthly_hours,
                monthly_revenue: emp_entries.iter().map(|e| e.cost).sum(),
                monthly_salary: monthly_hours * emp.hourly_salary,
            }
        })
        .collect()
}
