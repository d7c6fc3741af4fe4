use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Case, Employee, Task, TimeEntry};
use crate::tracker::TrackingSession;

/// Returns the path to the tasks database file (`tasks.json`).
///
/// The path is determined in the following order:
/// 1. `CASECLOCK_DB` environment variable.
/// 2. `~/.local/share/caseclock/tasks.json` (on Linux).
/// 3. `./tasks.json` (fallback).
pub fn db_path() -> PathBuf {
    std::env::var("CASECLOCK_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("caseclock");
        if !p.exists() {
            if let Err(e) = fs::create_dir_all(&p) {
                warn!("Could not create data directory {}: {}", p.display(), e);
            }
        }
        p.push("tasks.json");
        p
    })
}

/// A file living next to the tasks database.
fn sibling_path(name: &str) -> PathBuf {
    let mut p = db_path();
    p.pop();
    p.push(name);
    p
}

pub fn time_entries_path() -> PathBuf {
    sibling_path("time_entries.json")
}

pub fn cases_path() -> PathBuf {
    sibling_path("cases.json")
}

pub fn employees_path() -> PathBuf {
    sibling_path("employees.json")
}

pub fn session_path() -> PathBuf {
    sibling_path("session.json")
}

pub fn config_path() -> PathBuf {
    sibling_path("config.json")
}

/// Reads a JSON value, or `None` if the file is missing or unreadable.
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let mut f = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Cannot open {}: {}", path.display(), e);
            return None;
        }
    };
    let mut s = String::new();
    if let Err(e) = f.read_to_string(&mut s) {
        warn!("Cannot read {}: {}", path.display(), e);
        return None;
    }
    match serde_json::from_str(&s) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

/// Overwrites `path` with the pretty-printed JSON of `value`.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }
    let s = serde_json::to_string_pretty(value).context("Failed to serialize data")?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    f.write_all(s.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Loads all task templates.
///
/// Returns an empty vector if the file does not exist or cannot be read.
pub fn load_tasks() -> Vec<Task> {
    read_json(&db_path()).unwrap_or_default()
}

pub fn save_tasks(tasks: &[Task]) -> Result<()> {
    write_json(&db_path(), tasks)
}

/// Loads a single template by its id.
pub fn load_task(id: &str) -> Option<Task> {
    load_tasks().into_iter().find(|t| t.id == id)
}

pub fn load_time_entries() -> Vec<TimeEntry> {
    read_json(&time_entries_path()).unwrap_or_default()
}

pub fn save_time_entries(entries: &[TimeEntry]) -> Result<()> {
    write_json(&time_entries_path(), entries)
}

/// Appends one entry to the time entry log.
pub fn append_time_entry(entry: TimeEntry) -> Result<()> {
    let mut entries = load_time_entries();
    entries.push(entry);
    save_time_entries(&entries)
}

pub fn load_cases() -> Vec<Case> {
    read_json(&cases_path()).unwrap_or_default()
}

pub fn save_cases(cases: &[Case]) -> Result<()> {
    write_json(&cases_path(), cases)
}

pub fn load_employees() -> Vec<Employee> {
    read_json(&employees_path()).unwrap_or_default()
}

pub fn save_employees(employees: &[Employee]) -> Result<()> {
    write_json(&employees_path(), employees)
}

/// The active tracking session, if any.
pub fn load_session() -> Option<TrackingSession> {
    read_json(&session_path())
}

pub fn save_session(session: &TrackingSession) -> Result<()> {
    write_json(&session_path(), session)
}

pub fn clear_session() -> Result<()> {
    let path = session_path();
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Deletes every data file. The configuration file is kept.
pub fn delete_database() -> Result<()> {
    for path in [
        db_path(),
        time_entries_path(),
        cases_path(),
        employees_path(),
        session_path(),
    ] {
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
    }
    Ok(())
}

/// Next sequential id of the form `{prefix}_{n}`.
pub fn next_id<'a>(prefix: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let marker = format!("{}_", prefix);
    let max = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(&marker)?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}_{}", prefix, max + 1)
}
