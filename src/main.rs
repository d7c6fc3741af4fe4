//! # caseclock
//!
//! Calendar, time tracking and billing for a small practice, from the terminal.
//! A scriptable CLI for quick entry and an interactive week agenda with a live
//! billing timer.
//!
//! ## Features
//!
//! *   **Recurring tasks**: daily, weekly, biweekly, monthly, yearly or every N
//!     days/weeks/months/years, optionally until a date. Occurrences are computed
//!     on demand, never stored.
//! *   **Billing timer**: start, pause, resume and stop a timer against any task
//!     occurrence. Time is billed in minimum units (30 minutes by default),
//!     rounded up.
//! *   **Practice statistics**: weekly revenue and profit, per-case profitability
//!     against the agreed fee, per-employee monthly hours and salary.
//!
//! ## Usage
//!
//! ```bash
//! # Weekly client meeting, 90 minutes at 500/h, until the end of June
//! caseclock add "Client meeting" --start "2025-03-03 09:00" --minutes 90 --rate 500 \
//!     --repeat weekly --until 2025-06-30
//!
//! # Every 3 days
//! caseclock add "Filing check" --start "2025-03-03 14:00" --rate 200 --repeat custom --every 3 --unit day
//!
//! # This week's agenda, or any range
//! caseclock list
//! caseclock list --from 2025-03-01 --to 2025-03-31
//!
//! # Track time against an occurrence
//! caseclock track start task_1_2
//! caseclock track pause
//! caseclock track resume
//! caseclock track stop
//!
//! # Interactive agenda
//! caseclock ui
//! ```
//!
//! ## Data Storage
//!
//! Data is saved as JSON in your local data directory:
//! *   Linux: `~/.local/share/caseclock/`
//! *   macOS: `~/Library/Application Support/caseclock/`
//! *   Windows: `%APPDATA%\caseclock\`
//!
//! Set `CASECLOCK_DB` to the path of a `tasks.json` to use another location;
//! the other files are kept next to it. Policy (billing unit, recurrence cap,
//! currency symbol) is read from `config.json` in the same directory.
//!
//! Diagnostics go to stderr and are controlled with `RUST_LOG`.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use caseclock::commands::*;
use caseclock::models::TaskStatus;
use caseclock::tui::run_tui;
use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "caseclock")]
#[command(about = "Calendar, time tracking and billing for a small practice", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Start, as "YYYY-MM-DD HH:MM"
        #[arg(short, long)]
        start: String,
        /// End, as "YYYY-MM-DD HH:MM"
        #[arg(short, long, conflicts_with = "minutes")]
        end: Option<String>,
        /// Length in minutes (default 60)
        #[arg(short, long)]
        minutes: Option<i64>,
        /// Hourly rate
        #[arg(short, long, default_value_t = 0.0)]
        rate: f64,
        /// Longer description
        #[arg(short, long)]
        description: Option<String>,
        /// Case id
        #[arg(short, long = "case")]
        case_id: Option<String>,
        /// Employee id
        #[arg(short = 'E', long = "employee")]
        employee_id: Option<String>,
        /// Display color, e.g. "#8b5cf6"
        #[arg(long)]
        color: Option<String>,
        #[command(flatten)]
        repeat: RepeatArgs,
    },
    /// List task occurrences in a date range (default: this week)
    List {
        /// First day (YYYY-MM-DD) or instant (YYYY-MM-DD HH:MM)
        #[arg(short, long)]
        from: Option<String>,
        /// Last day (YYYY-MM-DD), inclusive
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Show the occurrences a recurring task produces
    Expand {
        id: String,
        /// Expand up to this day (YYYY-MM-DD)
        #[arg(short, long)]
        until: Option<String>,
    },
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New start; the length is kept unless --end is given too
        #[arg(short, long)]
        start: Option<String>,
        /// New end
        #[arg(short, long)]
        end: Option<String>,
        /// New hourly rate
        #[arg(short, long)]
        rate: Option<f64>,
        /// New status (pending, in-progress, completed)
        #[arg(long)]
        status: Option<String>,
        /// New case id
        #[arg(short, long = "case")]
        case_id: Option<String>,
        /// New employee id
        #[arg(short = 'E', long = "employee")]
        employee_id: Option<String>,
        /// New display color
        #[arg(long)]
        color: Option<String>,
        #[command(flatten)]
        repeat: RepeatArgs,
    },
    /// Mark a task as complete
    Complete { id: String },
    /// Remove a task and all its occurrences
    Remove { id: String },
    /// Track time against a task
    Track {
        #[command(subcommand)]
        command: TrackCommands,
    },
    /// List recorded time entries
    Entries {
        /// Only entries for this task (occurrences included)
        #[arg(short, long)]
        task: Option<String>,
    },
    /// Compute the billable cost of a duration
    Cost {
        /// Elapsed seconds
        seconds: i64,
        /// Hourly rate
        #[arg(short, long)]
        rate: f64,
        /// Minimum billable unit in minutes (default from config)
        #[arg(short, long)]
        unit: Option<u32>,
    },
    /// Practice statistics
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },
    /// Manage cases
    Case {
        #[command(subcommand)]
        command: CaseCommands,
    },
    /// Manage employees
    Employee {
        #[command(subcommand)]
        command: EmployeeCommands,
    },
    /// Show the effective configuration
    Config,
    /// Reset the database (delete all data)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open the interactive week agenda
    Ui,
}

#[derive(clap::Args)]
struct RepeatArgs {
    /// Repeat (never, daily, weekly, biweekly, monthly, yearly, custom)
    #[arg(short = 'R', long)]
    repeat: Option<String>,
    /// Custom interval, 1-999
    #[arg(long)]
    every: Option<u32>,
    /// Custom unit (day, week, month, year)
    #[arg(long)]
    unit: Option<String>,
    /// Last day of the repetition (YYYY-MM-DD)
    #[arg(short, long)]
    until: Option<String>,
}

#[derive(Subcommand)]
enum TrackCommands {
    /// Start a timer on a task or occurrence id
    Start { id: String },
    /// Pause the running timer
    Pause,
    /// Resume the paused timer
    Resume,
    /// Stop the timer and record the time entry
    Stop,
    /// Show the running timer and its cost so far
    Status,
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Totals for a week
    Week {
        /// Any day of the week (default: today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Profitability per case
    Cases,
    /// Hours and salary per employee for a month
    Employees {
        /// Month as YYYY-MM (default: this month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
enum CaseCommands {
    /// Add a new case
    Add {
        name: String,
        /// Agreed total fee
        #[arg(short, long, default_value_t = 0.0)]
        fee: f64,
        /// Assigned employee ids
        #[arg(short, long = "employee")]
        employees: Vec<String>,
    },
    /// List cases
    List,
    /// Assign an employee to a case
    Assign { case_id: String, employee_id: String },
    /// Close a case
    Close { case_id: String },
    /// Remove a case
    Remove { case_id: String },
}

#[derive(Subcommand)]
enum EmployeeCommands {
    /// Add a new employee
    Add {
        name: String,
        /// Hourly salary
        #[arg(short, long)]
        salary: f64,
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List employees
    List,
    /// Remove an employee
    Remove { id: String },
}

fn run(command: Option<Commands>) -> Result<()> {
    let now = Local::now().naive_local();
    match command {
        Some(Commands::Add { title, start, end, minutes, rate, description, case_id, employee_id, color, repeat }) => {
            let draft = TaskDraft {
                title,
                description,
                start,
                end,
                minutes,
                rate,
                case_id,
                employee_id,
                color,
                repeat: repeat.repeat,
                every: repeat.every,
                unit: repeat.unit,
                until: repeat.until,
            };
            cmd_add(draft, false).map(|_| ())
        }
        Some(Commands::List { from, to }) => cmd_list(from.as_deref(), to.as_deref()),
        Some(Commands::Expand { id, until }) => cmd_expand(&id, until.as_deref()),
        Some(Commands::Edit { id, title, description, start, end, rate, status, case_id, employee_id, color, repeat }) => {
            let edit = TaskEdit {
                title,
                description,
                start,
                end,
                rate,
                status,
                case_id,
                employee_id,
                color,
                repeat: repeat.repeat,
                every: repeat.every,
                unit: repeat.unit,
                until: repeat.until,
            };
            cmd_edit(&id, edit, false)
        }
        Some(Commands::Complete { id }) => cmd_set_status(&id, TaskStatus::Completed, false),
        Some(Commands::Remove { id }) => cmd_remove(&id, false),
        Some(Commands::Track { command }) => match command {
            TrackCommands::Start { id } => cmd_track_start(&id, now, false),
            TrackCommands::Pause => cmd_track_pause(now, false),
            TrackCommands::Resume => cmd_track_resume(now, false),
            TrackCommands::Stop => cmd_track_stop(now, false).map(|_| ()),
            TrackCommands::Status => cmd_track_status(now),
        },
        Some(Commands::Entries { task }) => cmd_entries(task.as_deref()),
        Some(Commands::Cost { seconds, rate, unit }) => cmd_cost(seconds, rate, unit).map(|_| ()),
        Some(Commands::Stats { command }) => match command {
            StatsCommands::Week { date } => cmd_stats_week(date.as_deref()),
            StatsCommands::Cases => cmd_stats_cases(),
            StatsCommands::Employees { month } => cmd_stats_employees(month.as_deref()),
        },
        Some(Commands::Case { command }) => match command {
            CaseCommands::Add { name, fee, employees } => cmd_case_add(name, fee, employees, false).map(|_| ()),
            CaseCommands::List => cmd_case_list(),
            CaseCommands::Assign { case_id, employee_id } => cmd_case_assign(&case_id, &employee_id, false),
            CaseCommands::Close { case_id } => cmd_case_close(&case_id, false),
            CaseCommands::Remove { case_id } => cmd_case_remove(&case_id, false),
        },
        Some(Commands::Employee { command }) => match command {
            EmployeeCommands::Add { name, salary, email } => cmd_employee_add(name, salary, email, false).map(|_| ()),
            EmployeeCommands::List => cmd_employee_list(),
            EmployeeCommands::Remove { id } => cmd_employee_remove(&id, false),
        },
        Some(Commands::Config) => cmd_config_show(),
        Some(Commands::Reset { force }) => cmd_reset(force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => anyhow::bail!("Unsupported shell: {}", shell),
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "caseclock", &mut io::stdout());
            Ok(())
        }
        Some(Commands::Ui) | None => run_tui(),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
