use caseclock::commands::*;
use caseclock::models::{RepeatType, TaskStatus};
use caseclock::storage::{load_cases, load_employees, load_session, load_tasks, load_time_entries, save_tasks};
use caseclock::tracker::TimerState;
use chrono::{NaiveDate, NaiveDateTime};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

// Tests share the CASECLOCK_DB environment variable, so they run one at a time.
static TEST_MUTEX: Mutex<()> = Mutex::new(());

fn with_test_db<F>(f: F)
where
    F: FnOnce(PathBuf),
{
    let _guard = TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tasks.json");
    env::set_var("CASECLOCK_DB", &db_path);

    f(db_path);

    env::remove_var("CASECLOCK_DB");
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn draft(title: &str, start: &str) -> TaskDraft {
    TaskDraft {
        title: title.into(),
        start: start.into(),
        rate: 500.0,
        ..TaskDraft::default()
    }
}

#[test]
fn test_add_and_list() {
    with_test_db(|_| {
        let id = cmd_add(
            TaskDraft {
                minutes: Some(90),
                ..draft("Client meeting", "2025-03-03 09:00")
            },
            true,
        )
        .unwrap();
        assert_eq!(id, "task_1");

        let tasks = load_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Client meeting");
        assert_eq!(tasks[0].start_time, at(3, 9, 0));
        assert_eq!(tasks[0].end_time, at(3, 10, 30));
        assert_eq!(tasks[0].status, TaskStatus::Pending);

        let (_, _, found) = collect_range(Some("2025-03-03"), Some("2025-03-09")).unwrap();
        assert_eq!(found.len(), 1);
        assert!(cmd_list(Some("2025-03-03"), Some("2025-03-09")).is_ok());
    });
}

#[test]
fn test_add_rejects_bad_input() {
    with_test_db(|_| {
        assert!(cmd_add(draft("  ", "2025-03-03 09:00"), true).is_err());
        assert!(cmd_add(draft("Call", "not a date"), true).is_err());
        assert!(cmd_add(
            TaskDraft {
                end: Some("2025-03-03 08:00".into()),
                ..draft("Call", "2025-03-03 09:00")
            },
            true
        )
        .is_err());
        assert!(cmd_add(
            TaskDraft {
                rate: -1.0,
                ..draft("Call", "2025-03-03 09:00")
            },
            true
        )
        .is_err());
        assert!(cmd_add(
            TaskDraft {
                case_id: Some("case_9".into()),
                ..draft("Call", "2025-03-03 09:00")
            },
            true
        )
        .is_err());
        assert!(load_tasks().is_empty());
    });
}

#[test]
fn test_recurring_task_lists_occurrences() {
    with_test_db(|_| {
        cmd_add(
            TaskDraft {
                repeat: Some("custom".into()),
                every: Some(2),
                unit: Some("days".into()),
                until: Some("2025-03-09".into()),
                ..draft("Review", "2025-03-03 09:00")
            },
            true,
        )
        .unwrap();

        let rule = load_tasks()[0].repeat_rule.clone().unwrap();
        assert_eq!(rule.kind, RepeatType::Custom);
        assert_eq!(rule.custom_interval, Some(2));

        let (_, _, found) = collect_range(Some("2025-03-03"), Some("2025-03-16")).unwrap();
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["task_1", "task_1_1", "task_1_2", "task_1_3"]);
    });
}

#[test]
fn test_invalid_repeat_options() {
    with_test_db(|_| {
        let custom_without_unit = TaskDraft {
            repeat: Some("custom".into()),
            every: Some(2),
            ..draft("Review", "2025-03-03 09:00")
        };
        assert!(cmd_add(custom_without_unit, true).is_err());

        let every_without_repeat = TaskDraft {
            every: Some(2),
            ..draft("Review", "2025-03-03 09:00")
        };
        assert!(cmd_add(every_without_repeat, true).is_err());

        let unknown = TaskDraft {
            repeat: Some("hourly".into()),
            ..draft("Review", "2025-03-03 09:00")
        };
        assert!(cmd_add(unknown, true).is_err());
    });
}

#[test]
fn test_edit_and_remove() {
    with_test_db(|_| {
        let id = cmd_add(draft("Draft contract", "2025-03-03 09:00"), true).unwrap();
        cmd_edit(
            &id,
            TaskEdit {
                title: Some("Draft lease".into()),
                start: Some("2025-03-04 14:00".into()),
                rate: Some(650.0),
                ..TaskEdit::default()
            },
            true,
        )
        .unwrap();

        let t = &load_tasks()[0];
        assert_eq!(t.title, "Draft lease");
        assert_eq!(t.start_time, at(4, 14, 0));
        assert_eq!(t.end_time, at(4, 15, 0));
        assert_eq!(t.hourly_rate, 650.0);

        cmd_set_status(&id, TaskStatus::Completed, true).unwrap();
        assert_eq!(load_tasks()[0].status, TaskStatus::Completed);

        cmd_remove(&id, true).unwrap();
        assert!(load_tasks().is_empty());
        assert!(cmd_remove(&id, true).is_err());
    });
}

#[test]
fn test_occurrence_ids_are_refused_for_changes() {
    with_test_db(|_| {
        let id = cmd_add(
            TaskDraft {
                repeat: Some("weekly".into()),
                ..draft("Standup", "2025-03-03 09:00")
            },
            true,
        )
        .unwrap();

        let err = cmd_remove("task_1_3", true).unwrap_err();
        assert!(err.to_string().contains(&id));
        let err = cmd_edit("task_1_3", TaskEdit::default(), true).unwrap_err();
        assert!(err.to_string().contains(&id));
        assert_eq!(load_tasks().len(), 1);
    });
}

#[test]
fn test_track_flow_records_entry() {
    with_test_db(|_| {
        cmd_add(
            TaskDraft {
                repeat: Some("daily".into()),
                ..draft("Research", "2025-03-03 09:00")
            },
            true,
        )
        .unwrap();

        cmd_track_start("task_1_1", at(4, 9, 0), true).unwrap();
        assert_eq!(load_session().unwrap().state, TimerState::Running);
        assert_eq!(load_tasks()[0].status, TaskStatus::InProgress);

        cmd_track_pause(at(4, 9, 20), true).unwrap();
        assert_eq!(load_session().unwrap().state, TimerState::Paused);
        cmd_track_resume(at(4, 9, 50), true).unwrap();
        assert!(cmd_track_status(at(4, 9, 55)).is_ok());

        let entry = cmd_track_stop(at(4, 10, 1), true).unwrap();
        assert_eq!(entry.id, "entry_1");
        assert_eq!(entry.task_id, "task_1_1");
        assert_eq!(entry.duration, 31 * 60);
        assert_eq!(entry.cost, 500.0);

        assert!(load_session().is_none());
        assert_eq!(load_time_entries(), vec![entry]);
        assert!(cmd_entries(Some("task_1")).is_ok());
    });
}

#[test]
fn test_one_timer_at_a_time() {
    with_test_db(|_| {
        cmd_add(draft("A", "2025-03-03 09:00"), true).unwrap();
        cmd_add(draft("B", "2025-03-03 11:00"), true).unwrap();

        cmd_track_start("task_1", at(3, 9, 0), true).unwrap();
        assert!(cmd_track_start("task_2", at(3, 9, 5), true).is_err());
        assert_eq!(load_session().unwrap().task_id, "task_1");

        assert!(cmd_track_resume(at(3, 9, 6), true).is_err());
        cmd_track_stop(at(3, 9, 10), true).unwrap();
        assert!(cmd_track_stop(at(3, 9, 11), true).is_err());
        assert!(cmd_track_pause(at(3, 9, 11), true).is_err());
    });
}

#[test]
fn test_config_changes_billing_unit() {
    with_test_db(|db_path| {
        let config = db_path.with_file_name("config.json");
        fs::write(&config, r#"{"billing":{"minimumBillableMinutes":15}}"#).unwrap();
        assert_eq!(cmd_cost(60, 600.0, None).unwrap(), 150.0);
        assert_eq!(cmd_cost(60, 600.0, Some(30)).unwrap(), 300.0);

        fs::write(&config, r#"{"billing":{"minimumBillableMinutes":0}}"#).unwrap();
        assert!(cmd_cost(60, 600.0, None).is_err());
    });
}

#[test]
fn test_cases_and_employees() {
    with_test_db(|_| {
        let emp = cmd_employee_add("Lin".into(), 120.0, Some("Lin@Example.com".into()), true).unwrap();
        assert_eq!(emp, "emp_1");
        assert_eq!(load_employees()[0].email.as_deref(), Some("lin@example.com"));

        let case = cmd_case_add("Acme v. Doe".into(), 8000.0, vec![emp.clone()], true).unwrap();
        assert_eq!(case, "case_1");
        assert!(cmd_case_add("Ghost".into(), 100.0, vec!["emp_9".into()], true).is_err());

        let emp2 = cmd_employee_add("Sam".into(), 90.0, None, true).unwrap();
        cmd_case_assign(&case, &emp2, true).unwrap();
        cmd_case_assign(&case, &emp2, true).unwrap();
        assert_eq!(load_cases()[0].assigned_employees, vec![emp.clone(), emp2.clone()]);

        cmd_add(
            TaskDraft {
                case_id: Some(case.clone()),
                employee_id: Some(emp.clone()),
                ..draft("Filing", "2025-03-03 09:00")
            },
            true,
        )
        .unwrap();

        cmd_employee_remove(&emp, true).unwrap();
        assert_eq!(load_cases()[0].assigned_employees, vec![emp2]);
        assert_eq!(load_tasks()[0].employee_id, None);

        cmd_case_close(&case, true).unwrap();
        cmd_case_remove(&case, true).unwrap();
        assert!(load_cases().is_empty());
        assert_eq!(load_tasks()[0].case_id, None);
        assert!(cmd_stats_cases().is_ok());
    });
}

#[test]
fn test_reset() {
    with_test_db(|db_path| {
        cmd_add(draft("A", "2025-03-03 09:00"), true).unwrap();
        cmd_employee_add("Lin".into(), 120.0, None, true).unwrap();
        assert!(db_path.exists());

        cmd_reset(true).unwrap();
        assert!(!db_path.exists());
        assert!(load_tasks().is_empty());
        assert!(load_employees().is_empty());
    });
}

#[test]
fn test_out_of_range_length_is_an_error() {
    with_test_db(|_| {
        for minutes in [1_000_000_000_000, i64::MAX] {
            let err = cmd_add(
                TaskDraft {
                    minutes: Some(minutes),
                    ..draft("Marathon", "2025-03-03 09:00")
                },
                true,
            )
            .unwrap_err();
            assert!(err.to_string().contains("out of range"));
        }
        assert!(load_tasks().is_empty());
    });
}

#[test]
fn test_tracking_needs_a_real_occurrence() {
    with_test_db(|_| {
        cmd_add(
            TaskDraft {
                repeat: Some("daily".into()),
                until: Some("2025-03-05".into()),
                ..draft("Research", "2025-03-03 09:00")
            },
            true,
        )
        .unwrap();

        for id in ["task_1_500", "task_1_0", "task_1_3"] {
            let err = cmd_track_start(id, at(4, 9, 0), true).unwrap_err();
            assert!(err.to_string().contains("task_1"));
            assert!(load_session().is_none());
        }
        assert_eq!(load_tasks()[0].status, TaskStatus::Pending);

        cmd_track_start("task_1_2", at(5, 9, 0), true).unwrap();
        assert_eq!(load_session().unwrap().task_id, "task_1_2");
    });
}

#[test]
fn test_failed_start_leaves_no_session() {
    with_test_db(|_| {
        cmd_add(draft("Broken", "2025-03-03 09:00"), true).unwrap();
        // A hand-edited file whose task no longer ends after it starts.
        let mut tasks = load_tasks();
        tasks[0].end_time = tasks[0].start_time;
        save_tasks(&tasks).unwrap();

        assert!(cmd_track_start("task_1", at(3, 9, 0), true).is_err());
        assert!(load_session().is_none());
    });
}
