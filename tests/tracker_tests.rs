use caseclock::billing::BillingPolicy;
use caseclock::models::{Task, TaskStatus};
use caseclock::tracker::{TimerState, TrackerError, TrackingSession};
use chrono::{NaiveDate, NaiveDateTime};

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 3)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn task() -> Task {
    Task {
        id: "task_4_2".into(),
        title: "Hearing prep".into(),
        description: None,
        start_time: at(9, 0, 0),
        end_time: at(10, 0, 0),
        hourly_rate: 500.0,
        status: TaskStatus::Pending,
        case_id: None,
        employee_id: None,
        color: None,
        repeat_rule: None,
        parent_task_id: Some("task_4".into()),
        created_at: at(8, 0, 0),
        updated_at: at(8, 0, 0),
    }
}

#[test]
fn full_cycle_excludes_paused_time() {
    let policy = BillingPolicy::default();
    let mut s = TrackingSession::new(&task());
    assert_eq!(s.state, TimerState::Idle);

    s.start(at(9, 0, 0)).unwrap();
    s.pause(at(9, 20, 0)).unwrap();
    s.resume(at(9, 50, 0)).unwrap();
    assert_eq!(s.state, TimerState::Running);
    assert_eq!(s.elapsed_seconds(at(9, 55, 0)), 25 * 60);

    let entry = s.stop(at(10, 0, 0), &policy, "entry_1".into()).unwrap();
    assert_eq!(s.state, TimerState::Stopped);
    assert_eq!(entry.id, "entry_1");
    assert_eq!(entry.task_id, "task_4_2");
    assert_eq!(entry.start_time, at(9, 0, 0));
    assert_eq!(entry.end_time, Some(at(10, 0, 0)));
    assert_eq!(entry.duration, 30 * 60);
    assert_eq!(entry.cost, 250.0);
    assert!(!entry.is_active);
}

#[test]
fn estimate_matches_recorded_cost() {
    let policy = BillingPolicy::new(15).unwrap();
    let mut s = TrackingSession::new(&task());
    s.start(at(9, 0, 0)).unwrap();

    let stop_at = at(9, 47, 13);
    let estimate = s.estimate(stop_at, &policy).unwrap();
    let entry = s.stop(stop_at, &policy, "entry_1".into()).unwrap();
    assert_eq!(estimate.to_bits(), entry.cost.to_bits());
}

#[test]
fn stopping_while_paused_uses_pause_instant() {
    let mut s = TrackingSession::new(&task());
    s.start(at(9, 0, 0)).unwrap();
    s.pause(at(9, 40, 0)).unwrap();

    let entry = s.stop(at(11, 0, 0), &BillingPolicy::default(), "entry_1".into()).unwrap();
    assert_eq!(entry.duration, 40 * 60);
    assert_eq!(entry.cost, 500.0);
    assert_eq!(s.paused_at, None);
}

#[test]
fn multiple_pauses_accumulate() {
    let mut s = TrackingSession::new(&task());
    s.start(at(9, 0, 0)).unwrap();
    s.pause(at(9, 10, 0)).unwrap();
    s.resume(at(9, 15, 0)).unwrap();
    s.pause(at(9, 30, 0)).unwrap();
    s.resume(at(9, 45, 0)).unwrap();
    assert_eq!(s.paused_seconds, 20 * 60);
    assert_eq!(s.elapsed_seconds(at(10, 0, 0)), 40 * 60);
}

#[test]
fn stopped_is_terminal() {
    let policy = BillingPolicy::default();
    let mut s = TrackingSession::new(&task());
    s.start(at(9, 0, 0)).unwrap();
    s.stop(at(9, 5, 0), &policy, "entry_1".into()).unwrap();

    for result in [
        s.start(at(9, 6, 0)),
        s.pause(at(9, 6, 0)),
        s.resume(at(9, 6, 0)),
    ] {
        assert!(matches!(
            result,
            Err(TrackerError::InvalidTransition { from: TimerState::Stopped, .. })
        ));
    }
    assert!(s.stop(at(9, 7, 0), &policy, "entry_2".into()).is_err());
}

#[test]
fn idle_timer_cannot_pause_or_stop() {
    let mut s = TrackingSession::new(&task());
    assert!(s.pause(at(9, 0, 0)).is_err());
    assert!(s.resume(at(9, 0, 0)).is_err());
    assert!(s.stop(at(9, 0, 0), &BillingPolicy::default(), "entry_1".into()).is_err());
    assert_eq!(s.state, TimerState::Idle);
}

#[test]
fn clock_set_back_still_stops() {
    let mut s = TrackingSession::new(&task());
    s.start(at(9, 0, 0)).unwrap();
    assert_eq!(s.elapsed_seconds(at(8, 0, 0)), 0);

    let entry = s.stop(at(8, 0, 0), &BillingPolicy::default(), "entry_1".into()).unwrap();
    assert_eq!(s.state, TimerState::Stopped);
    assert_eq!(entry.duration, 0);
    assert_eq!(entry.cost, 250.0);
}

#[test]
fn clock_set_back_during_pause_adds_no_time() {
    let mut s = TrackingSession::new(&task());
    s.start(at(9, 0, 0)).unwrap();
    s.pause(at(9, 30, 0)).unwrap();
    s.resume(at(9, 10, 0)).unwrap();
    assert_eq!(s.paused_seconds, 0);
    assert_eq!(s.elapsed_seconds(at(9, 40, 0)), 40 * 60);
}

#[test]
fn billing_failure_keeps_session_running() {
    let mut t = task();
    t.hourly_rate = f64::NAN;
    let mut s = TrackingSession::new(&t);
    s.start(at(9, 0, 0)).unwrap();
    let err = s.stop(at(10, 0, 0), &BillingPolicy::default(), "entry_1".into());
    assert!(matches!(err, Err(TrackerError::Billing(_))));
    assert_eq!(s.state, TimerState::Running);
}
