use caseclock::billing::{cost, BillingError, BillingPolicy};

#[test]
fn short_sessions_bill_the_minimum_unit() {
    assert_eq!(cost(1, 500.0, 30), Ok(250.0));
    assert_eq!(cost(1500, 500.0, 30), Ok(250.0));
    assert_eq!(cost(1, 500.0, 30), cost(1500, 500.0, 30));
}

#[test]
fn partial_units_round_up() {
    assert_eq!(cost(1801, 500.0, 30), Ok(500.0));
    assert_eq!(cost(3600, 500.0, 30), Ok(500.0));
    assert_eq!(cost(3601, 500.0, 30), Ok(750.0));
}

#[test]
fn unit_is_adjustable() {
    assert_eq!(cost(1, 600.0, 15), Ok(150.0));
    assert_eq!(cost(16 * 60, 600.0, 15), Ok(300.0));
    assert!((cost(61, 60.0, 1).unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn cost_is_deterministic() {
    let policy = BillingPolicy::default();
    let first = policy.cost(12_345, 333.33).unwrap();
    for _ in 0..100 {
        assert_eq!(policy.cost(12_345, 333.33).unwrap().to_bits(), first.to_bits());
    }
}

#[test]
fn never_below_one_unit() {
    let policy = BillingPolicy::new(30).unwrap();
    for elapsed in [0, 1, 59, 1799, 1800] {
        assert!(policy.cost(elapsed, 120.0).unwrap() >= 60.0);
    }
}

#[test]
fn invalid_arguments_are_rejected() {
    assert_eq!(cost(-60, 500.0, 30), Err(BillingError::NegativeElapsed(-60)));
    assert!(matches!(cost(60, f64::NAN, 30), Err(BillingError::InvalidRate(_))));
    assert_eq!(BillingPolicy::new(0), Err(BillingError::ZeroBillableUnit));
}
