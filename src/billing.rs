use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default billing granularity in minutes.
pub const DEFAULT_MINIMUM_BILLABLE_MINUTES: u32 = 30;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("elapsed time cannot be negative (got {0}s)")]
    NegativeElapsed(i64),

    #[error("hourly rate must be a finite, non-negative number (got {0})")]
    InvalidRate(f64),

    #[error("minimum billable unit must be at least one minute")]
    ZeroBillableUnit,
}

/// Billing rounding policy.
///
/// Every session bills at least one unit, and time beyond that rounds up to
/// the next whole unit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BillingPolicy {
    pub minimum_billable_minutes: u32,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        BillingPolicy {
            minimum_billable_minutes: DEFAULT_MINIMUM_BILLABLE_MINUTES,
        }
    }
}

impl BillingPolicy {
    pub fn new(minimum_billable_minutes: u32) -> Result<Self, BillingError> {
        if minimum_billable_minutes == 0 {
            return Err(BillingError::ZeroBillableUnit);
        }
        Ok(BillingPolicy {
            minimum_billable_minutes,
        })
    }

    /// Length of one billable unit in seconds.
    pub fn unit_seconds(&self) -> Result<i64, BillingError> {
        if self.minimum_billable_minutes == 0 {
            return Err(BillingError::ZeroBillableUnit);
        }
        Ok(i64::from(self.minimum_billable_minutes) * 60)
    }

    /// Seconds actually charged for `elapsed_seconds` of work.
    pub fn billable_seconds(&self, elapsed_seconds: i64) -> Result<i64, BillingError> {
        if elapsed_seconds < 0 {
            return Err(BillingError::NegativeElapsed(elapsed_seconds));
        }
        let unit = self.unit_seconds()?;
        // ceil(elapsed / unit), never below one unit
        let units = (elapsed_seconds / unit + i64::from(elapsed_seconds % unit != 0)).max(1);
        Ok(units.saturating_mul(unit))
    }

    /// Cost of `elapsed_seconds` at `hourly_rate`.
    ///
    /// Integer rounding happens before the single float multiplication, so
    /// the result for a given duration is identical whether it comes from a
    /// live estimate or a stopped entry.
    pub fn cost(&self, elapsed_seconds: i64, hourly_rate: f64) -> Result<f64, BillingError> {
        if !hourly_rate.is_finite() || hourly_rate < 0.0 {
            return Err(BillingError::InvalidRate(hourly_rate));
        }
        let billable = self.billable_seconds(elapsed_seconds)?;
        Ok(billable as f64 / 3600.0 * hourly_rate)
    }
}

/// Cost of `elapsed_seconds` at `hourly_rate` with the given minimum unit.
pub fn cost(
    elapsed_seconds: i64,
    hourly_rate: f64,
    minimum_billable_minutes: u32,
) -> Result<f64, BillingError> {
    BillingPolicy::new(minimum_billable_minutes)?.cost(elapsed_seconds, hourly_rate)
}
