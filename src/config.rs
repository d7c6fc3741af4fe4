use std::fs;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::billing::BillingPolicy;
use crate::recurrence::{ExpansionLimits, RecurrenceExpander};
use crate::storage::config_path;

/// User-adjustable policy, read from `config.json` next to the task database.
/// Every field is optional in the file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub billing: BillingPolicy,
    pub recurrence: ExpansionLimits,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            billing: BillingPolicy::default(),
            recurrence: ExpansionLimits::default(),
            currency_symbol: "¥".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.billing.minimum_billable_minutes == 0 {
            bail!("billing.minimumBillableMinutes must be at least 1");
        }
        if self.recurrence.max_instances == 0 {
            bail!("recurrence.maxInstances must be at least 1");
        }
        Ok(())
    }

    pub fn expander(&self) -> RecurrenceExpander {
        RecurrenceExpander::new(self.recurrence)
    }
}

/// Loads the configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = serde_json::from_str(&s)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}
