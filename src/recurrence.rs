use chrono::{Local, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{EndType, RepeatRule, RepeatType, RepeatUnit, Task};

/// Largest number of occurrences (template included) a single expansion returns.
pub const DEFAULT_MAX_INSTANCES: usize = 1000;

/// Horizon used when neither the rule nor the caller bounds the expansion.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// Bounds applied to every expansion.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpansionLimits {
    pub max_instances: usize,
    pub default_horizon_months: u32,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        ExpansionLimits {
            max_instances: DEFAULT_MAX_INSTANCES,
            default_horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }
}

/// Distance between two consecutive occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(i64),
    Months(u32),
}

impl Step {
    /// Step for a rule, or `None` when the rule cannot produce occurrences.
    fn for_rule(rule: &RepeatRule) -> Option<Step> {
        let step = match &rule.kind {
            RepeatType::Never => return None,
            RepeatType::Daily => Step::Days(1),
            RepeatType::Weekly => Step::Days(7),
            RepeatType::Biweekly => Step::Days(14),
            RepeatType::Monthly => Step::Months(1),
            RepeatType::Yearly => Step::Months(12),
            RepeatType::Custom => {
                let n = rule.custom_interval.filter(|n| (1..=999).contains(n))?;
                match rule.custom_unit.as_ref()? {
                    RepeatUnit::Day => Step::Days(i64::from(n)),
                    RepeatUnit::Week => Step::Days(7 * i64::from(n)),
                    RepeatUnit::Month => Step::Months(n),
                    RepeatUnit::Year => Step::Months(12 * n),
                    RepeatUnit::Unknown(_) => return None,
                }
            }
            RepeatType::Unknown(_) => return None,
        };
        Some(step)
    }

    /// The `n`th occurrence counted from `anchor`.
    ///
    /// Month steps are always measured from the anchor and clamp to the last
    /// day of a shorter month, so a Jan 31 series visits Feb 28, Mar 31,
    /// Apr 30 instead of drifting to the 28th.
    fn nth(self, anchor: NaiveDateTime, n: u32) -> Option<NaiveDateTime> {
        match self {
            Step::Days(d) => anchor.checked_add_signed(TimeDelta::try_days(d.checked_mul(i64::from(n))?)?),
            Step::Months(m) => anchor.checked_add_months(Months::new(m.checked_mul(n)?)),
        }
    }
}

/// Last representable instant of `date` (23:59:59.999).
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    let time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default();
    date.and_time(time)
}

/// Turns template tasks and their repeat rules into dated occurrences.
///
/// Expansion is a pure function of the template, the window and `now`; it
/// never touches storage and never fails. A rule it cannot interpret yields
/// the occurrences produced so far, which is at least the template itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecurrenceExpander {
    limits: ExpansionLimits,
}

impl RecurrenceExpander {
    pub fn new(limits: ExpansionLimits) -> Self {
        RecurrenceExpander { limits }
    }

    pub fn limits(&self) -> ExpansionLimits {
        self.limits
    }

    /// Expands `template` up to `window_end`, using the local clock for the
    /// default horizon.
    pub fn expand(&self, template: &Task, window_end: Option<NaiveDateTime>) -> Vec<Task> {
        self.expand_at(template, window_end, Local::now().naive_local())
    }

    /// Expands `template` with an explicit `now`.
    ///
    /// The first element is always the template, unchanged. Occurrence `n`
    /// gets id `{template.id}_{n}` and `parent_task_id = template.id`.
    pub fn expand_at(
        &self,
        template: &Task,
        window_end: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Vec<Task> {
        let mut instances = vec![template.clone()];
        let Some(rule) = template.repeat_rule.as_ref() else {
            return instances;
        };
        if rule.kind == RepeatType::Never {
            return instances;
        }

        let Some(step) = Step::for_rule(rule) else {
            warn!(task = %template.id, rule = %rule.describe(), "Unusable repeat rule, not expanding");
            return instances;
        };
        let Some(limit) = self.effective_window_end(template, rule, window_end, now) else {
            return instances;
        };

        let mut n: u32 = 1;
        while instances.len() < self.limits.max_instances {
            let Some(instance) = occurrence(template, step, n) else {
                break;
            };
            if instance.start_time > limit {
                break;
            }
            instances.push(instance);
            n += 1;
        }

        debug!(
            task = %template.id,
            count = instances.len(),
            until = %limit,
            "Expanded recurring task"
        );
        instances
    }

    /// Expands every template up to `range_end` and keeps the occurrences
    /// whose `[start, end]` overlaps `[range_start, range_end]`, ordered by
    /// start time.
    pub fn instances_in_range(
        &self,
        templates: &[Task],
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Vec<Task> {
        let mut found: Vec<Task> = templates
            .iter()
            .flat_map(|t| self.expand_at(t, Some(range_end), range_end))
            .filter(|i| i.overlaps(range_start, range_end))
            .collect();
        found.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        found
    }

    /// Looks up `id` as either a stored template or one of its occurrences.
    ///
    /// An occurrence id resolves only if expansion can produce it: the
    /// sequence number is within the instance cap and, for a rule with an end
    /// date, the occurrence starts on or before that date.
    pub fn find_occurrence(&self, templates: &[Task], id: &str) -> Option<Task> {
        let template = template_for(templates, id)?;
        if template.id == id {
            return Some(template.clone());
        }
        let (_, seq) = id.rsplit_once('_')?;
        let n: u32 = seq.parse().ok()?;
        if n == 0 || n as usize >= self.limits.max_instances {
            return None;
        }
        let rule = template.repeat_rule.as_ref()?;
        let step = Step::for_rule(rule)?;
        let instance = occurrence(template, step, n)?;
        if instance.id != id {
            return None;
        }
        if rule.end_type == EndType::Date {
            let end = end_of_day(rule.end_date?);
            if instance.start_time > end {
                return None;
            }
        }
        Some(instance)
    }

    /// The rule's own end date wins over the caller's window, which wins
    /// over the default horizon. `None` for a date-bounded rule without a
    /// date.
    fn effective_window_end(
        &self,
        template: &Task,
        rule: &RepeatRule,
        window_end: Option<NaiveDateTime>,
        now: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        if rule.end_type == EndType::Date {
            return match rule.end_date {
                Some(date) => Some(end_of_day(date)),
                None => {
                    warn!(task = %template.id, "Repeat rule ends on a date but has none");
                    None
                }
            };
        }
        if let Some(end) = window_end {
            return Some(end);
        }
        Some(
            now.checked_add_months(Months::new(self.limits.default_horizon_months))
                .unwrap_or(NaiveDateTime::MAX),
        )
    }
}

/// Occurrence `n` of `template`, or `None` when it falls outside the
/// calendar range.
fn occurrence(template: &Task, step: Step, n: u32) -> Option<Task> {
    let start = step.nth(template.start_time, n)?;
    let end = start.checked_add_signed(template.duration())?;
    Some(Task {
        id: format!("{}_{}", template.id, n),
        start_time: start,
        end_time: end,
        parent_task_id: Some(template.id.clone()),
        ..template.clone()
    })
}

/// Expands with the default limits.
pub fn expand(template: &Task, window_end: Option<NaiveDateTime>) -> Vec<Task> {
    RecurrenceExpander::default().expand(template, window_end)
}

/// Range query with the default limits.
pub fn instances_in_range(
    templates: &[Task],
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
) -> Vec<Task> {
    RecurrenceExpander::default().instances_in_range(templates, range_start, range_end)
}

/// Resolves a task or occurrence id to its template.
///
/// Exact ids win; otherwise an id of the form `{template}_{n}` resolves to
/// `{template}`.
pub fn template_for<'a>(templates: &'a [Task], id: &str) -> Option<&'a Task> {
    if let Some(t) = templates.iter().find(|t| t.id == id) {
        return Some(t);
    }
    let (parent, seq) = id.rsplit_once('_')?;
    if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    templates.iter().find(|t| t.id == parent)
}

/// Occurrence lookup with the default limits.
pub fn find_occurrence(templates: &[Task], id: &str) -> Option<Task> {
    RecurrenceExpander::default().find_occurrence(templates, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn task(rule: Option<RepeatRule>) -> Task {
        Task {
            id: "task_1".into(),
            title: "Client call".into(),
            description: None,
            start_time: at(2025, 1, 31, 9, 0),
            end_time: at(2025, 1, 31, 10, 0),
            hourly_rate: 500.0,
            status: TaskStatus::Pending,
            case_id: None,
            employee_id: None,
            color: None,
            repeat_rule: rule,
            parent_task_id: None,
            created_at: at(2025, 1, 1, 0, 0),
            updated_at: at(2025, 1, 1, 0, 0),
        }
    }

    #[test]
    fn month_steps_are_anchored_and_clamped() {
        let step = Step::Months(1);
        let anchor = at(2025, 1, 31, 9, 0);
        assert_eq!(step.nth(anchor, 1), Some(at(2025, 2, 28, 9, 0)));
        assert_eq!(step.nth(anchor, 2), Some(at(2025, 3, 31, 9, 0)));
        assert_eq!(step.nth(anchor, 3), Some(at(2025, 4, 30, 9, 0)));
    }

    #[test]
    fn leap_day_yearly_lands_on_feb_28() {
        let anchor = at(2024, 2, 29, 8, 0);
        assert_eq!(Step::Months(12).nth(anchor, 1), Some(at(2025, 2, 28, 8, 0)));
        assert_eq!(Step::Months(12).nth(anchor, 4), Some(at(2028, 2, 29, 8, 0)));
    }

    #[test]
    fn missing_end_date_returns_template_only() {
        let mut rule = RepeatRule::new(RepeatType::Daily);
        rule.end_type = EndType::Date;
        let t = task(Some(rule));
        let out = RecurrenceExpander::default().expand_at(&t, Some(at(2025, 3, 1, 0, 0)), at(2025, 1, 1, 0, 0));
        assert_eq!(out, vec![t]);
    }

    #[test]
    fn default_horizon_is_relative_to_now() {
        let t = task(Some(RepeatRule::new(RepeatType::Monthly)));
        let limits = ExpansionLimits { max_instances: 1000, default_horizon_months: 3 };
        let out = RecurrenceExpander::new(limits).expand_at(&t, None, at(2025, 1, 31, 9, 0));
        let starts: Vec<_> = out.iter().map(|i| i.start_time).collect();
        assert_eq!(
            starts,
            vec![
                at(2025, 1, 31, 9, 0),
                at(2025, 2, 28, 9, 0),
                at(2025, 3, 31, 9, 0),
                at(2025, 4, 30, 9, 0),
            ]
        );
    }

    #[test]
    fn resolves_occurrence_ids_to_templates() {
        let t = task(Some(RepeatRule::new(RepeatType::Weekly)));
        let templates = vec![t];
        assert_eq!(template_for(&templates, "task_1").map(|t| t.id.as_str()), Some("task_1"));
        assert_eq!(template_for(&templates, "task_1_7").map(|t| t.id.as_str()), Some("task_1"));
        assert!(template_for(&templates, "task_1_x").is_none());
        assert!(template_for(&templates, "task_2").is_none());

        let occ = find_occurrence(&templates, "task_1_2").unwrap();
        assert_eq!(occ.start_time, at(2025, 2, 14, 9, 0));
        assert_eq!(occ.parent_task_id.as_deref(), Some("task_1"));
    }
}
