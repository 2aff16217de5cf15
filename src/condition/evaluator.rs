//! Condition evaluator

use crate::condition::ast::{Combinator, Condition, ConditionKind, ConditionSet};
use crate::condition::{date, operators};
use crate::error::Result;
use crate::form::FormData;
use chrono::{NaiveDateTime, Utc};
use serde_json::Value;

/// Decide whether `conditions` hold for the current form data
///
/// Absent conditions are never satisfied. `now` anchors the date-relative
/// operators and is read as UTC, the frame every offset-bearing field value
/// is normalized to. When omitted the UTC clock is read once, here.
///
/// # Errors
/// `InvalidGrammar` if a group node carries a combinator other than `and`/`or`.
pub fn evaluate(
    conditions: Option<&ConditionSet>,
    form_data: &FormData,
    now: Option<NaiveDateTime>,
) -> Result<bool> {
    let Some(conditions) = conditions else {
        return Ok(false);
    };
    let now = now.unwrap_or_else(|| Utc::now().naive_utc());
    check(conditions, form_data, now)
}

/// Evaluate a condition set against a fixed reference instant
pub fn check(conditions: &ConditionSet, form_data: &FormData, now: NaiveDateTime) -> Result<bool> {
    match conditions {
        ConditionSet::Flat(list) => Ok(list
            .iter()
            .all(|cond| dispatch(cond, form_data.get(&cond.field), now))),
        ConditionSet::Leaf(cond) => Ok(cond
            .as_ref()
            .map(|cond| dispatch(cond, form_data.get(&cond.field), now))
            .unwrap_or(false)),
        ConditionSet::Group {
            combinator,
            children,
        } => match combinator.parse::<Combinator>()? {
            // Every child is visited so a bad tag anywhere in the tree is reported
            Combinator::And => {
                let mut satisfied = true;
                for child in children {
                    satisfied &= check(child, form_data, now)?;
                }
                Ok(satisfied)
            }
            Combinator::Or => {
                let mut satisfied = false;
                for child in children {
                    satisfied |= check(child, form_data, now)?;
                }
                Ok(satisfied)
            }
        },
    }
}

#[inline]
fn dispatch(condition: &Condition, field_value: &Value, now: NaiveDateTime) -> bool {
    match condition.kind {
        ConditionKind::Value => evaluate_condition(Some(condition), field_value),
        ConditionKind::Date => evaluate_date_condition(Some(condition), field_value, now),
    }
}

/// Evaluate one condition with the main operator catalog
pub fn evaluate_condition(condition: Option<&Condition>, field_value: &Value) -> bool {
    let Some(condition) = condition else {
        return false;
    };
    match operators::lookup(&condition.operator) {
        Some(op) => op(&condition.value, field_value),
        None => false,
    }
}

/// Evaluate one condition with the date-relative operator catalog
pub fn evaluate_date_condition(
    condition: Option<&Condition>,
    field_value: &Value,
    now: NaiveDateTime,
) -> bool {
    let Some(condition) = condition else {
        return false;
    };
    match date::lookup(&condition.operator) {
        Some(op) => op(&condition.value, field_value, now),
        None => false,
    }
}
