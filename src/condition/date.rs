//! Date-relative operator catalog
//!
//! Every operator receives the reference instant explicitly, in UTC.
//! Date-only values ("2024-01-10") compare at day granularity against
//! anything, including the bounds of the relative windows.

use crate::condition::ast::ConditionValue;
use ahash::AHashMap;
use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::cmp::Ordering;

/// Comparison between a configured value and a field value at instant `now`
pub type DateOperatorFn = fn(&ConditionValue, &Value, NaiveDateTime) -> bool;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

static DATE_OPERATORS: Lazy<AHashMap<&'static str, DateOperatorFn>> = Lazy::new(|| {
    let mut table: AHashMap<&'static str, DateOperatorFn> = AHashMap::with_capacity(16);

    table.insert("equals", |c, f, _| compare_to(c, f, Ordering::is_eq));
    table.insert("before", |c, f, _| compare_to(c, f, Ordering::is_lt));
    table.insert("after", |c, f, _| compare_to(c, f, Ordering::is_gt));
    table.insert("on_or_before", |c, f, _| compare_to(c, f, Ordering::is_le));
    table.insert("on_or_after", |c, f, _| compare_to(c, f, Ordering::is_ge));

    table.insert("past_week", |_, f, now| within(f, now, Period::Week, false));
    table.insert("past_month", |_, f, now| within(f, now, Period::Month, false));
    table.insert("past_year", |_, f, now| within(f, now, Period::Year, false));
    table.insert("next_week", |_, f, now| within(f, now, Period::Week, true));
    table.insert("next_month", |_, f, now| within(f, now, Period::Month, true));
    table.insert("next_year", |_, f, now| within(f, now, Period::Year, true));

    table
});

/// Look up a date operator by tag
#[inline]
pub fn lookup(operator: &str) -> Option<DateOperatorFn> {
    DATE_OPERATORS.get(operator).copied()
}

/// A parsed date value; `has_time` is false for date-only inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateValue {
    pub at: NaiveDateTime,
    pub has_time: bool,
}

impl DateValue {
    /// Order two values, dropping the time of day when either side has none
    pub fn cmp_loose(&self, other: &DateValue) -> Ordering {
        if self.has_time && other.has_time {
            self.at.cmp(&other.at)
        } else {
            self.at.date().cmp(&other.at.date())
        }
    }
}

/// Parse a date from text: ISO date, ISO date-time, or RFC 3339 (as UTC)
pub fn parse_date_text(text: &str) -> Option<DateValue> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|at| DateValue {
            at,
            has_time: false,
        });
    }
    for format in DATETIME_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(text, format) {
            return Some(DateValue { at, has_time: true });
        }
    }
    DateTime::parse_from_rfc3339(text).ok().map(|dt| DateValue {
        at: dt.naive_utc(),
        has_time: true,
    })
}

/// Epoch milliseconds, as produced by date pickers that store timestamps
fn from_millis(ms: i64) -> Option<DateValue> {
    DateTime::from_timestamp_millis(ms).map(|dt| DateValue {
        at: dt.naive_utc(),
        has_time: true,
    })
}

/// Parse a field value as a date
pub fn parse_date(value: &Value) -> Option<DateValue> {
    match value {
        Value::String(s) => parse_date_text(s),
        Value::Number(n) => n.as_i64().and_then(from_millis),
        _ => None,
    }
}

/// Parse a configured comparison value as a date
pub fn parse_condition_date(value: &ConditionValue) -> Option<DateValue> {
    match value {
        ConditionValue::Text(s) => parse_date_text(s),
        ConditionValue::Number(n) if n.is_finite() => from_millis(*n as i64),
        _ => None,
    }
}

fn compare_to<F>(condition: &ConditionValue, field: &Value, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    match (parse_date(field), parse_condition_date(condition)) {
        (Some(f), Some(c)) => accept(f.cmp_loose(&c)),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy)]
enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    fn shift(self, now: NaiveDateTime, forward: bool) -> Option<NaiveDateTime> {
        match (self, forward) {
            (Period::Week, true) => now.checked_add_signed(Duration::days(7)),
            (Period::Week, false) => now.checked_sub_signed(Duration::days(7)),
            (Period::Month, true) => now.checked_add_months(Months::new(1)),
            (Period::Month, false) => now.checked_sub_months(Months::new(1)),
            (Period::Year, true) => now.checked_add_months(Months::new(12)),
            (Period::Year, false) => now.checked_sub_months(Months::new(12)),
        }
    }
}

/// Field lies in `[now - period, now]` or, looking forward, `[now, now + period]`
///
/// A date-only field is tested against the calendar days of both bounds, so
/// the answer does not depend on the time of day `now` falls at.
fn within(field: &Value, now: NaiveDateTime, period: Period, forward: bool) -> bool {
    let Some(date) = parse_date(field) else {
        return false;
    };
    let Some(bound) = period.shift(now, forward) else {
        return false;
    };
    let (start, end) = if forward { (now, bound) } else { (bound, now) };
    if date.has_time {
        start <= date.at && date.at <= end
    } else {
        let day = date.at.date();
        start.date() <= day && day <= end.date()
    }
}
