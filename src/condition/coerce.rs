//! Loose coercions between configured comparison values and form values
//!
//! Form data arrives from an untyped editor: numbers may be typed as text,
//! multi-selects hold arrays, and unset inputs are null. Every operator goes
//! through these helpers instead of matching on JSON types itself.

use crate::condition::ast::ConditionValue;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Leading decimal literal, as accepted by a lenient float parse ("10px" -> 10)
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("float prefix pattern compiles")
});

/// Leading integer literal ("12 chars" -> 12)
static INT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d+)").expect("int prefix pattern compiles")
});

/// Truthiness of a form value: null, "", 0, NaN, false and [] are falsy
#[inline]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Render a number without a trailing ".0" for integral values
#[inline]
pub fn format_number(n: f64) -> String {
    n.to_string()
}

/// Text rendering of a form value; `None` for null and objects
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(format_number),
        },
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| to_text(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

/// Text rendering of a configured comparison value; `None` for null
pub fn condition_text(value: &ConditionValue) -> Option<String> {
    match value {
        ConditionValue::Null => None,
        ConditionValue::Text(s) => Some(s.clone()),
        ConditionValue::Number(n) => Some(format_number(*n)),
        ConditionValue::List(items) => Some(items.join(",")),
    }
}

/// Strict numeric conversion used by loose equality ("" -> 0, "5x" -> none)
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => text_to_number(s),
        Value::Array(_) => to_text(value).and_then(|s| text_to_number(&s)),
    }
}

fn text_to_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Lenient float parse of a form value, reading only the leading literal
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        other => to_text(other).and_then(|s| parse_float_text(&s)),
    }
}

/// Lenient float parse of a configured comparison value
pub fn parse_float_condition(value: &ConditionValue) -> Option<f64> {
    match value {
        ConditionValue::Number(n) => Some(*n),
        other => condition_text(other).and_then(|s| parse_float_text(&s)),
    }
}

pub fn parse_float_text(text: &str) -> Option<f64> {
    FLOAT_PREFIX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Lenient integer parse of a configured comparison value
pub fn parse_int_condition(value: &ConditionValue) -> Option<i64> {
    match value {
        ConditionValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
        ConditionValue::Number(_) => None,
        other => condition_text(other).and_then(|s| parse_int_text(&s)),
    }
}

pub fn parse_int_text(text: &str) -> Option<i64> {
    INT_PREFIX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Length of a string (in characters) or an array; other values have none
#[inline]
pub fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}
