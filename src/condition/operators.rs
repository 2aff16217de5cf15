//! Main operator catalog
//!
//! Maps each operator tag to a pure comparison between the configured value
//! and the current field value. Tags missing from the table never match.

use crate::condition::ast::ConditionValue;
use crate::condition::coerce::{
    condition_text, is_truthy, length, parse_float, parse_float_condition, parse_int_condition,
    to_number, to_text,
};
use ahash::AHashMap;
use once_cell::sync::Lazy;
use serde_json::Value;

/// Comparison between a configured value and a field value
pub type OperatorFn = fn(&ConditionValue, &Value) -> bool;

static OPERATORS: Lazy<AHashMap<&'static str, OperatorFn>> = Lazy::new(|| {
    let mut table: AHashMap<&'static str, OperatorFn> = AHashMap::with_capacity(32);

    table.insert("equals", check_equals);
    table.insert("does_not_equal", |c, f| !check_equals(c, f));
    table.insert("contains", check_contains);
    table.insert("does_not_contain", |c, f| !check_contains(c, f));
    table.insert("starts_with", check_starts_with);
    table.insert("ends_with", check_ends_with);
    table.insert("is_empty", check_is_empty);
    table.insert("is_not_empty", |c, f| !check_is_empty(c, f));

    table.insert("content_length_equals", |c, f| {
        check_length(c, f, |len, n| len == n)
    });
    table.insert("content_length_does_not_equal", |c, f| {
        check_length(c, f, |len, n| len != n)
    });
    table.insert("content_length_greater_than", |c, f| {
        check_length(c, f, |len, n| len > n)
    });
    table.insert("content_length_greater_than_or_equal_to", |c, f| {
        check_length(c, f, |len, n| len >= n)
    });
    table.insert("content_length_less_than", |c, f| {
        check_length(c, f, |len, n| len < n)
    });
    table.insert("content_length_less_than_or_equal_to", |c, f| {
        check_length(c, f, |len, n| len <= n)
    });

    table.insert("greater_than", |c, f| compare_numbers(c, f, |a, b| a > b));
    table.insert("less_than", |c, f| compare_numbers(c, f, |a, b| a < b));
    table.insert("greater_than_or_equal_to", |c, f| {
        compare_numbers(c, f, |a, b| a >= b)
    });
    table.insert("less_than_or_equal_to", |c, f| {
        compare_numbers(c, f, |a, b| a <= b)
    });

    table.insert("list_contains", check_list_contains);

    table
});

/// Look up an operator by tag
#[inline]
pub fn lookup(operator: &str) -> Option<OperatorFn> {
    OPERATORS.get(operator).copied()
}

/// All registered operator tags, sorted
pub fn operator_tags() -> Vec<&'static str> {
    let mut tags: Vec<_> = OPERATORS.keys().copied().collect();
    tags.sort_unstable();
    tags
}

// ============================================================================
// Comparisons
// ============================================================================

/// Loose equality: numeric when either side is a number, textual otherwise
pub fn check_equals(condition: &ConditionValue, field: &Value) -> bool {
    match (condition, field) {
        (ConditionValue::Null, Value::Null) => true,
        (ConditionValue::Null, _) | (_, Value::Null) => false,
        (ConditionValue::Number(c), f) => to_number(f).map(|n| n == *c).unwrap_or(false),
        (ConditionValue::Text(c), Value::Number(_)) | (ConditionValue::Text(c), Value::Bool(_)) => {
            match (to_number(&Value::String(c.clone())), to_number(field)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (c, f) => match (condition_text(c), to_text(f)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

/// Substring test on text values, membership test on arrays
pub fn check_contains(condition: &ConditionValue, field: &Value) -> bool {
    if !is_truthy(field) {
        return false;
    }
    match condition_text(condition) {
        Some(needle) => contains_text(field, &needle),
        None => false,
    }
}

fn contains_text(field: &Value, needle: &str) -> bool {
    match field {
        Value::Array(items) => items
            .iter()
            .any(|item| to_text(item).as_deref() == Some(needle)),
        other => to_text(other).map(|s| s.contains(needle)).unwrap_or(false),
    }
}

pub fn check_starts_with(condition: &ConditionValue, field: &Value) -> bool {
    affix_match(condition, field, |s, p| s.starts_with(p))
}

pub fn check_ends_with(condition: &ConditionValue, field: &Value) -> bool {
    affix_match(condition, field, |s, p| s.ends_with(p))
}

fn affix_match<F>(condition: &ConditionValue, field: &Value, matches: F) -> bool
where
    F: Fn(&str, &str) -> bool,
{
    if !is_truthy(field) || field.is_array() {
        return false;
    }
    match (to_text(field), condition_text(condition)) {
        (Some(s), Some(p)) => matches(&s, &p),
        _ => false,
    }
}

/// Empty field, or a configured numeric zero which forces "empty"
pub fn check_is_empty(condition: &ConditionValue, field: &Value) -> bool {
    !is_truthy(field) || matches!(condition, ConditionValue::Number(n) if *n == 0.0)
}

fn check_length<F>(condition: &ConditionValue, field: &Value, cmp: F) -> bool
where
    F: Fn(i64, i64) -> bool,
{
    let len = match length(field) {
        Some(len) if len > 0 => len as i64,
        _ => return false,
    };
    match parse_int_condition(condition) {
        Some(n) => cmp(len, n),
        None => false,
    }
}

fn compare_numbers<F>(condition: &ConditionValue, field: &Value, cmp: F) -> bool
where
    F: Fn(f64, f64) -> bool,
{
    if is_blank_operand(field) {
        return false;
    }
    match (parse_float(field), parse_float_condition(condition)) {
        (Some(f), Some(c)) => cmp(f, c),
        _ => false,
    }
}

#[inline]
fn is_blank_operand(field: &Value) -> bool {
    match field {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Every configured element (or the single configured value) is in the field
pub fn check_list_contains(condition: &ConditionValue, field: &Value) -> bool {
    if !is_truthy(field) {
        return false;
    }
    match condition {
        ConditionValue::List(items) => items.iter().all(|item| contains_text(field, item)),
        other => condition_text(other)
            .map(|needle| contains_text(field, &needle))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(op: &str, condition: impl Into<ConditionValue>, field: Value) -> bool {
        let f = lookup(op).unwrap_or_else(|| panic!("operator {op} not registered"));
        f(&condition.into(), &field)
    }

    #[test]
    fn test_equals_loose() {
        assert!(run("equals", "abc", json!("abc")));
        assert!(!run("equals", "abc", json!("abd")));
        assert!(run("equals", "5", json!(5)));
        assert!(run("equals", 5i64, json!("5")));
        assert!(run("equals", "1", json!(true)));
        assert!(run("equals", ConditionValue::Null, json!(null)));
        assert!(!run("equals", "", json!(null)));
        assert!(run("equals", vec!["a", "b"], json!(["a", "b"])));
    }

    #[test]
    fn test_does_not_equal() {
        assert!(run("does_not_equal", "abc", json!("x")));
        assert!(!run("does_not_equal", "abc", json!("abc")));
        assert!(run("does_not_equal", "abc", json!(null)));
    }

    #[test]
    fn test_contains() {
        assert!(run("contains", "ell", json!("hello")));
        assert!(!run("contains", "xyz", json!("hello")));
        assert!(!run("contains", "a", json!(null)));
        assert!(run("contains", "red", json!(["red", "blue"])));
        assert!(!run("contains", "re", json!(["red", "blue"])));
        assert!(run("does_not_contain", "xyz", json!("hello")));
        assert!(run("does_not_contain", "a", json!(null)));
    }

    #[test]
    fn test_starts_and_ends_with() {
        assert!(run("starts_with", "he", json!("hello")));
        assert!(!run("starts_with", "lo", json!("hello")));
        assert!(run("ends_with", "lo", json!("hello")));
        assert!(!run("ends_with", "he", json!("hello")));
        assert!(!run("starts_with", "", json!(null)));
        assert!(!run("ends_with", "", json!("")));
        assert!(run("starts_with", "12", json!(123)));
    }

    #[test]
    fn test_is_empty() {
        assert!(run("is_empty", ConditionValue::Null, json!("")));
        assert!(run("is_empty", ConditionValue::Null, json!(null)));
        assert!(run("is_empty", ConditionValue::Null, json!([])));
        assert!(run("is_empty", ConditionValue::Null, json!(0)));
        assert!(!run("is_empty", ConditionValue::Null, json!("x")));
        // A configured numeric zero forces "empty"
        assert!(run("is_empty", 0i64, json!("x")));
        assert!(!run("is_empty", "0", json!("x")));
        assert!(run("is_not_empty", ConditionValue::Null, json!("x")));
        assert!(!run("is_not_empty", 0i64, json!("x")));
    }

    #[test]
    fn test_content_length() {
        assert!(!run("content_length_greater_than", "3", json!("ab")));
        assert!(run("content_length_greater_than", "3", json!("abcd")));
        assert!(run("content_length_equals", "2", json!(["a", "b"])));
        assert!(run("content_length_does_not_equal", "2", json!("abc")));
        assert!(run("content_length_greater_than_or_equal_to", "3", json!("abc")));
        assert!(run("content_length_less_than", "3", json!("ab")));
        assert!(run("content_length_less_than_or_equal_to", "2", json!("ab")));
        // Empty or absent values never satisfy a length test
        assert!(!run("content_length_less_than", "3", json!("")));
        assert!(!run("content_length_does_not_equal", "3", json!(null)));
        // Unparseable threshold
        assert!(!run("content_length_does_not_equal", "many", json!("abc")));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(run("greater_than", "5", json!("10")));
        assert!(!run("greater_than", "5", json!("3")));
        assert!(run("less_than", "5", json!(3)));
        assert!(run("greater_than_or_equal_to", "5", json!("5")));
        assert!(run("less_than_or_equal_to", "5.5", json!("5.5")));
        assert!(run("greater_than", "-1", json!(0)));
        assert!(!run("greater_than", "5", json!(null)));
        assert!(!run("greater_than", "5", json!("")));
        assert!(!run("greater_than", ConditionValue::Null, json!("10")));
        assert!(!run("greater_than", "five", json!("10")));
        assert!(run("greater_than", "5", json!("10 items")));
    }

    #[test]
    fn test_list_contains() {
        assert!(run("list_contains", vec!["a", "b"], json!(["a", "b", "c"])));
        assert!(!run("list_contains", vec!["a", "d"], json!(["a", "b", "c"])));
        assert!(run("list_contains", "b", json!(["a", "b"])));
        assert!(run("list_contains", "ell", json!("hello")));
        assert!(!run("list_contains", "a", json!(null)));
        assert!(run("list_contains", Vec::<&str>::new(), json!(["a"])));
    }

    #[test]
    fn test_unknown_operator_not_registered() {
        assert!(lookup("matches_regex").is_none());
        assert!(lookup("").is_none());
        assert_eq!(operator_tags().len(), 19);
    }
}
