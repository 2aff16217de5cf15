//! Parsed-conditions cache keyed by the schema's JSON text

use crate::condition::ast::ConditionSet;
use crate::condition::parser;
use crate::error::Result;
use crate::form::FormData;
use ahash::AHashMap;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

type Parsed = Arc<Option<ConditionSet>>;

/// Entries kept before the cache is flushed; schemas are authored text of
/// arbitrary variety, so the map must not grow with every distinct string
pub const MAX_CACHE_ENTRIES: usize = 4096;

static CONDITION_CACHE: Lazy<RwLock<AHashMap<String, Parsed>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(512)));

/// Parse conditions JSON text once per distinct string
///
/// Forms re-render on every keystroke with the same schema, so nearly every
/// call after the first is answered under the shared read lock.
#[inline]
pub fn get_or_parse(conditions: &str) -> Result<Parsed> {
    if let Some(parsed) = CONDITION_CACHE.read().get(conditions) {
        return Ok(Arc::clone(parsed));
    }

    // Parse outside the lock; a failed parse is returned and never stored
    let parsed = Arc::new(parser::parse_conditions_str(conditions)?);
    insert_bounded(
        &mut CONDITION_CACHE.write(),
        conditions,
        Arc::clone(&parsed),
        MAX_CACHE_ENTRIES,
    );
    Ok(parsed)
}

fn insert_bounded(
    cache: &mut AHashMap<String, Parsed>,
    conditions: &str,
    parsed: Parsed,
    limit: usize,
) {
    if cache.len() >= limit && !cache.contains_key(conditions) {
        log::debug!("conditions cache reached {limit} entries, flushing");
        cache.clear();
    }
    log::trace!("cached conditions ({} bytes)", conditions.len());
    cache.insert(conditions.to_string(), parsed);
}

/// Check conditions JSON text against form data, using the cached parse
///
/// Blank text is treated like absent conditions and is never satisfied.
#[inline]
pub fn check_conditions(
    conditions: &str,
    form_data: &FormData,
    now: Option<NaiveDateTime>,
) -> Result<bool> {
    if conditions.trim().is_empty() {
        return Ok(false);
    }

    let parsed = get_or_parse(conditions)?;
    let parsed: &Option<ConditionSet> = &parsed;
    crate::condition::evaluator::evaluate(parsed.as_ref(), form_data, now)
}

/// Clear the conditions cache
pub fn clear_cache() {
    let mut cache = CONDITION_CACHE.write();
    cache.clear();
}

/// Number of cached entries
pub fn cache_size() -> usize {
    let cache = CONDITION_CACHE.read();
    cache.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormLogicError;
    use serde_json::json;

    #[test]
    fn test_cache_hit() {
        let text = r#"[["cache_hit_field", "greater_than", "5"]]"#;
        let form = FormData::from_value(json!({ "cache_hit_field": 10 })).unwrap();

        assert!(check_conditions(text, &form, None).unwrap());
        let first = get_or_parse(text).unwrap();

        // Same text, same shared parse
        assert!(check_conditions(text, &form, None).unwrap());
        let second = get_or_parse(text).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache_size() >= 1);
    }

    #[test]
    fn test_blank_conditions() {
        let form = FormData::new();
        assert!(!check_conditions("", &form, None).unwrap());
        assert!(!check_conditions("   ", &form, None).unwrap());
        assert!(!check_conditions("null", &form, None).unwrap());
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let text = "[[\"unterminated\"";
        let err = check_conditions(text, &FormData::new(), None).unwrap_err();
        assert!(matches!(err, FormLogicError::DeserializationError(_)));
        assert!(get_or_parse(text).is_err());
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut cache = AHashMap::new();
        for i in 0..10 {
            insert_bounded(&mut cache, &format!("[[\"f{i}\", \"is_empty\"]]"), Arc::new(None), 4);
            assert!(cache.len() <= 4);
        }
        // The entry that triggered the flush is kept
        assert!(cache.contains_key("[[\"f9\", \"is_empty\"]]"));
    }

    #[test]
    fn test_refreshing_existing_entry_does_not_flush() {
        let mut cache = AHashMap::new();
        for key in ["a", "b", "c"] {
            insert_bounded(&mut cache, key, Arc::new(None), 3);
        }
        insert_bounded(&mut cache, "b", Arc::new(None), 3);
        assert_eq!(cache.len(), 3);
    }
}
