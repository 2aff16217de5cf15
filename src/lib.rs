//! Form Logic Core - conditional form-logic evaluator
//!
//! This crate decides whether the declarative conditions attached to a form
//! builder field are met by the current form data. Two condition grammars
//! are accepted: the flat `[[field, operator, value], ...]` list and the
//! grouped `and`/`or` tree.
//!
//! ```
//! use form_logic_core::{conditions_met, FormData};
//! use serde_json::json;
//!
//! let conditions = json!([["age", "greater_than", "17"], ["country", "equals", "NL"]]);
//! let data = FormData::from_value(json!({ "age": "18", "country": "NL" })).unwrap();
//! assert!(conditions_met(&conditions, &data, None).unwrap());
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod form;

pub use crate::condition::{
    evaluate, evaluate_condition, evaluate_date_condition, Condition, ConditionKind,
    ConditionSet, ConditionValue,
};
pub use crate::config::{FormField, FormSchema};
pub use crate::error::{FormLogicError, Result};
pub use crate::form::{resolve, resolve_async, FieldState, FormData, FormState};

use chrono::NaiveDateTime;
use serde_json::Value;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Evaluate conditions straight from their schema JSON
///
/// # Arguments
/// * `conditions` - The field's `conditions` property (flat list, tree node or null)
/// * `form_data` - Current form data
/// * `now` - Reference instant for date-relative operators in UTC (default: system clock)
///
/// # Errors
/// `InvalidSchema` for a conditions value of the wrong JSON type and
/// `InvalidGrammar` for an unrecognized combinator tag.
pub fn conditions_met(
    conditions: &Value,
    form_data: &FormData,
    now: Option<NaiveDateTime>,
) -> Result<bool> {
    let parsed = condition::parse_conditions(conditions)?;
    evaluate(parsed.as_ref(), form_data, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conditions_met_both_grammars() {
        let data = FormData::from_value(json!({ "a": "x", "b": "y" })).unwrap();

        assert!(conditions_met(&json!([["a", "equals", "x"]]), &data, None).unwrap());
        assert!(conditions_met(
            &json!({
                "operatorIdentifier": "or",
                "children": [
                    { "value": { "property_meta": { "id": "a" }, "operator": "equals", "value": "nope" } },
                    { "value": { "property_meta": { "id": "b" }, "operator": "equals", "value": "y" } }
                ]
            }),
            &data,
            None
        )
        .unwrap());
        assert!(!conditions_met(&json!(null), &data, None).unwrap());
    }

    #[test]
    fn test_conditions_met_errors() {
        let data = FormData::new();
        assert_eq!(
            conditions_met(&json!({ "operatorIdentifier": "xor" }), &data, None),
            Err(FormLogicError::InvalidGrammar("xor".to_string()))
        );
        assert!(matches!(
            conditions_met(&json!(true), &data, None),
            Err(FormLogicError::InvalidSchema(_))
        ));
    }
}
