//! Loader for the `conditions` property of a form field
//!
//! Two grammars are accepted and discriminated by shape:
//! - a JSON array is the flat list `[[field, operator, value], ...]`
//! - a JSON object is a tree node, grouped when it carries `operatorIdentifier`

use crate::condition::ast::{Condition, ConditionKind, ConditionSet, ConditionValue};
use crate::error::{FormLogicError, Result};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

const COMBINATOR_KEY: &str = "operatorIdentifier";

/// Parse a JSON conditions value; `null` means the field carries no conditions
pub fn parse_conditions(value: &Value) -> Result<Option<ConditionSet>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(entries) => Ok(Some(ConditionSet::Flat(
            entries.iter().map(parse_flat_entry).collect(),
        ))),
        Value::Object(node) => Ok(Some(parse_node(node))),
        other => Err(FormLogicError::InvalidSchema(format!(
            "conditions must be a list, an object or null, got {}",
            json_type(other)
        ))),
    }
}

/// Parse conditions from JSON text
pub fn parse_conditions_str(text: &str) -> Result<Option<ConditionSet>> {
    let value: Value = serde_json::from_str(text)?;
    parse_conditions(&value)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One entry of the flat grammar; unreadable entries never match
fn parse_flat_entry(entry: &Value) -> Condition {
    match entry {
        Value::Array(parts) => {
            let field = parts.first().and_then(Value::as_str).unwrap_or_default();
            let Some(operator) = parts.get(1).and_then(Value::as_str) else {
                return Condition::malformed(field);
            };
            let value = parts
                .get(2)
                .map(ConditionValue::from_json)
                .unwrap_or(ConditionValue::Null);
            let kind = parts
                .get(3)
                .and_then(Value::as_str)
                .map(kind_from_type)
                .unwrap_or_default();
            Condition {
                field: field.to_string(),
                operator: operator.to_string(),
                value,
                kind,
            }
        }
        Value::Object(node) => match node.get("value").and_then(Value::as_object) {
            Some(inner) => parse_leaf(inner).unwrap_or_else(|| Condition::malformed("")),
            None => parse_leaf(node).unwrap_or_else(|| Condition::malformed("")),
        },
        _ => Condition::malformed(""),
    }
}

fn parse_node(node: &Map<String, Value>) -> ConditionSet {
    if let Some(tag) = node.get(COMBINATOR_KEY) {
        let combinator = match tag {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let children = node
            .get("children")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(parse_child).collect())
            .unwrap_or_default();
        return ConditionSet::Group {
            combinator,
            children,
        };
    }

    ConditionSet::Leaf(
        node.get("value")
            .and_then(Value::as_object)
            .and_then(parse_leaf),
    )
}

fn parse_child(child: &Value) -> ConditionSet {
    match child {
        Value::Object(node) => parse_node(node),
        Value::Array(_) => match parse_conditions(child) {
            Ok(Some(set)) => set,
            _ => ConditionSet::Leaf(None),
        },
        _ => ConditionSet::Leaf(None),
    }
}

/// `{ property_meta: { id, type? }, operator, value }`
fn parse_leaf(leaf: &Map<String, Value>) -> Option<Condition> {
    let meta = leaf.get("property_meta")?.as_object()?;
    let field = match meta.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let operator = leaf
        .get("operator")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let value = leaf
        .get("value")
        .map(ConditionValue::from_json)
        .unwrap_or(ConditionValue::Null);
    let kind = meta
        .get("type")
        .and_then(Value::as_str)
        .map(kind_from_type)
        .unwrap_or_default();

    Some(Condition {
        field,
        operator,
        value,
        kind,
    })
}

/// Field types whose conditions use the date catalog
pub fn kind_from_type(field_type: &str) -> ConditionKind {
    match field_type {
        "date" | "datetime" | "date_time" => ConditionKind::Date,
        _ => ConditionKind::Value,
    }
}

impl<'de> Deserialize<'de> for ConditionSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match parse_conditions(&value) {
            Ok(Some(set)) => Ok(set),
            Ok(None) => Err(serde::de::Error::custom("conditions cannot be null here")),
            Err(e) => Err(serde::de::Error::custom(e)),
        }
    }
}

impl Serialize for ConditionSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}
