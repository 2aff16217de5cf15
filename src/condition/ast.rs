//! In-memory grammar for field conditions

use crate::error::{FormLogicError, Result};
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::str::FromStr;

/// Inline capacity for flat condition lists; most fields carry one or two
pub type ConditionList = SmallVec<[Condition; 4]>;

/// Conditions gating a single field
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionSet {
    /// Legacy flat list, combined with an implicit AND
    Flat(ConditionList),
    /// Tree leaf wrapping one condition; `None` when the condition is absent
    Leaf(Option<Condition>),
    /// Tree node combining its children with `and`/`or`
    Group {
        combinator: String,
        children: Vec<ConditionSet>,
    },
}

/// Atomic test against one form field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub operator: String,
    pub value: ConditionValue,
    pub kind: ConditionKind,
}

/// Configured comparison value
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Null,
    Text(String),
    Number(f64),
    List(Vec<String>),
}

/// Which operator catalog a condition is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionKind {
    #[default]
    Value,
    Date,
}

/// Combinator of a group node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = FormLogicError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "and" => Ok(Combinator::And),
            "or" => Ok(Combinator::Or),
            other => Err(FormLogicError::InvalidGrammar(other.to_string())),
        }
    }
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
            kind: ConditionKind::Value,
        }
    }

    /// Same condition, dispatched to the date catalog
    pub fn date(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            kind: ConditionKind::Date,
            ..Self::new(field, operator, value)
        }
    }

    /// Placeholder for an entry the loader could not read; never satisfied
    pub(crate) fn malformed(field: impl Into<String>) -> Self {
        Self::new(field, "", ConditionValue::Null)
    }

    /// Positional triple form: `[field, operator, value, "date"?]`
    pub fn to_json(&self) -> Value {
        let mut entry = vec![
            Value::String(self.field.clone()),
            Value::String(self.operator.clone()),
            self.value.to_json(),
        ];
        if self.kind == ConditionKind::Date {
            entry.push(Value::String("date".to_string()));
        }
        Value::Array(entry)
    }
}

impl ConditionValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, ConditionValue::Null)
    }

    /// Build from an arbitrary JSON value
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ConditionValue::Null,
            Value::Bool(b) => ConditionValue::Text(b.to_string()),
            Value::Number(n) => n
                .as_f64()
                .map(ConditionValue::Number)
                .unwrap_or(ConditionValue::Null),
            Value::String(s) => ConditionValue::Text(s.clone()),
            Value::Array(items) => ConditionValue::List(
                items
                    .iter()
                    .filter_map(crate::condition::coerce::to_text)
                    .collect(),
            ),
            Value::Object(_) => ConditionValue::Null,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ConditionValue::Null => Value::Null,
            ConditionValue::Text(s) => Value::String(s.clone()),
            ConditionValue::Number(n) => json!(n),
            ConditionValue::List(items) => json!(items),
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Text(value)
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        ConditionValue::Number(value)
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        ConditionValue::Number(value as f64)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(value: Vec<&str>) -> Self {
        ConditionValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<Option<ConditionValue>> for ConditionValue {
    fn from(value: Option<ConditionValue>) -> Self {
        value.unwrap_or(ConditionValue::Null)
    }
}

impl ConditionSet {
    /// Flat list from any iterator of conditions
    pub fn flat(conditions: impl IntoIterator<Item = Condition>) -> Self {
        ConditionSet::Flat(conditions.into_iter().collect())
    }

    pub fn leaf(condition: Condition) -> Self {
        ConditionSet::Leaf(Some(condition))
    }

    pub fn and(children: Vec<ConditionSet>) -> Self {
        ConditionSet::Group {
            combinator: "and".to_string(),
            children,
        }
    }

    pub fn or(children: Vec<ConditionSet>) -> Self {
        ConditionSet::Group {
            combinator: "or".to_string(),
            children,
        }
    }

    /// Visit every condition in the set, in document order
    pub fn conditions_mut(&mut self) -> Vec<&mut Condition> {
        let mut out = Vec::new();
        self.collect_mut(&mut out);
        out
    }

    fn collect_mut<'a>(&'a mut self, out: &mut Vec<&'a mut Condition>) {
        match self {
            ConditionSet::Flat(list) => out.extend(list.iter_mut()),
            ConditionSet::Leaf(Some(cond)) => out.push(cond),
            ConditionSet::Leaf(None) => {}
            ConditionSet::Group { children, .. } => {
                for child in children {
                    child.collect_mut(out);
                }
            }
        }
    }

    /// Serialize back to the schema shapes accepted by the loader
    pub fn to_json(&self) -> Value {
        match self {
            ConditionSet::Flat(list) => Value::Array(list.iter().map(Condition::to_json).collect()),
            ConditionSet::Leaf(None) => json!({}),
            ConditionSet::Leaf(Some(cond)) => {
                let mut meta = json!({ "id": cond.field });
                if cond.kind == ConditionKind::Date {
                    meta["type"] = json!("date");
                }
                json!({
                    "value": {
                        "property_meta": meta,
                        "operator": cond.operator,
                        "value": cond.value.to_json(),
                    }
                })
            }
            ConditionSet::Group {
                combinator,
                children,
            } => json!({
                "operatorIdentifier": combinator,
                "children": children.iter().map(ConditionSet::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinator_from_str() {
        assert_eq!("and".parse::<Combinator>().unwrap(), Combinator::And);
        assert_eq!("or".parse::<Combinator>().unwrap(), Combinator::Or);
        assert_eq!(
            "xor".parse::<Combinator>(),
            Err(FormLogicError::InvalidGrammar("xor".to_string()))
        );
    }

    #[test]
    fn test_condition_value_from_json() {
        assert_eq!(ConditionValue::from_json(&json!(null)), ConditionValue::Null);
        assert_eq!(ConditionValue::from_json(&json!(3)), ConditionValue::Number(3.0));
        assert_eq!(
            ConditionValue::from_json(&json!(true)),
            ConditionValue::Text("true".to_string())
        );
        assert_eq!(
            ConditionValue::from_json(&json!(["a", 2])),
            ConditionValue::List(vec!["a".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn test_conditions_mut_visits_tree() {
        let mut set = ConditionSet::or(vec![
            ConditionSet::leaf(Condition::new("a", "equals", "1")),
            ConditionSet::and(vec![
                ConditionSet::Leaf(None),
                ConditionSet::leaf(Condition::new("b", "equals", "2")),
            ]),
        ]);
        let fields: Vec<String> = set
            .conditions_mut()
            .into_iter()
            .map(|c| c.field.clone())
            .collect();
        assert_eq!(fields, vec!["a", "b"]);
    }

    #[test]
    fn test_date_constructor_sets_kind() {
        let cond = Condition::date("due", "past_week", ConditionValue::Null);
        assert_eq!(cond.kind, ConditionKind::Date);
        assert_eq!(cond.to_json(), json!(["due", "past_week", null, "date"]));
    }
}
