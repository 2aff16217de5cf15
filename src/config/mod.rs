//! Form schema configuration
//!
//! This module handles deserialization of form builder schemas and prepares
//! their conditions for evaluation.

mod field;

pub use field::*;

use crate::condition::ConditionKind;
use crate::error::{FormLogicError, Result};
use ahash::AHashSet;
use serde_json::Value;

/// A loaded form schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSchema {
    pub fields: Vec<FormField>,
}

impl FormSchema {
    /// Build a schema and route conditions on date fields to the date catalog
    pub fn new(fields: Vec<FormField>) -> Self {
        let mut schema = Self { fields };
        schema.annotate_date_fields();
        schema
    }

    /// Parse schema JSON text
    /// Expected format: `[field, ...]` or `{"schema": [field, ...]}`
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let fields = match value {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut root) => root.remove("schema").ok_or_else(|| {
                FormLogicError::InvalidSchema("schema object has no 'schema' list".to_string())
            })?,
            _ => {
                return Err(FormLogicError::InvalidSchema(
                    "schema must be a list of fields".to_string(),
                ))
            }
        };
        let fields: Vec<FormField> = serde_json::from_value(fields)?;
        Ok(Self::new(fields))
    }

    /// First field (depth-first) whose model is `key`
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.iter().find(|f| f.key() == Some(key))
    }

    /// Depth-first iterator over every field, nested ones included
    pub fn iter(&self) -> Fields<'_> {
        Fields {
            stack: self.fields.iter().rev().collect(),
        }
    }

    /// Mark conditions that test a date-typed field as date conditions
    fn annotate_date_fields(&mut self) {
        let date_keys: AHashSet<String> = self
            .iter()
            .filter(|f| f.is_date())
            .filter_map(|f| f.model.clone())
            .collect();
        if date_keys.is_empty() {
            return;
        }

        let mut annotated = 0usize;
        annotate(&mut self.fields, &date_keys, &mut annotated);
        log::debug!(
            "routed {} condition(s) on {} date field(s) to the date catalog",
            annotated,
            date_keys.len()
        );
    }
}

fn annotate(fields: &mut [FormField], date_keys: &AHashSet<String>, annotated: &mut usize) {
    for field in fields {
        if let Some(conditions) = field.conditions.as_mut() {
            for cond in conditions.conditions_mut() {
                if cond.kind == ConditionKind::Value && date_keys.contains(&cond.field) {
                    cond.kind = ConditionKind::Date;
                    *annotated += 1;
                }
            }
        }
        annotate(&mut field.schema, date_keys, annotated);
    }
}

/// Depth-first field iterator
pub struct Fields<'a> {
    stack: Vec<&'a FormField>,
}

impl<'a> Iterator for Fields<'a> {
    type Item = &'a FormField;

    fn next(&mut self) -> Option<Self::Item> {
        let field = self.stack.pop()?;
        self.stack.extend(field.schema.iter().rev());
        Some(field)
    }
}
