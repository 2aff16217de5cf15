//! Form field definition

use crate::condition::ConditionSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field of a form builder schema
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FormField {
    /// Key of the field's value in the form data
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    pub label: Option<String>,
    pub default: Option<Value>,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<ConditionSet>,
    /// Nested fields of groups and repeat blocks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schema: Vec<FormField>,
}

impl FormField {
    #[inline]
    pub fn key(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Date and date-time inputs
    #[inline]
    pub fn is_date(&self) -> bool {
        matches!(
            self.field_type.as_deref(),
            Some("date" | "datetime" | "date_time")
        )
    }
}
