//! Field visibility resolution for a whole form

use crate::condition;
use crate::config::{FormField, FormSchema};
use crate::error::{FormLogicError, Result};
use crate::form::FormData;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;

/// Resolved state of one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldState {
    pub key: Option<String>,
    pub visible: bool,
    /// Nesting level; top-level fields are at depth 0
    pub depth: usize,
}

/// A field whose conditions could not be evaluated
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub key: Option<String>,
    pub error: FormLogicError,
}

/// Resolved state of every field, in depth-first schema order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    fields: Vec<FieldState>,
    errors: Vec<FieldError>,
}

impl FormState {
    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    /// Schema-authoring errors to surface in the form designer
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Whether the field with this model is shown; unknown keys are not
    pub fn is_visible(&self, key: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.visible && f.key.as_deref() == Some(key))
    }

    pub fn visible_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.visible)
            .filter_map(|f| f.key.as_deref())
            .collect()
    }

    pub fn hidden_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| !f.visible)
            .filter_map(|f| f.key.as_deref())
            .collect()
    }
}

/// Resolve the visibility of every field in `schema`
///
/// A field is hidden when `hide` is set, when its parent is hidden, or when it
/// carries conditions that are not satisfied. A grammar error in a field's
/// conditions hides that field and is recorded in [`FormState::errors`].
pub fn resolve(schema: &FormSchema, data: &FormData, now: NaiveDateTime) -> FormState {
    let mut state = FormState {
        fields: Vec::with_capacity(schema.fields.len()),
        errors: Vec::new(),
    };
    resolve_fields(&schema.fields, data, now, true, 0, &mut state);
    log::debug!(
        "resolved {} field(s), {} hidden, {} error(s)",
        state.fields.len(),
        state.fields.iter().filter(|f| !f.visible).count(),
        state.errors.len()
    );
    state
}

fn resolve_fields(
    fields: &[FormField],
    data: &FormData,
    now: NaiveDateTime,
    parent_visible: bool,
    depth: usize,
    state: &mut FormState,
) {
    for field in fields {
        let met = conditions_hold(field, data, now, state);
        let visible = parent_visible && !field.hide && met;
        state.fields.push(FieldState {
            key: field.model.clone(),
            visible,
            depth,
        });
        resolve_fields(&field.schema, data, now, visible, depth + 1, state);
    }
}

fn conditions_hold(
    field: &FormField,
    data: &FormData,
    now: NaiveDateTime,
    state: &mut FormState,
) -> bool {
    // Fields without conditions are not gated
    let Some(conditions) = field.conditions.as_ref() else {
        return true;
    };
    match condition::check(conditions, data, now) {
        Ok(met) => met,
        Err(error) => {
            log::warn!(
                "field {:?}: {}; treating its conditions as unsatisfied",
                field.model,
                error
            );
            state.errors.push(FieldError {
                key: field.model.clone(),
                error,
            });
            false
        }
    }
}

/// Resolve a form on the blocking thread pool
///
/// Useful for servers re-validating large submitted forms without stalling
/// the async runtime. `now` is UTC and defaults to the system clock, read once.
pub async fn resolve_async(
    schema: Arc<FormSchema>,
    data: FormData,
    now: Option<NaiveDateTime>,
) -> Result<FormState> {
    let now = now.unwrap_or_else(|| Utc::now().naive_utc());
    let state = tokio::task::spawn_blocking(move || resolve(&schema, &data, now)).await?;
    Ok(state)
}
