//! Field-level diff computation for audit logging
//!
//! Compares two flat snapshots and records `{old, new}` for every field whose
//! value changed, skipping fields excluded by policy. Values are compared with
//! structural equality, so arrays and objects are equal when their contents
//! are.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::Snapshot;

/// Fields never written to a diff unless the settings override the list
pub const DEFAULT_EXCLUDED_FIELDS: [&str; 7] = [
    "password",
    "passwordHash",
    "secret",
    "totpSecret",
    "twoFactorSecret",
    "createdAt",
    "updatedAt",
];

/// Before/after values of a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }
}

/// Field name to change, ordered by field name
pub type Diff = BTreeMap<String, FieldChange>;

/// Default exclusion set as owned strings
pub fn default_excluded_fields() -> BTreeSet<String> {
    DEFAULT_EXCLUDED_FIELDS
        .iter()
        .map(|f| f.to_string())
        .collect()
}

/// Compute the field-level diff between two snapshots
///
/// Keys from both snapshots are considered. A key missing on one side is
/// compared as `null`, so `{}` and `{"a": null}` do not differ.
pub fn compute_diff(old: &Snapshot, new: &Snapshot, excluded: &BTreeSet<String>) -> Diff {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    keys.into_iter()
        .filter(|key| !excluded.contains(key.as_str()))
        .filter_map(|key| {
            let old_val = old.get(key).unwrap_or(&Value::Null);
            let new_val = new.get(key).unwrap_or(&Value::Null);

            if old_val == new_val {
                None
            } else {
                Some((
                    key.clone(),
                    FieldChange::new(old_val.clone(), new_val.clone()),
                ))
            }
        })
        .collect()
}

/// Generate a human-readable one-line summary of a diff
///
/// Returns `None` for an empty diff.
pub fn summarize_diff(diff: &Diff) -> Option<String> {
    if diff.is_empty() {
        return None;
    }

    let changes: Vec<String> = diff
        .iter()
        .map(|(field, change)| {
            format!(
                "{}: {} -> {}",
                field,
                format_value(&change.old),
                format_value(&change.new)
            )
        })
        .collect();

    Some(changes.join(", "))
}

/// Format a JSON value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings on a char boundary
            if s.chars().count() > 50 {
                let truncated: String = s.chars().take(47).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
