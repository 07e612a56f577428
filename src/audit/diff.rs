use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Bookkeeping fields excluded from diffing. Covers this schema's column
/// names plus the camelCase / Mongo-style variants so snapshots from either
/// naming convention diff identically.
pub const EXCLUDED_FIELDS: &[&str] = &[
    "id",
    "_id",
    "__v",
    "created_at",
    "createdAt",
    "updated_at",
    "updatedAt",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Top-level field diff between two snapshots.
///
/// Comparison is deep structural equality on `serde_json::Value`, so two
/// distinct instances with equal contents count as unchanged. Fields present
/// on only one side diff against JSON null. Returns an empty list when
/// either snapshot is not an object.
pub fn compute_changes(before: &Value, after: &Value) -> Vec<FieldChange> {
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return Vec::new();
    };

    let mut fields: Vec<&String> = before.keys().chain(after.keys()).collect();
    fields.sort();
    fields.dedup();

    let mut changes = Vec::new();
    for field in fields {
        if EXCLUDED_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let old_value = before.get(field).unwrap_or(&Value::Null);
        let new_value = after.get(field).unwrap_or(&Value::Null);
        if old_value != new_value {
            changes.push(FieldChange {
                field: field.clone(),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            });
        }
    }
    changes
}
