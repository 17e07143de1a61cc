//! Field comparison between a located object and a request body

use crate::adapter::ResourceAdapter;
use crate::types::{DesiredState, ResourceRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The first field found to differ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Top-level field name
    pub field: String,
    /// Value on the located object (null when missing)
    pub current: Value,
    /// Value in the request body (null when missing)
    pub desired: Value,
}

/// Fields to compare, in comparison order.
///
/// The adapter's required fields come first in declared order, then every
/// other field the desired state sets (non-null), sorted by name.
pub fn compared_fields(adapter: &ResourceAdapter, desired: &DesiredState) -> Vec<String> {
    let mut fields = adapter.required_fields.clone();
    let mut explicit: Vec<&String> = desired
        .iter()
        .filter(|(field, value)| !value.is_null() && !fields.contains(*field))
        .map(|(field, _)| field)
        .collect();
    explicit.sort();
    fields.extend(explicit.into_iter().cloned());
    fields
}

/// Compare `fields` in order and stop at the first difference.
///
/// Values are compared whole; a missing field equals null.
pub fn first_difference(
    current: &ResourceRecord,
    body: &ResourceRecord,
    fields: &[String],
) -> Option<FieldChange> {
    fields.iter().find_map(|field| {
        let have = current.get(field).unwrap_or(&Value::Null);
        let want = body.get(field).unwrap_or(&Value::Null);
        (have != want).then(|| FieldChange {
            field: field.clone(),
            current: have.clone(),
            desired: want.clone(),
        })
    })
}
