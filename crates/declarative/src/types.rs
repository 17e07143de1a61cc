//! Core types for declarative resource management

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// A remote object as returned by the API: field name to JSON value.
///
/// No schema is imposed; adapters declare which fields matter.
pub type ResourceRecord = Map<String, Value>;

/// What an object should look like. `null` values mean "not set".
pub type DesiredState = ResourceRecord;

/// Target state for a reconcile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The object must exist and match the desired fields
    #[default]
    Present,
    /// The object must not exist
    Absent,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(format!("invalid state '{other}' (expected present or absent)")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Action decided by a reconcile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Already converged
    #[default]
    None,
    /// Object was (or would be) created
    Create,
    /// Object was (or would be) replaced
    Update,
    /// Object was (or would be) removed
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Remote step an error was raised from, kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    List,
    Lookup,
    Fetch,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::List => "list",
            Self::Lookup => "lookup",
            Self::Fetch => "fetch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// How to find the existing object for a reconcile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Server-assigned ID, fetched directly
    pub by_id: Option<String>,
    /// Name, resolved to an ID through the listing
    pub by_name: Option<String>,
}

impl Identity {
    /// Identify by server ID
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            by_id: Some(id.into()),
            by_name: None,
        }
    }

    /// Identify by name
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            by_id: None,
            by_name: Some(name.into()),
        }
    }

    /// Whether neither an ID nor a name was supplied
    pub fn is_empty(&self) -> bool {
        self.by_id.is_none() && self.by_name.is_none()
    }
}

/// Outcome of a reconcile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileResult {
    /// Whether a create, update or delete was (or would be) issued
    pub changed: bool,
    /// The decided action
    pub action: Action,
    /// The object as located before the reconcile
    pub before: Option<ResourceRecord>,
    /// The object as it should look afterwards
    pub after: Option<ResourceRecord>,
}

/// Outcome of a filtered listing query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Matching records in listing order
    pub listing: Vec<ResourceRecord>,
    /// Number of matching records
    pub total: usize,
}

impl QueryResult {
    pub(crate) fn from_listing(listing: Vec<ResourceRecord>) -> Self {
        let total = listing.len();
        Self { listing, total }
    }
}

/// Text form of a scalar JSON value.
///
/// Strings are returned verbatim, numbers and booleans as their JSON text.
/// `null`, arrays and objects have no text form.
pub fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("present".parse::<Mode>().unwrap(), Mode::Present);
        assert_eq!("absent".parse::<Mode>().unwrap(), Mode::Absent);
        assert!("gone".parse::<Mode>().is_err());
        assert_eq!(Mode::default(), Mode::Present);
    }

    #[test]
    fn test_identity_is_empty() {
        assert!(Identity::default().is_empty());
        assert!(!Identity::id("123").is_empty());
        assert!(!Identity::name("prod").is_empty());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!("abc")).as_deref(), Some("abc"));
        assert_eq!(scalar_text(&json!(42)).as_deref(), Some("42"));
        assert_eq!(scalar_text(&json!(true)).as_deref(), Some("true"));
        assert!(scalar_text(&json!(null)).is_none());
        assert!(scalar_text(&json!([1])).is_none());
        assert!(scalar_text(&json!({"a": 1})).is_none());
    }

    #[test]
    fn test_query_result_serializes_listing_and_total() {
        let record = json!({"name": "a"}).as_object().unwrap().clone();
        let result = QueryResult::from_listing(vec![record]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["total"], 1);
        assert_eq!(value["listing"][0]["name"], "a");
    }

    #[test]
    fn test_reconcile_result_serializes_action_lowercase() {
        let result = ReconcileResult {
            changed: true,
            action: Action::Create,
            before: None,
            after: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["action"], "create");
        assert!(value["before"].is_null());
    }
}
