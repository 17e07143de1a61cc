//! Resource adapters
//!
//! A [`ResourceAdapter`] is plain data describing one resource type: where
//! its listing lives, which field the main search term matches, how to build
//! the path of a single object, and what a complete request body looks like.
//! Both engines are generic over it.

use crate::error::{Error, Result};
use crate::types::{ResourceRecord, scalar_text};
use prismakit::Query;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// One segment of a request path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Used verbatim
    Literal(String),
    /// Substituted with the named field of a record
    FromField(String),
}

/// Request path with literal and record-substituted segments
///
/// Displays as `cloud/{cloudType}/{id}` where braces mark fields.
///
/// ```
/// use declarative::PathTemplate;
/// use serde_json::json;
///
/// let template = PathTemplate::literal(&["cloud"]).field("cloudType").field("id");
/// let record = json!({"cloudType": "aws", "id": "123"});
/// let path = template.render(record.as_object().unwrap()).unwrap();
/// assert_eq!(path, vec!["cloud", "aws", "123"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTemplate(Vec<Segment>);

impl PathTemplate {
    /// Create an empty template
    pub fn new() -> Self {
        Self::default()
    }

    /// Template of literal segments only
    pub fn literal(segments: &[&str]) -> Self {
        Self(
            segments
                .iter()
                .map(|s| Segment::Literal((*s).to_string()))
                .collect(),
        )
    }

    /// Append a literal segment
    pub fn lit(mut self, segment: impl Into<String>) -> Self {
        self.0.push(Segment::Literal(segment.into()));
        self
    }

    /// Append a segment taken from a record field
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.0.push(Segment::FromField(name.into()));
        self
    }

    /// Names of the fields this template substitutes
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|s| match s {
            Segment::FromField(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Build a concrete path from a record
    pub fn render(&self, record: &ResourceRecord) -> Result<Vec<String>> {
        self.0
            .iter()
            .map(|segment| match segment {
                Segment::Literal(s) => Ok(s.clone()),
                Segment::FromField(name) => record
                    .get(name)
                    .and_then(scalar_text)
                    .map(|text| text.into_owned())
                    .ok_or_else(|| Error::MissingPathField {
                        field: name.clone(),
                    }),
            })
            .collect()
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.clone(),
                Segment::FromField(name) => format!("{{{name}}}"),
            })
            .collect();
        write!(f, "{}", parts.join("/"))
    }
}

/// Dotted path to a possibly nested field (`cloudAccount.accountId`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new(path: &str) -> Self {
        Self(path.split('.').map(ToString::to_string).collect())
    }

    pub fn get<'a>(&self, record: &'a ResourceRecord) -> Option<&'a Value> {
        let (first, rest) = self.0.split_first()?;
        let mut value = record.get(first)?;
        for key in rest {
            value = value.as_object()?.get(key)?;
        }
        Some(value)
    }

    /// Text of the field, or `None` when missing, null, compound or empty
    pub fn text(&self, record: &ResourceRecord) -> Option<String> {
        self.get(record)
            .and_then(scalar_text)
            .map(|t| t.into_owned())
            .filter(|t| !t.is_empty())
    }

    /// Set the field, creating (or replacing non-object) intermediate values
    pub fn set(&self, record: &mut ResourceRecord, value: Value) {
        let Some((last, parents)) = self.0.split_last() else {
            return;
        };
        let mut current = record;
        for key in parents {
            let entry = current
                .entry(key.clone())
                .or_insert_with(|| Value::Object(ResourceRecord::new()));
            if !entry.is_object() {
                *entry = Value::Object(ResourceRecord::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            current = next;
        }
        current.insert(last.clone(), value);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Configuration for one resource type
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAdapter {
    /// Unique kind name (e.g. "aws_cloud_account")
    pub kind: String,
    /// Human-readable description
    pub description: String,
    /// Listing field matched by the main search term
    pub primary_field: String,
    /// Fields kept in summary (non-detail) results
    pub identity_fields: Vec<String>,
    /// Listing fields callers may filter on by equality
    pub filter_fields: Vec<String>,
    /// Path of the listing; field segments come from caller parameters
    pub list_path: PathTemplate,
    /// Query parameters sent with the listing request
    pub list_query: Query,
    /// Path of one detailed record, built from a listing record
    pub detail_path: Option<PathTemplate>,
    /// Listing field carrying the server-assigned ID
    pub id_field: String,
    /// Collection for create; `object_path + [id]` for fetch, update and delete
    pub object_path: Option<Vec<String>>,
    /// Where the ID lives in a request body or detailed record
    pub identity_path: FieldPath,
    /// Where the name lives in a request body or detailed record
    pub name_path: FieldPath,
    /// Fields that must be set to create, compared first on update
    pub required_fields: Vec<String>,
    /// Zero-value request body that desired fields are merged over
    pub default_field_values: ResourceRecord,
}

impl ResourceAdapter {
    /// Create an adapter that matches `primary_field` and has no paths yet
    pub fn new(kind: impl Into<String>, primary_field: impl Into<String>) -> Self {
        let primary_field = primary_field.into();
        Self {
            kind: kind.into(),
            description: String::new(),
            identity_fields: vec![primary_field.clone()],
            filter_fields: Vec::new(),
            list_path: PathTemplate::new(),
            list_query: Query::new(),
            detail_path: None,
            id_field: "id".to_string(),
            object_path: None,
            identity_path: FieldPath::new("id"),
            name_path: FieldPath::new(&primary_field),
            required_fields: Vec::new(),
            default_field_values: ResourceRecord::new(),
            primary_field,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn identity_fields(mut self, fields: &[&str]) -> Self {
        self.identity_fields = to_strings(fields);
        self
    }

    pub fn filter_fields(mut self, fields: &[&str]) -> Self {
        self.filter_fields = to_strings(fields);
        self
    }

    /// Set the listing path (`"compliance/{complianceId}/requirement"`)
    pub fn list(mut self, template: PathTemplate) -> Self {
        self.list_path = template;
        self
    }

    pub fn list_query(mut self, key: &str, value: &str) -> Self {
        self.list_query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn detail(mut self, template: PathTemplate) -> Self {
        self.detail_path = Some(template);
        self
    }

    pub fn id_field(mut self, field: &str) -> Self {
        self.id_field = field.to_string();
        self
    }

    pub fn object_path(mut self, segments: &[&str]) -> Self {
        self.object_path = Some(to_strings(segments));
        self
    }

    pub fn identity_path(mut self, path: &str) -> Self {
        self.identity_path = FieldPath::new(path);
        self
    }

    pub fn name_path(mut self, path: &str) -> Self {
        self.name_path = FieldPath::new(path);
        self
    }

    pub fn required_fields(mut self, fields: &[&str]) -> Self {
        self.required_fields = to_strings(fields);
        self
    }

    /// Set the request body skeleton; non-object values are ignored
    pub fn defaults(mut self, skeleton: Value) -> Self {
        if let Value::Object(map) = skeleton {
            self.default_field_values = map;
        }
        self
    }

    /// Whether create, update and delete are defined
    pub fn supports_reconcile(&self) -> bool {
        self.object_path.is_some()
    }

    /// Whether matches can be expanded into detailed records
    pub fn supports_details(&self) -> bool {
        self.detail_path.is_some()
    }

    /// Parameters the listing path needs from the caller
    pub fn list_parameters(&self) -> Vec<&str> {
        self.list_path.fields().collect()
    }

    /// Path of one object by ID
    pub fn item_path(&self, id: &str) -> Option<Vec<String>> {
        self.object_path.as_ref().map(|base| {
            let mut path = base.clone();
            path.push(id.to_string());
            path
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ResourceRecord {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_path_template_display_and_fields() {
        let template = PathTemplate::literal(&["cloud"]).field("cloudType").field("id");
        assert_eq!(template.to_string(), "cloud/{cloudType}/{id}");
        assert_eq!(template.fields().collect::<Vec<_>>(), vec!["cloudType", "id"]);
    }

    #[test]
    fn test_path_template_render_substitutes_fields() {
        let template = PathTemplate::literal(&["compliance"]).field("id");
        let path = template.render(&record(json!({"id": "c-1"}))).unwrap();
        assert_eq!(path, vec!["compliance", "c-1"]);
    }

    #[test]
    fn test_path_template_render_stringifies_scalars() {
        let template = PathTemplate::literal(&["policy"]).field("policyId");
        let path = template.render(&record(json!({"policyId": 42}))).unwrap();
        assert_eq!(path, vec!["policy", "42"]);
    }

    #[test]
    fn test_path_template_render_missing_field() {
        let template = PathTemplate::literal(&["cloud", "group"]).field("id");
        let err = template.render(&record(json!({"name": "x"}))).unwrap_err();
        assert!(matches!(err, Error::MissingPathField { field } if field == "id"));
    }

    #[test]
    fn test_field_path_get_nested() {
        let path = FieldPath::new("cloudAccount.accountId");
        let body = record(json!({"cloudAccount": {"accountId": "123"}}));
        assert_eq!(path.get(&body), Some(&json!("123")));
        assert_eq!(path.text(&body).as_deref(), Some("123"));
    }

    #[test]
    fn test_field_path_text_blank_is_none() {
        let path = FieldPath::new("accountId");
        assert!(path.text(&record(json!({"accountId": ""}))).is_none());
        assert!(path.text(&record(json!({}))).is_none());
    }

    #[test]
    fn test_field_path_set_creates_parents() {
        let path = FieldPath::new("cloudAccount.accountId");
        let mut body = ResourceRecord::new();
        path.set(&mut body, json!("abc"));
        assert_eq!(body, record(json!({"cloudAccount": {"accountId": "abc"}})));

        let mut body = record(json!({"cloudAccount": {"name": "n", "accountId": ""}}));
        path.set(&mut body, json!("xyz"));
        assert_eq!(body["cloudAccount"]["accountId"], "xyz");
        assert_eq!(body["cloudAccount"]["name"], "n");
    }

    #[test]
    fn test_adapter_builder_defaults() {
        let adapter = ResourceAdapter::new("account_group", "name");
        assert_eq!(adapter.identity_fields, vec!["name"]);
        assert_eq!(adapter.id_field, "id");
        assert_eq!(adapter.name_path.to_string(), "name");
        assert!(!adapter.supports_reconcile());
        assert!(!adapter.supports_details());
    }

    #[test]
    fn test_adapter_item_path() {
        let adapter = ResourceAdapter::new("aws_cloud_account", "name").object_path(&["cloud", "aws"]);
        assert_eq!(
            adapter.item_path("123"),
            Some(vec!["cloud".to_string(), "aws".to_string(), "123".to_string()])
        );
    }

    #[test]
    fn test_adapter_list_parameters() {
        let adapter = ResourceAdapter::new("compliance_requirement", "name")
            .list(
                PathTemplate::literal(&["compliance"])
                    .field("complianceId")
                    .lit("requirement"),
            );
        assert_eq!(adapter.list_parameters(), vec!["complianceId"]);
    }
}
