//! Attribute filter engine
//!
//! Narrows a listing with a list of [`Predicate`]s (all must hold), then
//! emits each surviving record as-is, projected to the adapter's summary
//! fields, or replaced by its detail record fetched from the API.

use crate::adapter::ResourceAdapter;
use crate::error::{Error, Result};
use crate::types::{Operation, QueryResult, ResourceRecord, scalar_text};
use prismakit::Transport;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How the primary search term is compared to the primary field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Whole-value equality
    #[default]
    Exact,
    /// Case-sensitive substring
    Substring,
    /// Unanchored regular expression search
    Regex,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "exact" => Ok(Self::Exact),
            "substring" => Ok(Self::Substring),
            "regex" => Ok(Self::Regex),
            other => Err(format!(
                "invalid search type '{other}' (expected exact, substring or regex)"
            )),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Substring => write!(f, "substring"),
            Self::Regex => write!(f, "regex"),
        }
    }
}

/// One condition a record must satisfy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Match the adapter's primary field against a search term
    PrimaryMatch { mode: MatchMode, value: String },
    /// Require a field to equal a value
    FieldEquals { field: String, value: Value },
}

/// What to emit for each matching record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expansion {
    /// The listing record, unmodified
    #[default]
    Listing,
    /// Only the adapter's identity fields
    Summary,
    /// The detail record, fetched per match
    Details,
}

impl From<Option<bool>> for Expansion {
    fn from(expand_details: Option<bool>) -> Self {
        match expand_details {
            None => Self::Listing,
            Some(false) => Self::Summary,
            Some(true) => Self::Details,
        }
    }
}

/// Predicates ANDed together plus the output expansion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub predicates: Vec<Predicate>,
    pub expansion: Expansion,
}

impl FilterCriteria {
    /// Criteria matching every record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build criteria from a primary search term, field filters and a
    /// ternary expansion flag. Null filter values are ignored.
    pub fn from_parts<I>(
        primary_value: Option<&str>,
        mode: MatchMode,
        field_filters: I,
        expand_details: Option<bool>,
    ) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut criteria = Self::new().expansion(expand_details.into());
        if let Some(value) = primary_value {
            criteria = criteria.primary(value, mode);
        }
        for (field, value) in field_filters {
            if !value.is_null() {
                criteria = criteria.field(field, value);
            }
        }
        criteria
    }

    pub fn primary(mut self, value: impl Into<String>, mode: MatchMode) -> Self {
        self.predicates.push(Predicate::PrimaryMatch {
            mode,
            value: value.into(),
        });
        self
    }

    pub fn field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.predicates.push(Predicate::FieldEquals {
            field: field.into(),
            value,
        });
        self
    }

    pub fn expansion(mut self, expansion: Expansion) -> Self {
        self.expansion = expansion;
        self
    }
}

/// A predicate bound to an adapter, with its regex compiled
enum Matcher<'a> {
    Exact { field: &'a str, value: &'a str },
    Substring { field: &'a str, value: &'a str },
    Regex { field: &'a str, regex: Regex },
    Equals { field: &'a str, value: &'a Value },
}

impl<'a> Matcher<'a> {
    fn compile(predicate: &'a Predicate, adapter: &'a ResourceAdapter) -> Result<Self> {
        let field = adapter.primary_field.as_str();
        Ok(match predicate {
            Predicate::PrimaryMatch {
                mode: MatchMode::Exact,
                value,
            } => Self::Exact { field, value },
            Predicate::PrimaryMatch {
                mode: MatchMode::Substring,
                value,
            } => Self::Substring { field, value },
            Predicate::PrimaryMatch {
                mode: MatchMode::Regex,
                value,
            } => Self::Regex {
                field,
                regex: Regex::new(value).map_err(|e| Error::MalformedFilter {
                    pattern: value.clone(),
                    message: e.to_string(),
                })?,
            },
            Predicate::FieldEquals { field, value } => Self::Equals { field, value },
        })
    }

    fn matches(&self, record: &ResourceRecord) -> bool {
        match self {
            Self::Equals { field, value } => record.get(*field).is_some_and(|v| field_equals(v, value)),
            Self::Exact { field, value } => primary_text(record, field).is_some_and(|t| t == *value),
            Self::Substring { field, value } => {
                primary_text(record, field).is_some_and(|t| t.contains(*value))
            }
            Self::Regex { field, regex } => {
                primary_text(record, field).is_some_and(|t| regex.is_match(&t))
            }
        }
    }
}

/// JSON equality, except that numbers also equal their decimal text
/// (`"123456789012"` vs `123456789012`); IDs come back as either.
fn field_equals(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            *s == n.to_string()
        }
        _ => actual == expected,
    }
}

fn primary_text(record: &ResourceRecord, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(scalar_text)
        .map(|text| text.into_owned())
}

/// Filter a listing and emit the matches.
///
/// Listing order is preserved. With [`Expansion::Details`] each match costs
/// one GET on the adapter's detail path, and any failure aborts the query.
pub fn query<T: Transport + ?Sized>(
    transport: &T,
    listing: &[ResourceRecord],
    criteria: &FilterCriteria,
    adapter: &ResourceAdapter,
) -> Result<QueryResult> {
    let matchers = criteria
        .predicates
        .iter()
        .map(|p| Matcher::compile(p, adapter))
        .collect::<Result<Vec<_>>>()?;

    if criteria.expansion == Expansion::Details && !adapter.supports_details() {
        return Err(Error::Unsupported {
            kind: adapter.kind.clone(),
            operation: "detail expansion",
        });
    }

    let mut emitted = Vec::new();
    for record in listing {
        if !matchers.iter().all(|m| m.matches(record)) {
            continue;
        }
        let output = match criteria.expansion {
            Expansion::Listing => record.clone(),
            Expansion::Summary => summarize(record, adapter),
            Expansion::Details => fetch_details(transport, record, adapter)?,
        };
        emitted.push(output);
    }

    log::debug!(
        "(filter) {}: {} of {} records matched",
        adapter.kind,
        emitted.len(),
        listing.len()
    );
    Ok(QueryResult::from_listing(emitted))
}

/// Keep only the identity fields; missing fields become null
fn summarize(record: &ResourceRecord, adapter: &ResourceAdapter) -> ResourceRecord {
    adapter
        .identity_fields
        .iter()
        .map(|field| {
            let value = record.get(field).cloned().unwrap_or(Value::Null);
            (field.clone(), value)
        })
        .collect()
}

fn fetch_details<T: Transport + ?Sized>(
    transport: &T,
    record: &ResourceRecord,
    adapter: &ResourceAdapter,
) -> Result<ResourceRecord> {
    let Some(template) = &adapter.detail_path else {
        return Err(Error::Unsupported {
            kind: adapter.kind.clone(),
            operation: "detail expansion",
        });
    };
    let path = template.render(record)?;
    let details = transport
        .get(&path)
        .map_err(Error::remote(Operation::Fetch, &adapter.kind))?;
    into_record(details, &adapter.kind)
}

pub(crate) fn into_record(value: Value, kind: &str) -> Result<ResourceRecord> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(Error::MalformedResponse(format!(
            "expected a {kind} object, got {other}"
        ))),
    }
}

/// GET the adapter's listing.
///
/// `scope` supplies the listing path's field segments, e.g. `complianceId`
/// for requirements of one compliance standard.
pub fn fetch_listing<T: Transport + ?Sized>(
    transport: &T,
    adapter: &ResourceAdapter,
    scope: &ResourceRecord,
) -> Result<Vec<ResourceRecord>> {
    list_records(transport, adapter, scope, Operation::List)
}

pub(crate) fn list_records<T: Transport + ?Sized>(
    transport: &T,
    adapter: &ResourceAdapter,
    scope: &ResourceRecord,
    operation: Operation,
) -> Result<Vec<ResourceRecord>> {
    let path = adapter.list_path.render(scope).map_err(|e| match e {
        Error::MissingPathField { field } => Error::MissingParameter { name: field },
        other => other,
    })?;

    let response = if adapter.list_query.is_empty() {
        transport.get(&path)
    } else {
        transport.get_with_query(&path, &adapter.list_query)
    }
    .map_err(Error::remote(operation, &adapter.kind))?;

    let Value::Array(items) = response else {
        return Err(Error::MalformedResponse(format!(
            "expected a {} listing array",
            adapter.kind
        )));
    };
    items
        .into_iter()
        .map(|item| into_record(item, &adapter.kind))
        .collect()
}

/// Fetch the adapter's listing and filter it
pub fn fetch_and_query<T: Transport + ?Sized>(
    transport: &T,
    adapter: &ResourceAdapter,
    scope: &ResourceRecord,
    criteria: &FilterCriteria,
) -> Result<QueryResult> {
    let listing = fetch_listing(transport, adapter, scope)?;
    query(transport, &listing, criteria, adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::PathTemplate;
    use crate::error::ErrorKind;
    use prismakit::{Method, MockTransport, Query};
    use serde_json::json;

    fn records(value: Value) -> Vec<ResourceRecord> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn adapter() -> ResourceAdapter {
        ResourceAdapter::new("widget", "name")
            .identity_fields(&["name", "id"])
            .filter_fields(&["env", "id"])
            .list(PathTemplate::literal(&["widget"]))
            .detail(PathTemplate::literal(&["widget"]).field("id"))
    }

    fn names(result: &QueryResult) -> Vec<&str> {
        result
            .listing
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn test_match_mode_from_str() {
        assert_eq!("exact".parse::<MatchMode>().unwrap(), MatchMode::Exact);
        assert_eq!("substring".parse::<MatchMode>().unwrap(), MatchMode::Substring);
        assert_eq!("regex".parse::<MatchMode>().unwrap(), MatchMode::Regex);
        assert!("fuzzy".parse::<MatchMode>().is_err());
        assert_eq!(MatchMode::default(), MatchMode::Exact);
    }

    #[test]
    fn test_expansion_from_ternary() {
        assert_eq!(Expansion::from(None), Expansion::Listing);
        assert_eq!(Expansion::from(Some(false)), Expansion::Summary);
        assert_eq!(Expansion::from(Some(true)), Expansion::Details);
    }

    #[test]
    fn test_from_parts_skips_null_filters() {
        let filters = vec![
            ("env".to_string(), json!("prod")),
            ("id".to_string(), Value::Null),
        ];
        let criteria = FilterCriteria::from_parts(Some("a"), MatchMode::Regex, filters, Some(true));
        assert_eq!(
            criteria.predicates,
            vec![
                Predicate::PrimaryMatch {
                    mode: MatchMode::Regex,
                    value: "a".into()
                },
                Predicate::FieldEquals {
                    field: "env".into(),
                    value: json!("prod")
                },
            ]
        );
        assert_eq!(criteria.expansion, Expansion::Details);
    }

    #[test]
    fn test_filters_are_anded() {
        let mock = MockTransport::new();
        let listing = records(json!([
            {"name": "a", "env": "prod"},
            {"name": "a", "env": "dev"},
        ]));
        let criteria = FilterCriteria::new()
            .primary("a", MatchMode::Exact)
            .field("env", json!("prod"));

        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.listing[0], listing[0]);
    }

    #[test]
    fn test_match_modes() {
        let mock = MockTransport::new();
        let listing = records(json!([{"name": "foobar"}]));
        let total = |value: &str, mode| {
            let criteria = FilterCriteria::new().primary(value, mode);
            query(&mock, &listing, &criteria, &adapter()).unwrap().total
        };

        assert_eq!(total("oob", MatchMode::Substring), 1);
        assert_eq!(total("oob", MatchMode::Exact), 0);
        assert_eq!(total("foobar", MatchMode::Exact), 1);
        assert_eq!(total("^foo", MatchMode::Regex), 1);
        assert_eq!(total("bar$", MatchMode::Regex), 1);
        assert_eq!(total("^bar", MatchMode::Regex), 0);
        assert_eq!(total("OOB", MatchMode::Substring), 0);
    }

    #[test]
    fn test_primary_match_stringifies_scalars() {
        let mock = MockTransport::new();
        let adapter = ResourceAdapter::new("section", "sectionId");
        let listing = records(json!([{"sectionId": 7}, {"sectionId": null}, {}]));
        let criteria = FilterCriteria::new().primary("7", MatchMode::Exact);
        let result = query(&mock, &listing, &criteria, &adapter).unwrap();
        assert_eq!(result.total, 1);
    }

    #[test]
    fn test_field_equals_compares_json_values() {
        let mock = MockTransport::new();
        let listing = records(json!([
            {"name": "a", "systemDefault": true},
            {"name": "b", "systemDefault": "true"},
            {"name": "c"},
        ]));
        let criteria = FilterCriteria::new().field("systemDefault", json!(true));
        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(names(&result), vec!["a"]);
    }

    #[test]
    fn test_field_equals_numbers_match_their_text() {
        let mock = MockTransport::new();
        let listing = records(json!([
            {"name": "prod", "id": "123456789012"},
            {"name": "dev", "id": 210987654321_u64},
            {"name": "other", "id": "1234"},
        ]));

        let criteria = FilterCriteria::new().field("id", json!(123_456_789_012_u64));
        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(names(&result), vec!["prod"]);

        let criteria = FilterCriteria::new().field("id", json!("210987654321"));
        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(names(&result), vec!["dev"]);
    }

    #[test]
    fn test_order_is_preserved_and_total_counts_matches() {
        let mock = MockTransport::new();
        let listing = records(json!([
            {"name": "zeta"},
            {"name": "alpha"},
            {"name": "other"},
            {"name": "beta"},
        ]));
        let criteria = FilterCriteria::new().primary("a$", MatchMode::Regex);
        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(names(&result), vec!["zeta", "alpha", "beta"]);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn test_empty_listing() {
        let mock = MockTransport::new();
        let criteria = FilterCriteria::new().primary("x", MatchMode::Exact);
        let result = query(&mock, &[], &criteria, &adapter()).unwrap();
        assert_eq!(result, QueryResult::default());
    }

    #[test]
    fn test_invalid_regex_fails_even_on_empty_listing() {
        let mock = MockTransport::new();
        let criteria = FilterCriteria::new().primary("(unclosed", MatchMode::Regex);
        let err = query(&mock, &[], &criteria, &adapter()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedFilter);
        assert!(matches!(err, Error::MalformedFilter { pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_summary_projects_identity_fields() {
        let mock = MockTransport::new();
        let listing = records(json!([{"name": "a", "env": "prod"}]));
        let criteria = FilterCriteria::new().expansion(Expansion::Summary);
        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(
            Value::Object(result.listing[0].clone()),
            json!({"name": "a", "id": null})
        );
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_details_replace_listing_record() {
        let mock = MockTransport::new();
        let detail = json!({"id": "w2", "name": "b", "rules": [1, 2]});
        mock.on(Method::Get, &["widget", "w2"], detail.clone());
        let listing = records(json!([
            {"id": "w1", "name": "a"},
            {"id": "w2", "name": "b"},
        ]));
        let criteria = FilterCriteria::new()
            .primary("b", MatchMode::Exact)
            .expansion(Expansion::Details);

        let result = query(&mock, &listing, &criteria, &adapter()).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(Value::Object(result.listing[0].clone()), detail);
        assert_eq!(
            Value::Object(result.listing[0].clone()),
            mock.get(&["widget".to_string(), "w2".to_string()]).unwrap()
        );
    }

    #[test]
    fn test_details_one_request_per_match() {
        let mock = MockTransport::new();
        mock.on(Method::Get, &["widget", "w1"], json!({"id": "w1"}));
        mock.on(Method::Get, &["widget", "w2"], json!({"id": "w2"}));
        let listing = records(json!([
            {"id": "w1", "name": "a"},
            {"id": "w2", "name": "a"},
        ]));
        let criteria = FilterCriteria::new().expansion(Expansion::Details);

        query(&mock, &listing, &criteria, &adapter()).unwrap();
        let uris: Vec<String> = mock.calls().into_iter().map(|c| c.uri).collect();
        assert_eq!(uris, vec!["/widget/w1", "/widget/w2"]);
    }

    #[test]
    fn test_vanished_detail_aborts_query() {
        let mock = MockTransport::new();
        mock.on(Method::Get, &["widget", "w1"], json!({"id": "w1"}));
        let listing = records(json!([
            {"id": "w1", "name": "a"},
            {"id": "gone", "name": "a"},
        ]));
        let criteria = FilterCriteria::new().expansion(Expansion::Details);

        let err = query(&mock, &listing, &criteria, &adapter()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Some(Operation::Fetch));
    }

    #[test]
    fn test_details_without_detail_path_is_unsupported() {
        let mock = MockTransport::new();
        let adapter = ResourceAdapter::new("section", "sectionId");
        let criteria = FilterCriteria::new().expansion(Expansion::Details);
        let err = query(&mock, &[], &criteria, &adapter).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }

    #[test]
    fn test_fetch_and_query_uses_list_query() {
        let mock = MockTransport::new();
        let mut params = Query::new();
        params.insert("cloudType".into(), "aws".into());
        mock.on_query(
            Method::Get,
            &["cloud", "name"],
            &params,
            json!([{"id": "1", "name": "prod"}, {"id": "2", "name": "dev"}]),
        );
        let adapter = ResourceAdapter::new("aws_cloud_account", "name")
            .list(PathTemplate::literal(&["cloud", "name"]))
            .list_query("cloudType", "aws");

        let criteria = FilterCriteria::new().primary("dev", MatchMode::Exact);
        let result = fetch_and_query(&mock, &adapter, &ResourceRecord::new(), &criteria).unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.listing[0]["id"], "2");
    }

    #[test]
    fn test_fetch_listing_scope_parameters() {
        let mock = MockTransport::new();
        mock.on(
            Method::Get,
            &["compliance", "c1", "requirement"],
            json!([{"id": "r1", "name": "CIS 1"}]),
        );
        let adapter = ResourceAdapter::new("compliance_requirement", "name")
            .list(PathTemplate::literal(&["compliance"]).field("complianceId").lit("requirement"));

        let err = fetch_listing(&mock, &adapter, &ResourceRecord::new()).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { name } if name == "complianceId"));

        let mut scope = ResourceRecord::new();
        scope.insert("complianceId".into(), json!("c1"));
        let listing = fetch_listing(&mock, &adapter, &scope).unwrap();
        assert_eq!(listing.len(), 1);
    }

    #[test]
    fn test_fetch_listing_requires_array_of_objects() {
        let mock = MockTransport::new();
        mock.on(Method::Get, &["widget"], json!({"items": []}));
        let err = fetch_listing(&mock, &adapter(), &ResourceRecord::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);

        mock.on(Method::Get, &["widget"], json!(["a", "b"]));
        let err = fetch_listing(&mock, &adapter(), &ResourceRecord::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_listing_failure_is_tagged_list() {
        let mock = MockTransport::new();
        mock.on_error(
            Method::Get,
            &["widget"],
            prismakit::Error::AuthenticationFailure("expired".into()),
        );
        let err = fetch_listing(&mock, &adapter(), &ResourceRecord::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.operation(), Some(Operation::List));
    }
}
