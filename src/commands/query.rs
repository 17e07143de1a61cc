use anyhow::{Context as _, Result, bail};
use declarative::{FilterCriteria, ResourceAdapter, ResourceRecord, filter};
use serde_json::Value;

use super::{connect, find_adapter, parse_assignment};
use crate::Context;
use crate::cli::{ConnectionArgs, QueryArgs};

pub fn run(_ctx: &Context, connection: &ConnectionArgs, args: &QueryArgs) -> Result<()> {
    let adapter = find_adapter(&args.kind)?;
    let criteria = build_criteria(&adapter, args)?;
    let scope = build_scope(&adapter, &args.params)?;

    let transport = connect(connection)?;
    let result = filter::fetch_and_query(&transport, &adapter, &scope, &criteria)
        .with_context(|| format!("Failed to query {}", adapter.kind))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    log::info!("{} {} matched", result.total, adapter.kind);
    Ok(())
}

/// Turn `--name`/`--filter` flags into criteria, rejecting unknown fields
fn build_criteria(adapter: &ResourceAdapter, args: &QueryArgs) -> Result<FilterCriteria> {
    let mut field_filters = Vec::with_capacity(args.filters.len());
    for raw in &args.filters {
        let (field, value) = parse_assignment(raw)?;
        if !adapter.filter_fields.contains(&field) {
            if adapter.filter_fields.is_empty() {
                bail!("{} has no filterable fields", adapter.kind);
            }
            bail!(
                "Cannot filter {} on '{field}' (filterable: {})",
                adapter.kind,
                adapter.filter_fields.join(", ")
            );
        }
        field_filters.push((field, value));
    }

    Ok(FilterCriteria::from_parts(
        args.name.as_deref(),
        args.search_type.into(),
        field_filters,
        args.expand_details(),
    ))
}

/// Collect `--param` values for the listing path
fn build_scope(adapter: &ResourceAdapter, params: &[String]) -> Result<ResourceRecord> {
    let expected = adapter.list_parameters();
    let mut scope = ResourceRecord::new();
    for raw in params {
        let (name, value) = parse_assignment(raw)?;
        if !expected.contains(&name.as_str()) {
            bail!("{} takes no parameter '{name}'", adapter.kind);
        }
        // Path segments are always text
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        scope.insert(name, Value::String(value));
    }
    Ok(scope)
}
