use anyhow::{Context as _, Result, bail};
use declarative::{
    Action, DesiredState, Identity, Mode, ReconcileOptions, ReconcileResult, ResourceAdapter,
    ResourceRecord, reconcile,
};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

use super::{connect, find_adapter};
use crate::Context;
use crate::cli::{ApplyArgs, ConnectionArgs};
use crate::config::ConfigFormat;
use crate::ui;

pub fn run(ctx: &Context, connection: &ConnectionArgs, args: &ApplyArgs) -> Result<()> {
    let adapter = find_adapter(&args.kind)?;
    if !adapter.supports_reconcile() {
        bail!("{} is read-only; use 'prismactl query'", adapter.kind);
    }

    let desired = match &args.file {
        Some(path) => load_desired(path)?,
        None => DesiredState::new(),
    };
    let identity = resolve_identity(&adapter, &desired, args);
    if identity.is_empty() {
        return Err(declarative::Error::AmbiguousIdentity {
            kind: adapter.kind.clone(),
        })
        .context("Pass --id or --name, or set them in the desired state file");
    }

    let opts = ReconcileOptions {
        mode: args.state.into(),
        dry_run: args.dry_run,
    };
    let transport = connect(connection)?;

    if !opts.dry_run && !args.yes {
        let preview = reconcile(&transport, &adapter, &desired, &identity, opts.dry_run(true))
            .with_context(|| format!("Failed to reconcile {}", adapter.kind))?;
        if !preview.changed {
            report(ctx, &adapter, &identity, &preview, args, false)?;
            return Ok(());
        }
        if !confirm(&adapter, &identity, &preview, args)? {
            ui::warn("Aborted, nothing changed");
            return Ok(());
        }
    }

    let result = reconcile(&transport, &adapter, &desired, &identity, opts)
        .with_context(|| format!("Failed to reconcile {}", adapter.kind))?;
    report(ctx, &adapter, &identity, &result, args, opts.dry_run)
}

/// Identity from the desired state, overridden by --id/--name
fn resolve_identity(adapter: &ResourceAdapter, desired: &DesiredState, args: &ApplyArgs) -> Identity {
    let mut identity = Identity::from_desired(adapter, desired);
    if let Some(id) = &args.id {
        identity.by_id = Some(id.clone());
    }
    if let Some(name) = &args.name {
        identity.by_name = Some(name.clone());
    }
    identity
}

/// Read a desired state from a .json or .toml file
fn load_desired(path: &Path) -> Result<DesiredState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    match ConfigFormat::from_path(path) {
        Some(ConfigFormat::Json) => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON object in {}", path.display())),
        Some(ConfigFormat::Toml) => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display())),
        None => bail!(
            "Unsupported desired state file {} (expected .json or .toml)",
            path.display()
        ),
    }
}

fn confirm(
    adapter: &ResourceAdapter,
    identity: &Identity,
    preview: &ReconcileResult,
    args: &ApplyArgs,
) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        bail!(
            "Refusing to {} {} without --yes when not running interactively",
            preview.action,
            adapter.kind
        );
    }

    ui::header(&format!("Plan: {} {} {}", preview.action, adapter.kind, label(identity)));
    if args.diff || preview.action == Action::Update {
        ui::diff(&render(preview.before.as_ref())?, &render(preview.after.as_ref())?);
    }
    println!();

    let confirmed = dialoguer::Confirm::new()
        .with_prompt("Apply changes?")
        .default(false)
        .interact()?;
    Ok(confirmed)
}

fn report(
    ctx: &Context,
    adapter: &ResourceAdapter,
    identity: &Identity,
    result: &ReconcileResult,
    args: &ApplyArgs,
    dry_run: bool,
) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if ctx.quiet {
        return Ok(());
    }

    if args.diff {
        ui::header("Diff");
        ui::diff(&render(result.before.as_ref())?, &render(result.after.as_ref())?);
    }

    println!();
    let label = label(identity);
    match (result.action, dry_run) {
        (Action::None, _) => ui::success(&format!(
            "{} {label} already {}",
            adapter.kind,
            Mode::from(args.state)
        )),
        (action, true) => ui::info(&format!(
            "Would {action} {} {label} (dry run)",
            adapter.kind
        )),
        (Action::Create, false) => ui::success(&format!("Created {} {label}", adapter.kind)),
        (Action::Update, false) => ui::success(&format!("Updated {} {label}", adapter.kind)),
        (Action::Delete, false) => ui::success(&format!("Deleted {} {label}", adapter.kind)),
    }
    if let Some(id) = created_id(adapter, result) {
        ui::kv("id", &id);
    }
    Ok(())
}

/// Server-assigned identity of a freshly created object
fn created_id(adapter: &ResourceAdapter, result: &ReconcileResult) -> Option<String> {
    if result.action != Action::Create {
        return None;
    }
    result
        .after
        .as_ref()
        .and_then(|after| adapter.identity_path.text(after))
}

fn label(identity: &Identity) -> String {
    match (&identity.by_name, &identity.by_id) {
        (Some(name), _) => format!("'{name}'"),
        (None, Some(id)) => format!("#{id}"),
        (None, None) => String::new(),
    }
}

/// Pretty JSON for diffing; an absent object renders empty
fn render(record: Option<&ResourceRecord>) -> Result<String> {
    Ok(match record {
        Some(record) => serde_json::to_string_pretty(record)? + "\n",
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use declarative::catalog;
    use serde_json::json;
    use tempfile::TempDir;

    fn apply_args(argv: &[&str]) -> ApplyArgs {
        let mut full = vec!["prismactl", "apply"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Apply(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_load_desired_json_and_toml() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("prod.json");
        fs::write(&json_path, r#"{"name": "prod", "enabled": true, "groupIds": ["g1"]}"#).unwrap();
        let toml_path = dir.path().join("prod.toml");
        fs::write(&toml_path, "name = \"prod\"\nenabled = true\ngroupIds = [\"g1\"]\n").unwrap();

        let from_json = load_desired(&json_path).unwrap();
        let from_toml = load_desired(&toml_path).unwrap();
        assert_eq!(from_json, from_toml);
        assert_eq!(from_json["groupIds"], json!(["g1"]));
    }

    #[test]
    fn test_load_desired_rejects_other_formats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prod.yaml");
        fs::write(&path, "name: prod").unwrap();
        assert!(load_desired(&path).is_err());

        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2]").unwrap();
        assert!(load_desired(&path).is_err());
    }

    #[test]
    fn test_resolve_identity_flags_override_file() {
        let adapter = catalog::aws_cloud_account();
        let desired = json!({"name": "from-file", "accountId": "111"})
            .as_object()
            .unwrap()
            .clone();

        let identity = resolve_identity(&adapter, &desired, &apply_args(&["aws_cloud_account"]));
        assert_eq!(identity.by_name.as_deref(), Some("from-file"));
        assert_eq!(identity.by_id.as_deref(), Some("111"));

        let args = apply_args(&["aws_cloud_account", "--name", "flag", "--id", "222"]);
        let identity = resolve_identity(&adapter, &desired, &args);
        assert_eq!(identity.by_name.as_deref(), Some("flag"));
        assert_eq!(identity.by_id.as_deref(), Some("222"));
    }

    #[test]
    fn test_created_id_reads_nested_identity() {
        let adapter = catalog::gcp_cloud_account();
        let result = ReconcileResult {
            changed: true,
            action: Action::Create,
            before: None,
            after: json!({"cloudAccount": {"accountId": "proj-1"}})
                .as_object()
                .cloned(),
        };
        assert_eq!(created_id(&adapter, &result).as_deref(), Some("proj-1"));
    }

    #[test]
    fn test_render_absent_is_empty() {
        assert_eq!(render(None).unwrap(), "");
        let record = json!({"a": 1}).as_object().unwrap().clone();
        assert_eq!(render(Some(&record)).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_label() {
        assert_eq!(label(&Identity::name("prod")), "'prod'");
        assert_eq!(label(&Identity::id("42")), "#42");
    }
}
