use anyhow::Result;
use colored::Colorize;
use declarative::{ResourceAdapter, catalog};

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let adapters = catalog::all();
    let width = adapters.iter().map(|a| a.kind.len()).max().unwrap_or(0);

    ui::header("Resource kinds");
    for adapter in &adapters {
        let modes = if adapter.supports_reconcile() {
            "query, apply".green()
        } else {
            "query".normal()
        };
        println!(
            "  {}  {}  {}",
            ui::pad(&adapter.kind, width).bold(),
            ui::pad(&adapter.primary_field, 10),
            modes
        );
        if ctx.verbose > 0 {
            describe(adapter);
        }
    }

    if !ctx.quiet {
        println!();
        ui::dim("Use -v for listing paths and filter fields.");
    }
    Ok(())
}

fn describe(adapter: &ResourceAdapter) {
    ui::dim(&adapter.description);
    ui::kv("    list", &adapter.list_path.to_string());
    if let Some(detail) = &adapter.detail_path {
        ui::kv("    detail", &detail.to_string());
    }
    if !adapter.filter_fields.is_empty() {
        ui::kv("    filters", &adapter.filter_fields.join(", "));
    }
    let params = adapter.list_parameters();
    if !params.is_empty() {
        ui::kv("    params", &params.join(", "));
    }
}
