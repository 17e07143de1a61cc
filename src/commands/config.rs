use anyhow::{Context as _, Result};

use crate::Context;
use crate::cli::{ConfigCommand, ConnectionArgs};
use crate::config::Config;
use crate::{paths, ui};

pub fn run(_ctx: &Context, connection: &ConnectionArgs, cmd: &ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(connection),
        ConfigCommand::Path => path(),
    }
}

fn show(connection: &ConnectionArgs) -> Result<()> {
    let config = Config::load()?.with_overrides(connection);

    ui::header("Configuration");
    ui::kv("Config directory", &paths::config_dir()?.display().to_string());
    ui::kv("Config file", &Config::path()?.display().to_string());
    println!();

    let rendered = toml::to_string_pretty(&config.redacted())
        .context("Failed to serialize config")?;
    println!("{rendered}");

    if config.auth.username.is_none() {
        ui::dim("No username set; use --username, PRISMA_USERNAME or [auth] username.");
    }
    Ok(())
}

fn path() -> Result<()> {
    println!("{}", Config::path()?.display());
    Ok(())
}
