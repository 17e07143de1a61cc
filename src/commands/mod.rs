pub mod apply;
pub mod config;
pub mod query;
pub mod resources;

use anyhow::{Context, Result, bail};
use declarative::{ResourceAdapter, catalog};
use prismakit::{Credentials, HttpTransport};
use serde_json::Value;

use crate::cli::ConnectionArgs;
use crate::config::Config;

/// Look up a built-in adapter, listing the known kinds on failure
pub fn find_adapter(kind: &str) -> Result<ResourceAdapter> {
    if let Some(adapter) = catalog::find(kind) {
        return Ok(adapter);
    }
    let known: Vec<String> = catalog::all().into_iter().map(|a| a.kind).collect();
    bail!("Unknown resource kind '{kind}' (known: {})", known.join(", "))
}

/// Load config, log in, and return an authenticated transport
pub fn connect(args: &ConnectionArgs) -> Result<HttpTransport> {
    let config = Config::load()?.with_overrides(args);
    let credentials = credentials(&config)?;

    let mut transport = HttpTransport::with_timeout(&config.api.url, config.timeout());
    transport
        .login(&credentials)
        .with_context(|| format!("Could not log in to {}", config.api.url))?;
    log::info!("Logged in to {} as {}", config.api.url, credentials.username);
    Ok(transport)
}

fn credentials(config: &Config) -> Result<Credentials> {
    let username = config
        .auth
        .username
        .clone()
        .context("No username configured (use --username, PRISMA_USERNAME or [auth] username)")?;

    let password = match &config.auth.password {
        Some(password) => password.clone(),
        None => dialoguer::Password::new()
            .with_prompt(format!("Secret key for {username}"))
            .interact()
            .context("Could not read the secret key")?,
    };

    let mut credentials = Credentials::new(username, password);
    if let Some(name) = &config.auth.customer_name {
        credentials = credentials.customer_name(name.clone());
    }
    Ok(credentials)
}

/// Split `name=value`, parsing the value as a JSON scalar when possible
pub fn parse_assignment(arg: &str) -> Result<(String, Value)> {
    let Some((name, value)) = arg.split_once('=') else {
        bail!("Expected NAME=VALUE, got '{arg}'");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Missing name in '{arg}'");
    }
    Ok((name.to_string(), parse_value(value)))
}

/// `true`, `3` and `"quoted"` parse as JSON; anything else is a string
pub fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => value,
        _ => Value::String(raw.to_string()),
    }
}
