use anyhow::{Context, Result};
use prismakit::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::ConnectionArgs;
use crate::paths;

const CONFIG_NAME: &str = "config";
const REDACTED: &str = "********";

// ============================================================================
// Config Format
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Find `<name>.toml` or `<name>.json` in `dir`; TOML wins when both exist
pub fn find_config_file(dir: &Path, name: &str) -> Option<(PathBuf, ConfigFormat)> {
    [ConfigFormat::Toml, ConfigFormat::Json]
        .into_iter()
        .map(|format| (dir.join(format!("{name}.{}", format.extension())), format))
        .find(|(path, _)| path.is_file())
}

// ============================================================================
// Config Schema
// ============================================================================

/// prismactl configuration (`config.toml` or `config.json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Tenant API endpoint
    pub url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access key ID or username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Secret key or password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

impl Config {
    /// Load from the config directory; defaults when no file exists
    pub fn load() -> Result<Self> {
        Self::load_from_dir(&paths::config_dir()?)
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        match find_config_file(dir, CONFIG_NAME) {
            Some((path, format)) => Self::load_file(&path, format),
            None => {
                log::debug!("No config file in {}, using defaults", dir.display());
                Ok(Self::default())
            }
        }
    }

    pub fn load_file(path: &Path, format: ConfigFormat) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = match format {
            ConfigFormat::Toml => toml::from_str(&content)
                .with_context(|| format!("Invalid TOML format in {}", path.display()))?,
            ConfigFormat::Json => serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON format in {}", path.display()))?,
        };
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Path of the config file in use, or where a TOML one would go
    pub fn path() -> Result<PathBuf> {
        let dir = paths::config_dir()?;
        Ok(find_config_file(&dir, CONFIG_NAME)
            .map_or_else(|| dir.join(format!("{CONFIG_NAME}.toml")), |(path, _)| path))
    }

    /// Apply command-line flags (and their env fallbacks) over file values
    pub fn with_overrides(mut self, args: &ConnectionArgs) -> Self {
        if let Some(url) = &args.api_url {
            self.api.url.clone_from(url);
        }
        if let Some(secs) = args.timeout {
            self.api.timeout_secs = secs;
        }
        if args.username.is_some() {
            self.auth.username.clone_from(&args.username);
        }
        if args.password.is_some() {
            self.auth.password.clone_from(&args.password);
        }
        if args.customer_name.is_some() {
            self.auth.customer_name.clone_from(&args.customer_name);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Copy safe to print
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.auth.password.is_some() {
            config.auth.password = Some(REDACTED.to_string());
        }
        config
    }
}

// ============================================================================
// Tests
// ============================================================================
