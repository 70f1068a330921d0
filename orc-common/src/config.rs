//! Configuration loading and resolution
//!
//! Every setting follows the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The TOML file carries the venue configuration, so a console cannot start
//! without one.

use crate::content::ApiVersion;
use crate::venue::VenueConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ORC_CONFIG";
/// Environment variable overriding the API base URL
pub const API_URL_ENV_VAR: &str = "ORC_API_URL";
/// Environment variable carrying the API access token
pub const ACCESS_TOKEN_ENV_VAR: &str = "ORC_ACCESS_TOKEN";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    pub venue: VenueConfig,
}

/// REST API connection settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; defaults by API version when unset
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub access_token: Option<String>,

    /// Request timeout; the HTTP client default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Page size for offset/limit paging
    #[serde(default)]
    pub page_limit: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Compiled default API base URL per version
pub fn default_base_url(version: ApiVersion) -> &'static str {
    match version {
        ApiVersion::V1 => "https://api.openreview.net",
        ApiVersion::V2 => "https://api2.openreview.net",
    }
}

/// Resolve the config file path
///
/// CLI argument → `ORC_CONFIG` → platform config dir → system config
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("orc").join("console.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/orc/console.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config(format!(
        "No config file found. Pass --config, set {}, or create ~/.config/orc/console.toml",
        CONFIG_ENV_VAR
    )))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    config.venue.check_rating_names()?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolve the API base URL
pub fn resolve_api_url(cli_arg: Option<&str>, config: &TomlConfig) -> String {
    if let Some(url) = cli_arg.filter(|u| is_valid_value(u)) {
        return trim_url(url);
    }

    if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
        if is_valid_value(&url) {
            return trim_url(&url);
        }
    }

    if let Some(url) = config.api.base_url.as_deref().filter(|u| is_valid_value(u)) {
        return trim_url(url);
    }

    default_base_url(config.venue.api_version).to_string()
}

/// Resolve the API access token
///
/// Anonymous access (no token) is allowed; the API decides what is visible.
pub fn resolve_access_token(cli_arg: Option<&str>, config: &TomlConfig) -> Option<String> {
    let cli_token = cli_arg.filter(|t| is_valid_value(t)).map(str::to_string);
    let env_token = std::env::var(ACCESS_TOKEN_ENV_VAR)
        .ok()
        .filter(|t| is_valid_value(t));
    let toml_token = config
        .api
        .access_token
        .clone()
        .filter(|t| is_valid_value(t));

    let sources: Vec<&str> = [
        ("command line", cli_token.is_some()),
        ("environment", env_token.is_some()),
        ("TOML", toml_token.is_some()),
    ]
    .iter()
    .filter(|(_, present)| *present)
    .map(|(name, _)| *name)
    .collect();

    if sources.len() > 1 {
        warn!(
            "Access token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    cli_token.or(env_token).or(toml_token)
}

/// Non-empty, non-whitespace value
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
