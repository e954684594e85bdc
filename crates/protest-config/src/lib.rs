use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROTEST_DIR_NAME: &str = ".protest";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_API_BASE_URL_ENV: &str = "PROTEST_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProtestConfig {
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_base_url_env")]
    pub base_url_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            base_url_env: default_base_url_env(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("failed to serialize config TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub fn protest_dir(workspace_root: impl AsRef<Path>) -> PathBuf {
    workspace_root.as_ref().join(PROTEST_DIR_NAME)
}

pub fn config_path(workspace_root: impl AsRef<Path>) -> PathBuf {
    protest_dir(workspace_root).join(CONFIG_FILE_NAME)
}

pub fn load_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<ProtestConfig, ConfigError> {
    let path = config_path(workspace_root);
    if !path.exists() {
        return Ok(ProtestConfig::default());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: ProtestConfig = toml::from_str(&raw)?;
    Ok(normalize_config(parsed))
}

pub fn ensure_workspace_config(
    workspace_root: impl AsRef<Path>,
) -> Result<ProtestConfig, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    fs::create_dir_all(protest_dir(workspace_root))?;

    let path = config_path(workspace_root);
    if path.exists() {
        return load_workspace_config(workspace_root);
    }

    let config = ProtestConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(path, content)?;

    Ok(config)
}

pub fn resolve_base_url(config: &ProtestConfig, override_url: Option<String>) -> String {
    let selected = normalize_optional(override_url)
        .or_else(|| read_env_non_empty(&config.api.base_url_env))
        .or_else(|| normalize_optional(config.api.base_url.clone()))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

    selected.trim_end_matches('/').to_owned()
}

pub fn validate_config(config: &ProtestConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    if let Some(base_url) = config.api.base_url.as_deref()
        && !(base_url.starts_with("http://") || base_url.starts_with("https://"))
    {
        warnings.push(ConfigWarning {
            code: "api_base_url_scheme",
            message: format!("base_url '{base_url}' should start with http:// or https://"),
        });
    }

    if config.api.request_timeout_secs == Some(0) {
        warnings.push(ConfigWarning {
            code: "api_timeout_zero",
            message: "request_timeout_secs = 0 is ignored; the transport default applies"
                .to_owned(),
        });
    }

    warnings
}

fn default_base_url_env() -> String {
    DEFAULT_API_BASE_URL_ENV.to_owned()
}

fn normalize_optional(input: Option<String>) -> Option<String> {
    input
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn read_env_non_empty(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    normalize_optional(env::var(name).ok())
}

fn normalize_config(mut config: ProtestConfig) -> ProtestConfig {
    config.api.base_url = normalize_optional(config.api.base_url.take());

    let base_url_env = config.api.base_url_env.trim();
    if base_url_env.is_empty() {
        config.api.base_url_env = default_base_url_env();
    } else {
        config.api.base_url_env = base_url_env.to_owned();
    }

    config
}
