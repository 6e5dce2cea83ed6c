//! Client config load/save for `~/.lawpal/config.yaml`, plus environment
//! overrides (`LAWPAL_API_URL`, `SUPABASE_URL`, `SUPABASE_ANON_KEY`).

use std::path::{Path, PathBuf};

use crate::client::DEFAULT_BASE_URL;

pub const API_URL_ENV: &str = "LAWPAL_API_URL";
pub const AUTH_URL_ENV: &str = "SUPABASE_URL";
pub const AUTH_KEY_ENV: &str = "SUPABASE_ANON_KEY";

/// Backend section (base_url).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Auth provider section (url, anon_key).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuthSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub auth: AuthSection,
}

impl Config {
    /// Backend root, falling back to the hosted LawPal backend.
    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Auth provider `(url, anon_key)`, when both are set.
    pub fn auth_provider(&self) -> Option<(&str, &str)> {
        Some((self.auth.url.as_deref()?, self.auth.anon_key.as_deref()?))
    }

    /// Overlay non-empty values from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`; empty strings count as unset.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(API_URL_ENV) {
            self.api.base_url = Some(url);
        }
        if let Some(url) = get(AUTH_URL_ENV) {
            self.auth.url = Some(url);
        }
        if let Some(key) = get(AUTH_KEY_ENV) {
            self.auth.anon_key = Some(key);
        }
        self
    }
}

/// Returns the default config file path: `~/.lawpal/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".lawpal").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load `path` if it exists, otherwise start from defaults.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        load(path)
    } else {
        Ok(Config::default())
    }
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
