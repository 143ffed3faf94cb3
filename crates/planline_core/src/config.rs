//! Backend configuration.
//!
//! # Responsibility
//! - Describe the tenant, remote store credentials, cache layout and probe
//!   cadence used to bootstrap a [`crate::Backend`].
//! - Load configuration from JSON and validate it before any store is opened.
//!
//! # Invariants
//! - Every field has a default, so an empty JSON object is a valid input.
//! - A configuration that fails [`BackendConfig::validate`] never reaches the
//!   network; the backend starts in offline preview mode instead.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tenant id used when the configuration does not name one.
pub const DEFAULT_TENANT_ID: &str = "demo";
/// Seconds between health probes while the backend is blocked.
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;

const PLACEHOLDER_PREFIX: &str = "YOUR_";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// How the local cache is shared between concurrent windows of one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabManager {
    /// One process owns the cache file exclusively.
    Single,
    /// Several processes share the cache file (WAL mode).
    #[default]
    Multiple,
}

impl TabManager {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

/// Where the durable cache lives.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum CacheLocation {
    /// Process-private cache, lost on exit.
    #[default]
    Memory,
    /// SQLite file; parent directories are created on open.
    File(PathBuf),
}

/// Persistent cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// When `false` the backend talks to the remote store directly.
    pub enabled: bool,
    pub location: CacheLocation,
    pub tab_manager: TabManager,
    /// Refresh cached reads from the remote in a background task.
    pub revalidate_in_background: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            location: CacheLocation::Memory,
            tab_manager: TabManager::Multiple,
            revalidate_in_background: true,
        }
    }
}

/// Remote document store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub project_id: String,
    pub api_key: String,
    /// Local emulator database standing in for the hosted store.
    pub emulator_path: Option<PathBuf>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            project_id: "YOUR_PROJECT_ID".to_string(),
            api_key: "YOUR_API_KEY".to_string(),
            emulator_path: None,
        }
    }
}

/// Policy for `get_settings` when the tenant has no settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSettings {
    /// Return the application defaults (`dark`, `100`).
    #[default]
    UseDefaults,
    /// Return `None` and let the caller decide.
    ReportAbsent,
}

/// Complete backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub tenant_id: String,
    pub remote: RemoteConfig,
    pub cache: CacheSettings,
    pub probe_interval_secs: u64,
    pub missing_settings: MissingSettings,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            remote: RemoteConfig::default(),
            cache: CacheSettings::default(),
            probe_interval_secs: DEFAULT_PROBE_INTERVAL_SECS,
            missing_settings: MissingSettings::default(),
        }
    }
}

impl BackendConfig {
    /// Parses a JSON document; absent fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    /// Checks the configuration without touching any store.
    ///
    /// # Errors
    /// - Empty tenant id.
    /// - Empty or placeholder remote credentials.
    /// - Zero probe interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::Invalid("tenant_id cannot be empty".to_string()));
        }
        check_credential("remote.project_id", &self.remote.project_id)?;
        check_credential("remote.api_key", &self.remote.api_key)?;
        if self.probe_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "probe_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_credential(name: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{name} cannot be empty")));
    }
    if trimmed.starts_with(PLACEHOLDER_PREFIX) {
        return Err(ConfigError::Invalid(format!(
            "{name} still holds the placeholder `{trimmed}`"
        )));
    }
    Ok(())
}
