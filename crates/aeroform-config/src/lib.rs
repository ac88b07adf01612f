//! Provider configuration for Aeroform
//!
//! Settings are resolved in this order, first match wins:
//! 1. Environment variables (`AEROFORM_ENDPOINT`, `AEROFORM_TOKEN`,
//!    `AEROFORM_FOLDER_ID`, `AEROFORM_POLL_INTERVAL`)
//! 2. The config file: `AEROFORM_CONFIG_PATH`, else
//!    `~/.config/aeroform/config.yaml`
//! 3. Built-in defaults (poll interval of 5s)

pub mod error;

pub use error::*;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ENDPOINT: &str = "AEROFORM_ENDPOINT";
pub const ENV_TOKEN: &str = "AEROFORM_TOKEN";
pub const ENV_FOLDER_ID: &str = "AEROFORM_FOLDER_ID";
pub const ENV_POLL_INTERVAL: &str = "AEROFORM_POLL_INTERVAL";
pub const ENV_CONFIG_PATH: &str = "AEROFORM_CONFIG_PATH";

const CONFIG_FILE_NAME: &str = "config.yaml";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Aeroform's global config directory (`~/.config/aeroform`)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("aeroform"))
}

/// Locate the provider config file, if there is one
///
/// `AEROFORM_CONFIG_PATH` is used as given, even when the file is missing,
/// so that a typo surfaces as an IO error instead of silently falling back.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(path));
    }

    let global = get_config_dir().ok()?.join(CONFIG_FILE_NAME);
    global.exists().then_some(global)
}

/// Contents of the YAML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub folder_id: Option<String>,
    /// Human readable duration, e.g. `"10s"`
    pub poll_interval: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Resolved provider settings
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub token: String,
    /// Folder used when a resource does not set its own
    pub folder_id: Option<String>,
    pub poll_interval: Duration,
}

impl ProviderConfig {
    /// Resolve from the process environment and the config file
    pub fn load() -> Result<Self> {
        let file = match find_config_file() {
            Some(path) => {
                tracing::debug!("Loading provider config from {}", path.display());
                FileConfig::load(&path)?
            }
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge a file config with environment lookups
    pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pick = |key: &str, from_file: Option<String>| {
            env(key).filter(|v| !v.is_empty()).or(from_file)
        };

        let endpoint = pick(ENV_ENDPOINT, file.endpoint)
            .ok_or(ConfigError::Missing("endpoint", ENV_ENDPOINT))?;
        let token =
            pick(ENV_TOKEN, file.token).ok_or(ConfigError::Missing("token", ENV_TOKEN))?;
        let folder_id = pick(ENV_FOLDER_ID, file.folder_id);

        let poll_interval = match pick(ENV_POLL_INTERVAL, file.poll_interval) {
            Some(raw) => humantime::parse_duration(&raw).map_err(|e| ConfigError::Invalid {
                key: "poll_interval",
                message: e.to_string(),
            })?,
            None => DEFAULT_POLL_INTERVAL,
        };

        Ok(Self {
            endpoint,
            token,
            folder_id,
            poll_interval,
        })
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
