//! Configuration for the `dimsync` binary.
//!
//! Settings come from a RON file (every field optional); site credentials
//! come from `SHOPERSITE_{SITE}`, `LOGIN_{SITE}` and `PASSWORD_{SITE}`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dimsync_core::{ClassifierRules, DimensionRules, NormalizeOptions};
use dimsync_engine::{Credentials, FetchSettings, PipelineConfig, RetrySettings};
use dimsync_logging::{dimsync_info, dimsync_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {message}")]
    Read { path: PathBuf, message: String },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Suffix of the credential environment variables, e.g. `MAIN`.
    pub site: String,
    pub page_limit: u32,
    /// Snapshot directory.
    pub sheets_dir: PathBuf,
    pub sheet: SheetConfig,
    pub fetch: FetchConfig,
    pub publish: PublishConfig,
    pub normalize: NormalizeOptions,
    pub dimensions: DimensionRules,
    pub classifier: ClassifierRules,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: "MAIN".to_string(),
            page_limit: 50,
            sheets_dir: PathBuf::from("sheets"),
            sheet: SheetConfig::default(),
            fetch: FetchConfig::default(),
            publish: PublishConfig::default(),
            normalize: NormalizeOptions::default(),
            dimensions: DimensionRules::default(),
            classifier: ClassifierRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    pub sheet_id: String,
    pub sheet_name: String,
    /// Environment variable holding the Sheets API access token.
    pub token_env: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            sheet_name: "Wymiary".to_string(),
            token_env: "GOOGLE_SHEETS_TOKEN".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub default_retry_after_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            default_retry_after_secs: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
        }
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                dimsync_warn!("No config at {:?}; using defaults", path);
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                })
            }
        };

        let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        dimsync_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            default_retry_after: Duration::from_secs(self.fetch.default_retry_after_secs),
        }
    }

    pub fn retry_settings(&self) -> RetrySettings {
        RetrySettings {
            max_attempts: self.publish.max_attempts,
            delay: Duration::from_secs(self.publish.delay_secs),
        }
    }

    pub fn pipeline_config(&self, site_url: &str) -> PipelineConfig {
        PipelineConfig {
            site_url: site_url.to_string(),
            page_limit: self.page_limit,
            normalize: self.normalize.clone(),
            dimensions: self.dimensions.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

/// Shop address and login for one configured site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAccess {
    pub site_url: String,
    pub credentials: Credentials,
}

impl SiteAccess {
    pub fn from_env(site: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(site, |name| std::env::var(name).ok())
    }

    /// Only `SHOPERSITE_{SITE}`; for runs that never log in.
    pub fn offline_from_env(site: &str) -> Result<Self, ConfigError> {
        Self::offline_from_lookup(site, |name| std::env::var(name).ok())
    }

    fn from_lookup<F>(site: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            site_url: site_variable(&lookup, "SHOPERSITE", site)?,
            credentials: Credentials {
                login: site_variable(&lookup, "LOGIN", site)?,
                password: site_variable(&lookup, "PASSWORD", site)?,
            },
        })
    }

    fn offline_from_lookup<F>(site: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            site_url: site_variable(&lookup, "SHOPERSITE", site)?,
            credentials: Credentials::default(),
        })
    }
}

fn site_variable<F>(lookup: &F, prefix: &str, site: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let name = format!("{prefix}_{site}");
    lookup(&name)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingEnv(name))
}

pub fn env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
}
