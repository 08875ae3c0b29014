use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::{RetryPolicy, ScanSettings};
use crate::error::{AppError, Result};
use crate::probe::ClassificationPolicy;
use crate::services::DEFAULT_USER_AGENT;

const APP_DIR: &str = "geo-catalog";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default)]
    pub request_delay_ms: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Language probed when an item lists none.
    #[serde(default = "default_language")]
    pub default_language: String,

    #[serde(default)]
    pub classification: ClassificationConfig,

    #[serde(default)]
    pub repair: RepairConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Treat HTTP 500 from a platform as a geo block.
    #[serde(default = "default_true")]
    pub restrict_on_500: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_backoff")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// `name=value` pairs copied from a logged-in browser session.
    #[serde(default)]
    pub session_cookies: Vec<String>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("catalog.db").to_string_lossy().to_string()
}

fn default_export_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("export")
        .to_string_lossy()
        .to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_language() -> String {
    crate::probe::DEFAULT_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    8000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            export_dir: default_export_dir(),
            max_concurrency: default_max_concurrency(),
            request_delay_ms: 0,
            probe_timeout_secs: default_probe_timeout(),
            user_agent: default_user_agent(),
            default_language: default_language(),
            classification: ClassificationConfig::default(),
            repair: RepairConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            restrict_on_500: default_true(),
        }
    }
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl Config {
    /// Loads the config at `path`, or at the default location. A missing file
    /// is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(AppError::Config("max_concurrency must be at least 1".into()));
        }
        if self.repair.max_attempts == 0 {
            return Err(AppError::Config("repair.max_attempts must be at least 1".into()));
        }
        if self.default_language.trim().is_empty() {
            return Err(AppError::Config("default_language cannot be empty".into()));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn classification_policy(&self) -> ClassificationPolicy {
        ClassificationPolicy::new(self.classification.restrict_on_500)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.repair.max_attempts,
            base_backoff: Duration::from_millis(self.repair.base_backoff_ms),
            max_backoff: Duration::from_millis(self.repair.max_backoff_ms),
        }
    }

    pub fn scan_settings(&self, disable_geo_check: bool) -> ScanSettings {
        ScanSettings {
            max_concurrency: self.max_concurrency,
            request_delay: Duration::from_millis(self.request_delay_ms),
            disable_geo_check,
        }
    }
}
