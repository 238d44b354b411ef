//! Global DDEV configuration (`~/.ddev/global_config.yaml`).

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Amplitude API key, baked in at build time via the AMPLITUDE_API_KEY env var.
pub const DEFAULT_AMPLITUDE_API_KEY: Option<&str> = option_env!("AMPLITUDE_API_KEY");

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Number of queued telemetry events that triggers a flush.
pub const DEFAULT_INSTRUMENTATION_QUEUE_SIZE: usize = 100;

/// Hours between telemetry flushes when the queue stays below its size.
pub const DEFAULT_INSTRUMENTATION_REPORTING_INTERVAL: i64 = 24;

/// Timeout for the internet reachability probe.
pub const DEFAULT_INTERNET_DETECTION_TIMEOUT_MS: u64 = 3000;

/// Global configuration shared by every DDEV project on this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    pub instrumentation_opt_in: bool,
    pub instrumentation_queue_size: usize,
    /// Hours.
    pub instrumentation_reporting_interval: i64,
    pub instrumentation_user: String,
    pub internet_detection_timeout_ms: u64,
    pub remote_config: RemoteConfigSettings,
    /// Telemetry API key. Compile-time only, never read from the file.
    #[serde(skip)]
    pub amplitude_api_key: Option<String>,
}

/// Local overrides for the remote-config pipeline.
///
/// Zero intervals mean "not set" so the document or built-in default applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfigSettings {
    /// Hours between remote-config downloads.
    pub update_interval: i64,
    /// Hours between ticker messages.
    pub ticker_interval: i64,
    pub ticker_disabled: bool,
    /// Plain URL for the messages document, replacing the GitHub source.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sponsorship_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub addon_data_url: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            instrumentation_opt_in: false,
            instrumentation_queue_size: DEFAULT_INSTRUMENTATION_QUEUE_SIZE,
            instrumentation_reporting_interval: DEFAULT_INSTRUMENTATION_REPORTING_INTERVAL,
            instrumentation_user: String::new(),
            internet_detection_timeout_ms: DEFAULT_INTERNET_DETECTION_TIMEOUT_MS,
            remote_config: RemoteConfigSettings::default(),
            amplitude_api_key: DEFAULT_AMPLITUDE_API_KEY.map(|s| s.to_string()),
        }
    }
}

impl GlobalConfig {
    /// Create a new GlobalConfig with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from the global config file, falling back to defaults.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.global_config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.amplitude_api_key = DEFAULT_AMPLITUDE_API_KEY.map(|s| s.to_string());
        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: GlobalConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the global config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_yaml::to_string(self)?;
        crate::fs::atomic_write(&paths.global_config_file(), content.as_bytes(), 0o644)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_env(|name| std::env::var(name).ok());
    }

    /// Apply the `DDEV_*` overrides returned by `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(log_level) = lookup("DDEV_LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            self.log_level = log_level.trim().to_string();
        }
        if lookup("DDEV_NO_INSTRUMENTATION").is_some_and(|v| !v.is_empty() && v != "false") {
            self.instrumentation_opt_in = false;
        }
    }

    /// Level to log at: an explicit command-line value wins over the
    /// configured (or `DDEV_LOG_LEVEL`) one.
    pub fn log_level_for<'a>(&'a self, cli_level: Option<&'a str>) -> &'a str {
        match cli_level.map(str::trim).filter(|level| !level.is_empty()) {
            Some(level) => level,
            None => &self.log_level,
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.instrumentation_queue_size == 0 {
            return Err(CoreError::Config(
                "instrumentation_queue_size must be greater than zero".to_string(),
            ));
        }
        if self.instrumentation_reporting_interval < 0 {
            return Err(CoreError::Config(
                "instrumentation_reporting_interval must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Telemetry API key, if one was compiled in.
    pub fn amplitude_api_key(&self) -> &str {
        self.amplitude_api_key.as_deref().unwrap_or_default()
    }
}
