//! File system paths below the global DDEV directory.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const GLOBAL_CONFIG_FILE_NAME: &str = "global_config.yaml";
const STATE_FILE_NAME: &str = "state.yml";
const REMOTE_CONFIG_FILE_NAME: &str = ".remote-config";
const SPONSORSHIP_DATA_FILE_NAME: &str = ".sponsorship-data";
const ADDON_DATA_FILE_NAME: &str = ".addon-data";
const AMPLITUDE_CACHE_FILE_NAME: &str = ".amplitude.cache";

/// Resolves every file DDEV keeps in its global directory.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Global DDEV directory (~/.ddev)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.ddev`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".ddev"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the global DDEV directory (~/.ddev).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the global config file (~/.ddev/global_config.yaml).
    pub fn global_config_file(&self) -> PathBuf {
        self.base_dir.join(GLOBAL_CONFIG_FILE_NAME)
    }

    /// Get the state file (~/.ddev/state.yml).
    pub fn state_file(&self) -> PathBuf {
        self.base_dir.join(STATE_FILE_NAME)
    }

    /// Get the remote config cache (~/.ddev/.remote-config).
    pub fn remote_config_file(&self) -> PathBuf {
        self.base_dir.join(REMOTE_CONFIG_FILE_NAME)
    }

    /// Get the sponsorship data cache (~/.ddev/.sponsorship-data).
    pub fn sponsorship_data_file(&self) -> PathBuf {
        self.base_dir.join(SPONSORSHIP_DATA_FILE_NAME)
    }

    /// Get the add-on registry cache (~/.ddev/.addon-data).
    pub fn addon_data_file(&self) -> PathBuf {
        self.base_dir.join(ADDON_DATA_FILE_NAME)
    }

    /// Get the telemetry event queue cache (~/.ddev/.amplitude.cache).
    pub fn amplitude_cache_file(&self) -> PathBuf {
        self.base_dir.join(AMPLITUDE_CACHE_FILE_NAME)
    }

    /// Get the logs directory (~/.ddev/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file (~/.ddev/logs/ddev.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("ddev.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
