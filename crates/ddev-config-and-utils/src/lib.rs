//! Global configuration, paths and shared utilities for the DDEV crates.

mod config;
mod error;
pub mod fs;
mod logging;
mod network;
mod paths;
mod version;

pub use config::{
    GlobalConfig, RemoteConfigSettings, DEFAULT_AMPLITUDE_API_KEY,
    DEFAULT_INSTRUMENTATION_QUEUE_SIZE, DEFAULT_INSTRUMENTATION_REPORTING_INTERVAL,
    DEFAULT_INTERNET_DETECTION_TIMEOUT_MS, DEFAULT_LOG_LEVEL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use network::{InternetProbe, ProbeFn};
pub use paths::Paths;
pub use version::DDEV_VERSION;
