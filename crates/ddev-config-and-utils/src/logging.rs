//! Logging initialization for DDEV binaries.
//!
//! Thin wrapper over the observability crate: every event is written as JSONL
//! to `~/.ddev/logs/ddev.jsonl`.

use std::path::PathBuf;
use tracing::Level;

/// Initialize the logging system.
///
/// `level` is the default filter when `RUST_LOG` is unset. A non-empty
/// `DDEV_DEBUG` forces `debug`. `log_path` overrides the JSONL location.
///
/// ```ignore
/// init_logging("ddev-notify", "info", None);
/// tracing::info!("started");
/// ```
pub fn init_logging(service_name: &str, level: &str, log_path: Option<PathBuf>) {
    let level = if debug_forced() {
        "debug".to_string()
    } else {
        parse_level(level)
            .map(|l| l.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| crate::DEFAULT_LOG_LEVEL.to_string())
    };

    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: level,
        log_path,
        also_stderr: debug_forced(),
    });
}

/// Parse a user supplied level name, case-insensitively.
pub fn parse_level(level: &str) -> Option<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn debug_forced() -> bool {
    std::env::var("DDEV_DEBUG").is_ok_and(|v| !v.is_empty() && v != "false")
}
