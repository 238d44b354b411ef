//! # Observability
//!
//! Logging setup shared by every DDEV Rust crate.
//!
//! Library crates only ever call the `tracing` macros. The binary calls
//! [`init`] or [`init_with_config`] exactly once at startup; after that every
//! event is written as one JSON object per line to `~/.ddev/logs/ddev.jsonl`
//! and, optionally, in compact form to stderr.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "ddev".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!
//!     tracing::info!("ready");
//! }
//! ```
//!
//! `RUST_LOG` always wins over the configured default level.

mod file_sink;
mod json_layer;

use std::path::PathBuf;

pub use file_sink::{default_log_path, JsonlFileWriter};
pub use json_layer::{JsonLayer, LogEntry};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name written into every log line (e.g. "ddev", "ddev-notify").
    pub service_name: String,

    /// Default level filter used when `RUST_LOG` is unset.
    pub default_level: String,

    /// Custom JSONL path. Defaults to `~/.ddev/logs/ddev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Mirror events to stderr in compact form.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "ddev".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Initialize logging with default settings for the given service.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Falls back to a plain compact stderr subscriber when the JSONL file
/// cannot be opened; logging setup never aborts the process. Calling this
/// twice is harmless, the second installation attempt is ignored.
pub fn init_with_config(config: LogConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer};

    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let log_path = config.log_path.clone().or_else(default_log_path);
    let writer = log_path
        .as_ref()
        .map(|path| (path, JsonlFileWriter::open(path)));

    match writer {
        Some((path, Ok(writer))) => {
            let json_layer = JsonLayer::new(config.service_name.clone(), writer);
            let stderr_layer = config.also_stderr.then(|| {
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_filter(filter())
            });

            let installed = tracing_subscriber::registry()
                .with(json_layer.with_filter(filter()))
                .with(stderr_layer)
                .try_init();

            if installed.is_ok() {
                tracing::debug!(log_path = %path.display(), "logging initialized");
            }
        }
        other => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(true)
                .compact()
                .with_writer(std::io::stderr)
                .try_init();

            if let Some((path, Err(e))) = other {
                tracing::warn!(log_path = %path.display(), error = %e, "could not open log file");
            }
        }
    }
}

/// Re-export tracing macros so callers can use `observability::info!()`.
pub use tracing::{debug, error, info, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
