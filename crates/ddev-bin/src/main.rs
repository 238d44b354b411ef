//! ddev-notify - shows remote notifications, ticker tips and sponsorship
//! appreciation, then records and flushes usage telemetry.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ddev_config_and_utils::{init_logging, GlobalConfig, InternetProbe, Paths};
use delayed_event_queue::{HttpTransmitter, Telemetry, TelemetryOptions};
use remote_config::{
    init_global, init_global_sponsorship, ConsoleUi, DocumentOptions, RemoteConfigOptions,
};
use serde_json::{json, Map};
use state_store::StateStore;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "ddev-notify")]
#[command(about = "Show DDEV notifications and tips")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Defaults to the global
    /// config's `log_level`, which `DDEV_LOG_LEVEL` overrides.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for state, caches and logs. Defaults to ~/.ddev
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new().context("failed to resolve the DDEV directory")?,
    };
    paths.ensure_dirs().context("failed to create the DDEV directory")?;
    let config = GlobalConfig::load(&paths).context("failed to load global config")?;

    let level = config.log_level_for(cli.log_level.as_deref());
    init_logging("ddev-notify", level, Some(paths.log_file()));
    info!(base_dir = %paths.base_dir().display(), "ddev-notify starting");

    let state = Arc::new(StateStore::yaml(paths.state_file()));
    let probe = InternetProbe::new(config.internet_detection_timeout_ms).into_probe_fn();
    let ui = Arc::new(ConsoleUi::new(std::io::stdout().is_terminal()));

    let remote = init_global(
        RemoteConfigOptions::from_global_config(&config, &paths),
        Arc::clone(&state),
        Arc::clone(&probe),
        ui,
    );
    let sponsorship = init_global_sponsorship(
        DocumentOptions::sponsorship_from_global_config(&config, &paths),
        Arc::clone(&state),
        Arc::clone(&probe),
    );

    remote.show_notifications();
    remote.show_ticker();
    // Served from the cached copy; the download in flight lands for the next run.
    if remote.sponsorship_appreciation_due() {
        remote.show_sponsorship_appreciation(&sponsorship);
    }

    let telemetry = Telemetry::new(
        TelemetryOptions::from_global_config(&config, &paths),
        &state,
        Arc::new(HttpTransmitter::new(config.amplitude_api_key())),
        probe,
    )
    .context("failed to open the telemetry queue")?;

    let mut properties = Map::new();
    properties.insert("Command Name".to_string(), json!("notify"));
    telemetry.track("Command", properties);
    let report = telemetry.flush();
    debug!(
        sent = report.sent,
        returned = report.returned,
        dropped = report.dropped,
        "Telemetry flushed"
    );

    // Let the background downloads land so the next run starts from fresh caches.
    remote.wait_for_refresh();
    sponsorship.wait_for_refresh();

    if let Err(err) = state.save() {
        warn!(error = %err, "Failed to save state");
    }
    Ok(())
}
