use chrono::Duration;
use delayed_event_queue::{
    FlushReport, InstrumentationState, RecordingTransmitter, Telemetry, TelemetryOptions,
    INSTRUMENTATION_STATE_KEY, PRODUCT_ID,
};
use ddev_config_and_utils::ProbeFn;
use serde_json::{json, Map, Value};
use state_store::StateStore;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn online() -> ProbeFn {
    Arc::new(|| true)
}

fn options(dir: &Path) -> TelemetryOptions {
    let mut options = TelemetryOptions::new("test-key", dir.join(".amplitude.cache"));
    options.queue_size = 3;
    options.reporting_interval = 24;
    options.batch_size = 2;
    options.max_retries = 1;
    options.backoff_base = Duration::zero();
    options
}

fn telemetry(
    dir: &Path,
    options: TelemetryOptions,
    probe: ProbeFn,
) -> (Telemetry, Arc<RecordingTransmitter>) {
    let transmitter = Arc::new(RecordingTransmitter::new());
    let state = StateStore::yaml(dir.join("state.yml"));
    let telemetry = Telemetry::new(options, &state, transmitter.clone(), probe).unwrap();
    (telemetry, transmitter)
}

fn props(name: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("Command Name".to_string(), json!(name));
    map
}

#[test]
fn test_device_id_is_persisted() {
    let dir = tempdir().unwrap();
    let (first, _) = telemetry(dir.path(), options(dir.path()), online());
    let (second, _) = telemetry(dir.path(), options(dir.path()), online());

    assert!(!first.device_id().is_empty());
    assert_eq!(first.device_id(), second.device_id());

    let state = StateStore::yaml(dir.path().join("state.yml"));
    let record: InstrumentationState = state.get(INSTRUMENTATION_STATE_KEY).unwrap();
    assert_eq!(record.device_id, first.device_id());
}

#[test]
fn test_track_stamps_events() {
    let dir = tempdir().unwrap();
    let (telemetry, transmitter) = telemetry(dir.path(), options(dir.path()), online());

    telemetry.track("Command", props("start"));
    let report = telemetry.flush_force();

    assert_eq!(report.sent, 1);
    let batches = transmitter.batches();
    let event = &batches[0][0];
    assert_eq!(event.event_type, "Command");
    assert_eq!(event.device_id, telemetry.device_id());
    assert_eq!(event.product_id, PRODUCT_ID);
    assert_eq!(event.os_name, std::env::consts::OS);
    assert_eq!(event.event_properties["Command Name"], "start");
}

#[test]
fn test_flush_waits_for_queue_size() {
    let dir = tempdir().unwrap();
    let (telemetry, transmitter) = telemetry(dir.path(), options(dir.path()), online());
    // Mark the queue as just submitted so only the size can trigger a send.
    telemetry.flush_force();

    telemetry.track("Command", props("a"));
    telemetry.track("Command", props("b"));
    assert_eq!(telemetry.flush(), FlushReport::default());
    assert!(transmitter.batches().is_empty());

    telemetry.track("Command", props("c"));
    let report = telemetry.flush();

    // One batch goes out; the remainder waits for the gate to reopen.
    assert_eq!(report.sent, 2);
    assert_eq!(transmitter.batches().len(), 1);
    assert_eq!(telemetry.queue().len(), 1);
}

#[test]
fn test_failed_batch_is_returned_then_dropped() {
    let dir = tempdir().unwrap();
    let (telemetry, transmitter) = telemetry(dir.path(), options(dir.path()), online());
    transmitter.set_failing(true);
    telemetry.track("Command", props("a"));

    let report = telemetry.flush_force();
    assert_eq!(report, FlushReport { sent: 0, returned: 1, dropped: 0 });
    assert_eq!(telemetry.queue().len(), 1);

    let report = telemetry.flush_force();
    assert_eq!(report, FlushReport { sent: 0, returned: 0, dropped: 1 });
    assert!(telemetry.queue().is_empty());
}

#[test]
fn test_retry_then_success() {
    let dir = tempdir().unwrap();
    let (telemetry, transmitter) = telemetry(dir.path(), options(dir.path()), online());
    transmitter.set_failing(true);
    telemetry.track("Command", props("a"));
    telemetry.flush_force();

    transmitter.set_failing(false);
    let report = telemetry.flush_force();

    assert_eq!(report.sent, 1);
    assert_eq!(transmitter.sent_types(), vec!["Command"]);
}

#[test]
fn test_opted_out_tracks_nothing() {
    let dir = tempdir().unwrap();
    let mut opted_out = options(dir.path());
    opted_out.opt_in = false;
    let (telemetry, transmitter) = telemetry(dir.path(), opted_out, online());

    telemetry.track("Command", props("a"));

    assert!(telemetry.is_disabled());
    assert!(telemetry.queue().is_empty());
    assert_eq!(telemetry.flush_force(), FlushReport::default());
    assert!(transmitter.batches().is_empty());
}

#[test]
fn test_missing_api_key_disables() {
    let dir = tempdir().unwrap();
    let mut no_key = options(dir.path());
    no_key.api_key = String::new();
    let (telemetry, _) = telemetry(dir.path(), no_key, online());

    assert!(telemetry.is_opted_out());
    assert!(telemetry.is_disabled());
}

#[test]
fn test_offline_keeps_events_queued() {
    let dir = tempdir().unwrap();
    let (telemetry, transmitter) = telemetry(dir.path(), options(dir.path()), Arc::new(|| false));

    telemetry.track("Command", props("a"));
    telemetry.identify(Map::new());

    assert!(telemetry.is_disabled());
    assert_eq!(telemetry.flush_force(), FlushReport::default());
    assert_eq!(telemetry.queue().len(), 2);
    assert!(transmitter.batches().is_empty());
}

#[test]
fn test_identify_adds_user() {
    let dir = tempdir().unwrap();
    let mut with_user = options(dir.path());
    with_user.user = "someone".to_string();
    let (telemetry, transmitter) = telemetry(dir.path(), with_user, online());

    telemetry.identify(Map::new());
    telemetry.flush_force();

    let batches = transmitter.batches();
    assert_eq!(batches[0][0].event_type, "$identify");
    assert_eq!(batches[0][0].user_properties["User"], "someone");
}

#[test]
fn test_clean_removes_cache() {
    let dir = tempdir().unwrap();
    let (telemetry, _) = telemetry(dir.path(), options(dir.path()), online());
    telemetry.track("Command", props("a"));
    assert!(dir.path().join(".amplitude.cache").exists());

    telemetry.clean().unwrap();

    assert!(!dir.path().join(".amplitude.cache").exists());
    assert!(telemetry.queue().is_empty());
}
