//! Usage telemetry built on the [`EventQueue`].
//!
//! Events are only queued by [`Telemetry::track`]; nothing is sent until a
//! [`flush`](Telemetry::flush) finds the queue full or the reporting interval
//! elapsed. Failed batches go back to the front of the queue with a backoff
//! deadline and are dropped after `max_retries` attempts.

use crate::error::QueueResult;
use crate::event::{Event, StorageEvent};
use crate::queue::EventQueue;
use crate::transmitter::Transmitter;
use chrono::{Duration, Utc};
use ddev_config_and_utils::{
    GlobalConfig, Paths, ProbeFn, DDEV_VERSION, DEFAULT_INSTRUMENTATION_QUEUE_SIZE,
    DEFAULT_INSTRUMENTATION_REPORTING_INTERVAL,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use state_store::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State key holding [`InstrumentationState`].
pub const INSTRUMENTATION_STATE_KEY: &str = "instrumentation";
pub const PRODUCT_ID: &str = "ddev cli";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentationState {
    pub device_id: String,
}

#[derive(Debug, Clone)]
pub struct TelemetryOptions {
    pub api_key: String,
    pub opt_in: bool,
    pub user: String,
    /// Queued events that trigger a send.
    pub queue_size: usize,
    /// Hours between sends when the queue stays below `queue_size`.
    pub reporting_interval: i64,
    pub cache_file: PathBuf,
    /// Events per request.
    pub batch_size: usize,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub app_version: String,
}

impl TelemetryOptions {
    pub fn new(api_key: impl Into<String>, cache_file: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            opt_in: true,
            user: String::new(),
            queue_size: DEFAULT_INSTRUMENTATION_QUEUE_SIZE,
            reporting_interval: DEFAULT_INSTRUMENTATION_REPORTING_INTERVAL,
            cache_file: cache_file.into(),
            batch_size: 100,
            max_retries: 5,
            backoff_base: Duration::minutes(1),
            backoff_max: Duration::hours(24),
            app_version: DDEV_VERSION.to_string(),
        }
    }

    pub fn from_global_config(config: &GlobalConfig, paths: &Paths) -> Self {
        let mut options = Self::new(config.amplitude_api_key(), paths.amplitude_cache_file());
        options.opt_in = config.instrumentation_opt_in;
        options.user = config.instrumentation_user.clone();
        options.queue_size = config.instrumentation_queue_size;
        options.reporting_interval = config.instrumentation_reporting_interval;
        options
    }
}

/// What a flush did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub sent: usize,
    pub returned: usize,
    pub dropped: usize,
}

pub struct Telemetry {
    options: TelemetryOptions,
    queue: EventQueue,
    transmitter: Arc<dyn Transmitter>,
    probe: ProbeFn,
    device_id: String,
    flushing: Mutex<()>,
}

impl Telemetry {
    /// Set up the queue and device identity.
    ///
    /// A zero queue size or non-positive interval falls back to the defaults.
    pub fn new(
        options: TelemetryOptions,
        state: &StateStore,
        transmitter: Arc<dyn Transmitter>,
        probe: ProbeFn,
    ) -> QueueResult<Self> {
        let queue_size = if options.queue_size == 0 {
            DEFAULT_INSTRUMENTATION_QUEUE_SIZE
        } else {
            options.queue_size
        };
        let interval_hours = if options.reporting_interval <= 0 {
            DEFAULT_INSTRUMENTATION_REPORTING_INTERVAL
        } else {
            options.reporting_interval
        };
        let interval = Duration::try_hours(interval_hours).unwrap_or(Duration::MAX);

        let queue = EventQueue::new(queue_size, interval, &options.cache_file)?;
        let device_id = device_id(state);

        Ok(Self {
            options,
            queue,
            transmitter,
            probe,
            device_id,
            flushing: Mutex::new(()),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Opted out or no API key. Events are neither queued nor sent.
    pub fn is_opted_out(&self) -> bool {
        !self.options.opt_in || self.options.api_key.is_empty()
    }

    /// Opted out, no API key, or offline.
    pub fn is_disabled(&self) -> bool {
        self.is_opted_out() || !(self.probe)()
    }

    /// Queue an event stamped with this installation's details.
    pub fn track(&self, event_type: &str, properties: Map<String, Value>) {
        if self.is_opted_out() {
            return;
        }
        let mut event = self.stamp(Event::new(event_type));
        event.event_properties = properties;
        self.queue.push_new(StorageEvent::new(event));
        debug!(event_type, "Event queued");
    }

    /// Queue an identify event carrying installation properties.
    pub fn identify(&self, mut user_properties: Map<String, Value>) {
        if self.is_opted_out() {
            return;
        }
        if !self.options.user.is_empty() {
            user_properties.insert("User".to_string(), Value::String(self.options.user.clone()));
        }
        let mut event = self.stamp(Event::new("$identify"));
        event.user_properties = user_properties;
        self.queue.push_new(StorageEvent::new(event));
    }

    /// Send queued events if the queue is full or the interval has passed.
    ///
    /// Returns immediately when another flush is running.
    pub fn flush(&self) -> FlushReport {
        if self.is_disabled() {
            return FlushReport::default();
        }
        let Some(_flushing) = self.flushing.try_lock() else {
            debug!("Flush already running");
            return FlushReport::default();
        };

        let mut report = FlushReport::default();
        loop {
            let batch = self.queue.pull(self.options.batch_size, Utc::now());
            if batch.is_empty() || !self.transmit(batch, &mut report) {
                break;
            }
        }
        report
    }

    /// Send every ready event regardless of queue size and interval.
    pub fn flush_force(&self) -> FlushReport {
        if self.is_disabled() {
            return FlushReport::default();
        }
        let _flushing = self.flushing.lock();

        let mut report = FlushReport::default();
        loop {
            let batch = self.queue.pull_forced(self.options.batch_size, Utc::now());
            if batch.is_empty() || !self.transmit(batch, &mut report) {
                break;
            }
        }
        report
    }

    /// Delete every queued event.
    pub fn clean(&self) -> QueueResult<()> {
        self.queue.clean()
    }

    /// Returns whether the batch was delivered.
    fn transmit(&self, batch: Vec<StorageEvent>, report: &mut FlushReport) -> bool {
        let events: Vec<Event> = batch.iter().map(|e| e.event.clone()).collect();
        match self.transmitter.send(&events) {
            Ok(()) => {
                report.sent += events.len();
                info!(events = events.len(), "Telemetry sent");
                true
            }
            Err(err) => {
                warn!(events = events.len(), error = %err, "Failed to send telemetry");
                let now = Utc::now();
                let mut retry = Vec::with_capacity(batch.len());
                for mut event in batch {
                    if event.retry_count >= self.options.max_retries {
                        report.dropped += 1;
                        continue;
                    }
                    event.schedule_retry(now, self.options.backoff_base, self.options.backoff_max);
                    retry.push(event);
                }
                report.returned += retry.len();
                self.queue.return_back(retry);
                false
            }
        }
    }

    fn stamp(&self, mut event: Event) -> Event {
        event.device_id = self.device_id.clone();
        event.app_version = self.options.app_version.clone();
        event.platform = std::env::consts::ARCH.to_string();
        event.os_name = std::env::consts::OS.to_string();
        event.language = std::env::var("LANG").unwrap_or_default();
        event.product_id = PRODUCT_ID.to_string();
        event
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("device_id", &self.device_id)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// The persisted device id, generated on first use.
fn device_id(state: &StateStore) -> String {
    let mut record: InstrumentationState =
        state.get(INSTRUMENTATION_STATE_KEY).unwrap_or_else(|err| {
            debug!(error = %err, "Failed to read instrumentation state");
            InstrumentationState::default()
        });
    if !record.device_id.is_empty() {
        return record.device_id;
    }

    record.device_id = uuid::Uuid::new_v4().to_string();
    let saved = state
        .set(INSTRUMENTATION_STATE_KEY, &record)
        .and_then(|()| state.save());
    if let Err(err) = saved {
        debug!(error = %err, "Failed to save device id");
    }
    record.device_id
}
