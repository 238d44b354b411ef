//! # delayed-event-queue
//!
//! Telemetry events are cheap to record and expensive to send, so they are
//! written to `~/.ddev/.amplitude.cache` as they happen and sent in batches
//! later.
//!
//! - [`EventQueue`]: the disk-backed queue. `pull` only releases events once
//!   `capacity` are waiting or `interval` has passed since the last release.
//!   Events carrying a future `retry_at` are skipped but stay in place.
//! - [`Telemetry`]: tracking, flushing and cleanup on top of the queue,
//!   delivering through a [`Transmitter`].

mod error;
mod event;
mod queue;
mod telemetry;
mod transmitter;

pub use error::{QueueError, QueueResult};
pub use event::{compute_backoff, Event, StorageEvent};
pub use queue::{EventCache, EventQueue};
pub use telemetry::{
    FlushReport, InstrumentationState, Telemetry, TelemetryOptions, INSTRUMENTATION_STATE_KEY,
    PRODUCT_ID,
};
pub use transmitter::{HttpTransmitter, RecordingTransmitter, Transmitter, AMPLITUDE_BATCH_URL};
