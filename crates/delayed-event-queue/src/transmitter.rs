use crate::error::{QueueError, QueueResult};
use crate::event::Event;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

pub const AMPLITUDE_BATCH_URL: &str = "https://api2.amplitude.com/batch";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "ddev";

/// Delivers a batch of events. A batch succeeds or fails as a whole.
pub trait Transmitter: Send + Sync {
    fn send(&self, events: &[Event]) -> QueueResult<()>;
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    api_key: &'a str,
    events: &'a [Event],
}

/// Posts batches to the Amplitude batch API.
#[derive(Debug, Clone)]
pub struct HttpTransmitter {
    api_key: String,
    url: String,
}

impl HttpTransmitter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_url(api_key, AMPLITUDE_BATCH_URL)
    }

    pub fn with_url(api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transmitter for HttpTransmitter {
    fn send(&self, events: &[Event]) -> QueueResult<()> {
        let http_err = |source| QueueError::Http {
            url: self.url.clone(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(http_err)?;

        let body = BatchRequest {
            api_key: &self.api_key,
            events,
        };
        let response = client.post(&self.url).json(&body).send().map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueueError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        debug!(url = %self.url, events = events.len(), "Events delivered");
        Ok(())
    }
}

/// Keeps every batch it is given; optionally fails instead.
#[derive(Debug, Default)]
pub struct RecordingTransmitter {
    batches: Mutex<Vec<Vec<Event>>>,
    fail: Mutex<bool>,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }

    pub fn batches(&self) -> Vec<Vec<Event>> {
        self.batches.lock().clone()
    }

    pub fn sent_types(&self) -> Vec<String> {
        self.batches
            .lock()
            .iter()
            .flatten()
            .map(|event| event.event_type.clone())
            .collect()
    }
}

impl Transmitter for RecordingTransmitter {
    fn send(&self, events: &[Event]) -> QueueResult<()> {
        if *self.fail.lock() {
            return Err(QueueError::Status {
                url: "recording://".to_string(),
                status: 503,
            });
        }
        self.batches.lock().push(events.to_vec());
        Ok(())
    }
}
