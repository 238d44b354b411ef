//! Telemetry events and their queue envelope.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One event in the Amplitude HTTP API shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub event_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    pub device_id: String,
    /// Milliseconds since the Unix epoch.
    pub time: i64,
    pub insert_id: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub event_properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub user_properties: Map<String, Value>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub app_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub platform: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub os_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub product_id: String,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            time: Utc::now().timestamp_millis(),
            insert_id: uuid::Uuid::new_v4().to_string(),
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event_properties.insert(key.into(), value.into());
        self
    }
}

/// An event as held in the queue, with its retry bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageEvent {
    pub event: Event,
    /// Not released before this time.
    pub retry_at: Option<DateTime<Utc>>,
    pub retry_count: u32,
}

impl StorageEvent {
    pub fn new(event: Event) -> Self {
        Self {
            event,
            retry_at: None,
            retry_count: 0,
        }
    }

    /// Whether the event may be released at `before`.
    pub fn is_ready(&self, before: DateTime<Utc>) -> bool {
        self.retry_at.map_or(true, |at| at <= before)
    }

    /// Count a failed attempt and defer the next one.
    pub fn schedule_retry(&mut self, now: DateTime<Utc>, base: Duration, max: Duration) {
        self.retry_count = self.retry_count.saturating_add(1);
        let delay = compute_backoff(self.retry_count, base, max);
        self.retry_at = Some(now.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC));
    }
}

/// Binary exponential backoff: `base * 2^(retry_count - 1)`, capped at `max`.
pub fn compute_backoff(retry_count: u32, base: Duration, max: Duration) -> Duration {
    if retry_count == 0 {
        return Duration::zero();
    }

    let base_ms = base.num_milliseconds().max(0) as u64;
    let max_ms = max.num_milliseconds().max(0) as u64;
    let shift = retry_count - 1;
    let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
    let delay_ms = base_ms.saturating_mul(multiplier).min(max_ms);

    Duration::milliseconds(delay_ms as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_backoff_caps_and_grows() {
        let base = Duration::seconds(2);
        let max = Duration::seconds(10);

        assert_eq!(compute_backoff(0, base, max), Duration::zero());
        assert_eq!(compute_backoff(1, base, max), Duration::seconds(2));
        assert_eq!(compute_backoff(2, base, max), Duration::seconds(4));
        assert_eq!(compute_backoff(3, base, max), Duration::seconds(8));
        assert_eq!(compute_backoff(4, base, max), Duration::seconds(10));
        assert_eq!(compute_backoff(u32::MAX, base, max), Duration::seconds(10));
    }

    #[test]
    fn test_schedule_retry() {
        let now = Utc::now();
        let mut event = StorageEvent::new(Event::new("Command"));
        assert!(event.is_ready(now));

        event.schedule_retry(now, Duration::seconds(30), Duration::hours(1));
        assert_eq!(event.retry_count, 1);
        assert_eq!(event.retry_at, Some(now + Duration::seconds(30)));
        assert!(!event.is_ready(now));
        assert!(event.is_ready(now + Duration::seconds(30)));

        event.schedule_retry(now, Duration::seconds(30), Duration::hours(1));
        assert_eq!(event.retry_at, Some(now + Duration::seconds(60)));
    }

    #[test]
    fn test_event_wire_shape() {
        let event = Event {
            event_type: "Command".to_string(),
            device_id: "device".to_string(),
            time: 1_700_000_000_000,
            insert_id: "id".to_string(),
            ..Default::default()
        }
        .with_property("Command Name", "start");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "Command");
        assert_eq!(value["event_properties"]["Command Name"], "start");
        assert!(value.get("user_id").is_none());
        assert!(value.get("user_properties").is_none());
    }

    #[test]
    fn test_new_event_has_identity() {
        let a = Event::new("Command");
        let b = Event::new("Command");
        assert_ne!(a.insert_id, b.insert_id);
        assert!(a.time > 0);
    }
}
