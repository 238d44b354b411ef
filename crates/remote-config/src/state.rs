//! Records persisted in the state file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State key for [`RemoteConfigState`].
pub const REMOTE_CONFIG_STATE_KEY: &str = "remote_config";
/// State key for the sponsorship document's [`DocumentState`].
pub const SPONSORSHIP_STATE_KEY: &str = "sponsorship_data";
/// State key for the add-on registry's [`DocumentState`].
pub const ADDON_STATE_KEY: &str = "addon_data";

/// Access to the refresh timestamp shared by all document states.
pub trait TimestampedState {
    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfigState {
    pub updated_at: DateTime<Utc>,
    pub last_notification_at: DateTime<Utc>,
    pub last_ticker_at: DateTime<Utc>,
    /// 1-based index of the last ticker message shown, 0 for none.
    pub last_ticker_message: i64,
    pub last_sponsorship_at: DateTime<Utc>,
}

impl TimestampedState for RemoteConfigState {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentState {
    pub updated_at: DateTime<Utc>,
}

impl TimestampedState for DocumentState {
    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Whether `interval_hours` have elapsed since `since`.
///
/// A zero `since` is always due; an interval too large to represent never is.
pub fn is_due(since: DateTime<Utc>, interval_hours: i64, now: DateTime<Utc>) -> bool {
    let interval = chrono::Duration::try_hours(interval_hours).unwrap_or(chrono::Duration::MAX);
    match since.checked_add_signed(interval) {
        Some(deadline) => now >= deadline,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use state_store::StateStore;
    use tempfile::tempdir;

    #[test]
    fn test_zero_state_is_epoch() {
        let state = RemoteConfigState::default();
        assert_eq!(state.updated_at, Utc.timestamp_opt(0, 0).unwrap());
        assert_eq!(state.last_ticker_message, 0);
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        assert!(is_due(DateTime::<Utc>::default(), 6, now));
        assert!(!is_due(now - Duration::hours(5), 6, now));
        assert!(is_due(now - Duration::hours(6), 6, now));
        assert!(!is_due(now, i64::MAX, now));
    }

    #[test]
    fn test_state_round_trip_through_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.yml");
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        let state = RemoteConfigState {
            updated_at: now,
            last_ticker_at: now,
            last_ticker_message: 3,
            ..Default::default()
        };

        let store = StateStore::yaml(&path);
        store.set(REMOTE_CONFIG_STATE_KEY, &state).unwrap();
        store.save().unwrap();

        let reopened = StateStore::yaml(&path);
        let read: RemoteConfigState = reopened.get(REMOTE_CONFIG_STATE_KEY).unwrap();
        assert_eq!(read, state);
    }
}
