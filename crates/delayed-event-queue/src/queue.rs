use crate::error::{QueueError, QueueResult};
use crate::event::StorageEvent;
use binary_file_cache::FileCache;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error};

/// On-disk form of the queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCache {
    pub last_submitted_at: DateTime<Utc>,
    pub events: Vec<StorageEvent>,
}

struct Inner {
    data: EventCache,
    cache: FileCache<EventCache>,
}

impl Inner {
    fn persist(&mut self) {
        if let Err(err) = self.cache.write(&self.data) {
            error!(
                path = %self.cache.path().display(),
                error = %err,
                "Failed to write event cache"
            );
        }
    }

    fn release_permitted(
        &self,
        capacity: usize,
        interval: Duration,
        before: DateTime<Utc>,
    ) -> bool {
        if self.data.events.len() >= capacity {
            return true;
        }
        match self.data.last_submitted_at.checked_add_signed(interval) {
            Some(deadline) => deadline < before,
            None => false,
        }
    }

    /// Move up to `count` ready events off the front, leaving deferred ones in place.
    fn take_ready(&mut self, count: usize, before: DateTime<Utc>) -> Vec<StorageEvent> {
        let mut released = Vec::with_capacity(count.min(self.data.events.len()));
        let mut kept = Vec::with_capacity(self.data.events.len());
        for event in self.data.events.drain(..) {
            if released.len() < count && event.is_ready(before) {
                released.push(event);
            } else {
                kept.push(event);
            }
        }
        self.data.events = kept;
        released
    }
}

/// Telemetry events waiting to be sent.
///
/// Every change is written through to the cache file so queued events
/// survive the process. Events are released in batches once either
/// `capacity` events are waiting or `interval` has passed since the last
/// release.
pub struct EventQueue {
    capacity: usize,
    interval: Duration,
    inner: RwLock<Inner>,
}

impl EventQueue {
    /// Create a queue backed by `path`, loading whatever it already holds.
    ///
    /// An unreadable cache file is logged and the queue starts empty.
    pub fn new(capacity: usize, interval: Duration, path: impl Into<PathBuf>) -> QueueResult<Self> {
        if capacity == 0 {
            return Err(QueueError::InvalidCapacity(capacity));
        }
        if interval < Duration::zero() {
            return Err(QueueError::InvalidInterval(interval));
        }

        let mut cache = FileCache::new(path);
        let data = cache.read().unwrap_or_else(|err| {
            error!(
                path = %cache.path().display(),
                error = %err,
                "Failed to read event cache, starting empty"
            );
            EventCache::default()
        });
        debug!(
            path = %cache.path().display(),
            events = data.events.len(),
            "Event queue loaded"
        );

        Ok(Self {
            capacity,
            interval,
            inner: RwLock::new(Inner { data, cache }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Append an event.
    pub fn push_new(&self, event: StorageEvent) {
        let mut inner = self.inner.write();
        inner.data.events.push(event);
        inner.persist();
    }

    /// Put previously pulled events back at the front, in the given order.
    pub fn return_back(&self, events: Vec<StorageEvent>) {
        if events.is_empty() {
            return;
        }
        let mut inner = self.inner.write();
        inner.data.events.splice(0..0, events);
        inner.persist();
    }

    /// Release up to `count` events if the queue is full or the interval has
    /// passed since the last release. Events whose `retry_at` is after
    /// `before` stay queued.
    pub fn pull(&self, count: usize, before: DateTime<Utc>) -> Vec<StorageEvent> {
        let mut inner = self.inner.write();
        if !inner.release_permitted(self.capacity, self.interval, before) {
            return Vec::new();
        }

        let released = inner.take_ready(count, before);
        inner.data.last_submitted_at = Utc::now();
        inner.persist();
        debug!(
            released = released.len(),
            remaining = inner.data.events.len(),
            "Events pulled"
        );
        released
    }

    /// Like [`pull`](Self::pull) without the capacity and interval gate.
    pub fn pull_forced(&self, count: usize, before: DateTime<Utc>) -> Vec<StorageEvent> {
        let mut inner = self.inner.write();
        let released = inner.take_ready(count, before);
        inner.data.last_submitted_at = Utc::now();
        inner.persist();
        released
    }

    /// Number of queued events if a pull at `before` would be permitted, else 0.
    pub fn count(&self, before: DateTime<Utc>) -> usize {
        let inner = self.inner.read();
        if inner.release_permitted(self.capacity, self.interval, before) {
            inner.data.events.len()
        } else {
            0
        }
    }

    /// Number of queued events, regardless of the gate.
    pub fn len(&self) -> usize {
        self.inner.read().data.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_submitted_at(&self) -> DateTime<Utc> {
        self.inner.read().data.last_submitted_at
    }

    /// Drop every queued event and delete the cache file.
    pub fn clean(&self) -> QueueResult<()> {
        let mut inner = self.inner.write();
        inner.cache.remove()?;
        inner.data = EventCache::default();
        Ok(())
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("capacity", &self.capacity)
            .field("interval", &self.interval)
            .field("len", &self.len())
            .finish()
    }
}
