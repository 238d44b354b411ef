//! Cached remote document with interval-gated refresh.
//!
//! Every published document (messages, sponsorship, add-ons) goes through the
//! same cycle:
//!
//! 1. `open` loads the refresh state from the [`StateStore`] and the last
//!    good copy from its [`FileCache`]. Missing files yield zero values.
//! 2. `refresh` skips when offline or when the interval has not elapsed,
//!    otherwise downloads under an exclusive refresh lock and, on success,
//!    swaps the in-memory copy, rewrites the cache and saves the state.
//!
//! Refresh failures never reach the caller; they are logged at debug level
//! and the previous copy keeps being served.

use crate::state::{is_due, TimestampedState};
use crate::types::Remote;
use binary_file_cache::FileCache;
use chrono::{DateTime, Utc};
use ddev_config_and_utils::ProbeFn;
use jsonc_downloader::{GithubJsoncDownloader, JsoncDownloader, UrlJsoncDownloader};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use state_store::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Wall clock, injectable for tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// What happens to `updated_at` when a download fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Back off for a full interval before trying again.
    AdvanceUpdatedAt,
    /// Try again on the next call.
    KeepUpdatedAt,
}

/// How loudly an unreadable cache file is reported on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptCache {
    Debug,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Offline,
    Fresh,
    Updated,
    Failed,
}

/// Where a document is downloaded from.
#[derive(Clone)]
pub enum DocumentSource {
    Url(String),
    Github {
        remote: Remote,
        api_base: Option<String>,
    },
    Custom(Arc<dyn JsoncDownloader>),
}

impl DocumentSource {
    pub fn github(remote: Remote) -> Self {
        Self::Github {
            remote,
            api_base: None,
        }
    }

    pub fn downloader(&self) -> Arc<dyn JsoncDownloader> {
        match self {
            Self::Url(url) => Arc::new(UrlJsoncDownloader::new(url.clone())),
            Self::Github { remote, api_base } => {
                let downloader = GithubJsoncDownloader::new(
                    remote.owner.clone(),
                    remote.repo.clone(),
                    remote.filepath.clone(),
                    remote.reference.clone(),
                );
                match api_base {
                    Some(base) => Arc::new(downloader.with_api_base(base.clone())),
                    None => Arc::new(downloader),
                }
            }
            Self::Custom(downloader) => Arc::clone(downloader),
        }
    }
}

impl std::fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Github { remote, api_base } => f
                .debug_struct("Github")
                .field("remote", remote)
                .field("api_base", api_base)
                .finish(),
            Self::Custom(downloader) => {
                f.debug_tuple("Custom").field(&downloader.source()).finish()
            }
        }
    }
}

/// Settings for a document that is refreshed on a fixed cadence from a
/// fixed source.
#[derive(Clone)]
pub struct DocumentOptions {
    pub local_dir: PathBuf,
    pub source: DocumentSource,
    /// Hours between downloads.
    pub update_interval: i64,
    pub clock: Clock,
}

impl DocumentOptions {
    pub fn new(
        local_dir: impl Into<PathBuf>,
        source: DocumentSource,
        update_interval: i64,
    ) -> Self {
        Self {
            local_dir: local_dir.into(),
            source,
            update_interval,
            clock: system_clock(),
        }
    }
}

impl std::fmt::Debug for DocumentOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentOptions")
            .field("local_dir", &self.local_dir)
            .field("source", &self.source)
            .field("update_interval", &self.update_interval)
            .finish_non_exhaustive()
    }
}

struct Slot<T, S> {
    data: T,
    state: S,
    cache: FileCache<T>,
}

pub struct RemoteDocument<T, S> {
    name: &'static str,
    state_key: &'static str,
    policy: FailurePolicy,
    store: Arc<StateStore>,
    slot: Mutex<Slot<T, S>>,
    refresh_lock: Mutex<()>,
}

impl<T, S> RemoteDocument<T, S>
where
    T: Serialize + DeserializeOwned + Default + Clone,
    S: Serialize + DeserializeOwned + Default + TimestampedState,
{
    pub fn open(
        name: &'static str,
        cache_path: impl Into<PathBuf>,
        state_key: &'static str,
        store: Arc<StateStore>,
        policy: FailurePolicy,
        corrupt: CorruptCache,
    ) -> Self {
        let state = store.get::<S>(state_key).unwrap_or_else(|err| {
            debug!(document = name, error = %err, "Failed to read document state, starting fresh");
            S::default()
        });

        let mut cache = FileCache::new(cache_path);
        let data = cache.read().unwrap_or_else(|err| {
            match corrupt {
                CorruptCache::Warn => {
                    warn!(document = name, error = %err, "Unreadable cache, starting empty")
                }
                CorruptCache::Debug => {
                    debug!(document = name, error = %err, "Unreadable cache, starting empty")
                }
            }
            T::default()
        });

        Self {
            name,
            state_key,
            policy,
            store,
            slot: Mutex::new(Slot { data, state, cache }),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn data(&self) -> T {
        self.slot.lock().data.clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T, &S) -> R) -> R {
        let slot = self.slot.lock();
        f(&slot.data, &slot.state)
    }

    /// Run `f` against the state; when it returns `true` the state is saved.
    pub fn update_state(&self, f: impl FnOnce(&T, &mut S) -> bool) -> bool {
        let mut slot = self.slot.lock();
        let Slot { data, state, .. } = &mut *slot;
        let changed = f(data, state);
        if changed {
            self.persist_state(state);
        }
        changed
    }

    /// Download a new copy if online and due.
    ///
    /// `interval` receives the current copy and returns the refresh interval
    /// in hours; `source` picks the downloader, also from the current copy.
    pub fn refresh(
        &self,
        probe: &ProbeFn,
        interval: impl Fn(&T) -> i64,
        source: impl FnOnce(&T) -> Arc<dyn JsoncDownloader>,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        if !probe() {
            debug!(document = self.name, "Offline, skipping refresh");
            return RefreshOutcome::Offline;
        }
        if !self.is_due(&interval, now) {
            return RefreshOutcome::Fresh;
        }

        let _refreshing = self.refresh_lock.lock();
        // Another caller may have finished a refresh while we waited.
        if !self.is_due(&interval, now) {
            return RefreshOutcome::Fresh;
        }

        let downloader = {
            let slot = self.slot.lock();
            source(&slot.data)
        };
        debug!(document = self.name, source = %downloader.source(), "Refreshing document");

        match jsonc_downloader::download::<T>(downloader.as_ref()) {
            Ok(data) => {
                let mut slot = self.slot.lock();
                if let Err(err) = slot.cache.write(&data) {
                    debug!(document = self.name, error = %err, "Failed to write document cache");
                }
                slot.data = data;
                slot.state.set_updated_at(now);
                self.persist_state(&slot.state);
                debug!(document = self.name, "Document updated");
                RefreshOutcome::Updated
            }
            Err(err) => {
                debug!(
                    document = self.name,
                    source = %downloader.source(),
                    error = %err,
                    "Failed to download document"
                );
                if self.policy == FailurePolicy::AdvanceUpdatedAt {
                    let mut slot = self.slot.lock();
                    slot.state.set_updated_at(now);
                    self.persist_state(&slot.state);
                }
                RefreshOutcome::Failed
            }
        }
    }

    fn is_due(&self, interval: &impl Fn(&T) -> i64, now: DateTime<Utc>) -> bool {
        let slot = self.slot.lock();
        is_due(slot.state.updated_at(), interval(&slot.data), now)
    }

    fn persist_state(&self, state: &S) {
        let result = self
            .store
            .set(self.state_key, state)
            .and_then(|()| self.store.save());
        if let Err(err) = result {
            debug!(
                document = self.name,
                key = self.state_key,
                error = %err,
                "Failed to save document state"
            );
        }
    }
}

impl<T, S> std::fmt::Debug for RemoteDocument<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDocument")
            .field("name", &self.name)
            .field("state_key", &self.state_key)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A refresh running on its own thread.
#[derive(Debug, Default)]
pub struct BackgroundRefresh {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundRefresh {
    pub fn spawn(thread_name: &str, job: impl FnOnce() + Send + 'static) -> Self {
        let handle = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(job)
            .map_err(|err| {
                warn!(thread = thread_name, error = %err, "Failed to spawn refresh thread")
            })
            .ok();
        Self {
            handle: Mutex::new(handle),
        }
    }

    /// Block until the refresh has finished. Later calls return immediately.
    pub fn wait(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Refresh thread panicked");
            }
        }
    }
}
