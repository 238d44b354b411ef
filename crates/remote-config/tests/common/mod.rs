#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use ddev_config_and_utils::ProbeFn;
use jsonc_downloader::{DownloadError, DownloadResult, JsoncDownloader};
use parking_lot::Mutex;
use remote_config::{
    Clock, DocumentSource, RecordingUi, RemoteConfig, RemoteConfigOptions,
};
use state_store::StateStore;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves a fixed body (or a 500) and counts fetches.
pub struct StaticDownloader {
    body: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl StaticDownloader {
    pub fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(Some(body.to_string())),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            body: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_body(&self, body: &str) {
        *self.body.lock() = Some(body.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl JsoncDownloader for StaticDownloader {
    fn fetch(&self) -> DownloadResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.body.lock().clone().ok_or(DownloadError::Status {
            url: "test://static".to_string(),
            status: 500,
        })
    }

    fn source(&self) -> String {
        "test://static".to_string()
    }
}

/// A clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(at)))
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock();
        *now += by;
    }

    pub fn clock(&self) -> Clock {
        let inner = Arc::clone(&self.0);
        Arc::new(move || *inner.lock())
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn online() -> ProbeFn {
    Arc::new(|| true)
}

pub fn offline() -> ProbeFn {
    Arc::new(|| false)
}

pub fn store(dir: &Path) -> Arc<StateStore> {
    Arc::new(StateStore::yaml(dir.join("state.yml")))
}

pub fn options(
    dir: &Path,
    downloader: &Arc<StaticDownloader>,
    version: &str,
    clock: &ManualClock,
) -> RemoteConfigOptions {
    let mut options = RemoteConfigOptions::new(dir);
    options.source = Some(DocumentSource::Custom(downloader.clone()));
    options.ddev_version = version.to_string();
    options.clock = clock.clock();
    options
}

/// Build a manager and wait for its first refresh.
pub fn remote_config(
    dir: &Path,
    downloader: &Arc<StaticDownloader>,
    version: &str,
    clock: &ManualClock,
) -> (RemoteConfig, Arc<RecordingUi>) {
    let ui = Arc::new(RecordingUi::new());
    let manager = RemoteConfig::new(
        options(dir, downloader, version, clock),
        store(dir),
        online(),
        ui.clone(),
    );
    manager.wait_for_refresh();
    (manager, ui)
}
