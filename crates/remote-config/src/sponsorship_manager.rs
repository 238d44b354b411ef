use crate::document::{
    BackgroundRefresh, CorruptCache, DocumentOptions, DocumentSource, FailurePolicy,
    RefreshOutcome, RemoteDocument,
};
use crate::sponsorship::SponsorshipData;
use crate::state::{is_due, DocumentState, SPONSORSHIP_STATE_KEY};
use crate::types::Remote;
use ddev_config_and_utils::{GlobalConfig, Paths, ProbeFn};
use state_store::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SPONSORSHIP_UPDATE_INTERVAL_HOURS: i64 = 24;
pub const SPONSORSHIP_CACHE_FILE: &str = ".sponsorship-data";

const REFRESH_THREAD_NAME: &str = "ddev-sponsorship-refresh";

/// `ddev/sponsorship-data@main:data/all-sponsorships.json`.
pub fn default_sponsorship_source() -> DocumentSource {
    DocumentSource::github(Remote::new(
        "ddev",
        "sponsorship-data",
        "main",
        "data/all-sponsorships.json",
    ))
}

impl DocumentOptions {
    pub fn sponsorship(local_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            local_dir,
            default_sponsorship_source(),
            DEFAULT_SPONSORSHIP_UPDATE_INTERVAL_HOURS,
        )
    }

    pub fn sponsorship_from_global_config(config: &GlobalConfig, paths: &Paths) -> Self {
        let mut options = Self::sponsorship(paths.base_dir().clone());
        if !config.remote_config.sponsorship_url.is_empty() {
            options.source = DocumentSource::Url(config.remote_config.sponsorship_url.clone());
        }
        options
    }
}

struct Inner {
    options: DocumentOptions,
    document: RemoteDocument<SponsorshipData, DocumentState>,
    probe: ProbeFn,
}

impl Inner {
    fn refresh(&self) -> RefreshOutcome {
        let now = (self.options.clock)();
        self.document.refresh(
            &self.probe,
            |_| self.options.update_interval,
            |_| self.options.source.downloader(),
            now,
        )
    }
}

/// Keeps the sponsorship figures fresh.
///
/// A failed download leaves the refresh timestamp alone, so the next process
/// tries again instead of waiting out the whole interval.
pub struct SponsorshipManager {
    inner: Arc<Inner>,
    refresh: BackgroundRefresh,
}

impl SponsorshipManager {
    pub fn new(options: DocumentOptions, state: Arc<StateStore>, probe: ProbeFn) -> Self {
        let document = RemoteDocument::open(
            "sponsorship",
            options.local_dir.join(SPONSORSHIP_CACHE_FILE),
            SPONSORSHIP_STATE_KEY,
            state,
            FailurePolicy::KeepUpdatedAt,
            CorruptCache::Debug,
        );
        let inner = Arc::new(Inner {
            options,
            document,
            probe,
        });

        let job = Arc::clone(&inner);
        let refresh = BackgroundRefresh::spawn(REFRESH_THREAD_NAME, move || {
            let outcome = job.refresh();
            debug!(?outcome, "Sponsorship refresh finished");
        });

        Self { inner, refresh }
    }

    pub fn wait_for_refresh(&self) {
        self.refresh.wait();
    }

    pub fn refresh(&self) -> RefreshOutcome {
        self.inner.refresh()
    }

    pub fn sponsorship_data(&self) -> SponsorshipData {
        self.inner.document.data()
    }

    pub fn total_monthly_income(&self) -> f64 {
        self.inner
            .document
            .with(|data, _| data.total_monthly_average_income)
    }

    pub fn total_sponsors(&self) -> i64 {
        self.inner.document.with(|data, _| data.total_sponsors())
    }

    /// True once the update interval has passed since the last download.
    pub fn is_data_stale(&self) -> bool {
        let now = (self.inner.options.clock)();
        self.inner.document.with(|_, state| {
            is_due(state.updated_at, self.inner.options.update_interval, now)
        })
    }
}

impl std::fmt::Debug for SponsorshipManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SponsorshipManager")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
