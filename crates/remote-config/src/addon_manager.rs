use crate::addon::{Addon, AddonData};
use crate::document::{
    BackgroundRefresh, CorruptCache, DocumentOptions, DocumentSource, FailurePolicy,
    RefreshOutcome, RemoteDocument,
};
use crate::state::{DocumentState, ADDON_STATE_KEY};
use ddev_config_and_utils::{GlobalConfig, Paths, ProbeFn};
use state_store::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_ADDON_UPDATE_INTERVAL_HOURS: i64 = 24;
pub const DEFAULT_ADDON_DATA_URL: &str = "https://addons.ddev.com/addons.json";
pub const ADDON_CACHE_FILE: &str = ".addon-data";

const REFRESH_THREAD_NAME: &str = "ddev-addon-data-refresh";

impl DocumentOptions {
    pub fn addons(local_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            local_dir,
            DocumentSource::Url(DEFAULT_ADDON_DATA_URL.to_string()),
            DEFAULT_ADDON_UPDATE_INTERVAL_HOURS,
        )
    }

    pub fn addons_from_global_config(config: &GlobalConfig, paths: &Paths) -> Self {
        let mut options = Self::addons(paths.base_dir().clone());
        if !config.remote_config.addon_data_url.is_empty() {
            options.source = DocumentSource::Url(config.remote_config.addon_data_url.clone());
        }
        options
    }
}

struct Inner {
    options: DocumentOptions,
    document: RemoteDocument<AddonData, DocumentState>,
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

/// Keeps the add-on registry fresh for `ddev add-on` lookups.
pub struct AddonManager {
    inner: Arc<Inner>,
    refresh: BackgroundRefresh,
}

impl AddonManager {
    pub fn new(options: DocumentOptions, state: Arc<StateStore>, probe: ProbeFn) -> Self {
        let document = RemoteDocument::open(
            "addon-data",
            options.local_dir.join(ADDON_CACHE_FILE),
            ADDON_STATE_KEY,
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
            debug!(?outcome, "Add-on data refresh finished");
        });

        Self { inner, refresh }
    }

    pub fn wait_for_refresh(&self) {
        self.refresh.wait();
    }

    pub fn refresh(&self) -> RefreshOutcome {
        self.inner.refresh()
    }

    pub fn addon_data(&self) -> AddonData {
        self.inner.document.data()
    }

    pub fn find_addon(&self, owner_repo: &str) -> Option<Addon> {
        self.inner
            .document
            .with(|data, _| data.find_addon(owner_repo).cloned())
    }
}

impl std::fmt::Debug for AddonManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonManager")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}
