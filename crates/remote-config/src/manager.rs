//! Notifications and ticker tips from the published remote-config document.

use crate::document::{
    system_clock, BackgroundRefresh, Clock, CorruptCache, DocumentSource, FailurePolicy,
    RefreshOutcome, RemoteDocument,
};
use crate::sponsorship::appreciation_text;
use crate::sponsorship_manager::SponsorshipManager;
use crate::state::{is_due, RemoteConfigState, REMOTE_CONFIG_STATE_KEY};
use crate::types::{Message, Remote, RemoteConfigData, Ticker};
use crate::ui::UiSink;
use crate::version::{parse_version, VersionConstraint};
use ddev_config_and_utils::{GlobalConfig, Paths, ProbeFn, DDEV_VERSION};
use semver::Version;
use state_store::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hours between downloads when neither the local config nor the document set one.
pub const DEFAULT_UPDATE_INTERVAL_HOURS: i64 = 6;
/// Hours between ticker tips when neither the local config nor the document set one.
pub const DEFAULT_TICKER_INTERVAL_HOURS: i64 = 4;

pub const REMOTE_CONFIG_CACHE_FILE: &str = ".remote-config";

const REFRESH_THREAD_NAME: &str = "ddev-remote-config-refresh";

#[derive(Clone)]
pub struct RemoteConfigOptions {
    /// Directory holding `.remote-config`.
    pub local_dir: PathBuf,
    /// Default GitHub location, used until a document names its own.
    pub remote: Remote,
    /// Overrides both `remote` and the document's own location.
    pub source: Option<DocumentSource>,
    pub github_api_base: Option<String>,
    /// Local override in hours; 0 defers to the document.
    pub update_interval: i64,
    /// Local override in hours; 0 defers to the document.
    pub ticker_interval: i64,
    pub ticker_disabled: bool,
    pub ddev_version: String,
    pub clock: Clock,
}

impl RemoteConfigOptions {
    pub fn new(local_dir: impl Into<PathBuf>) -> Self {
        Self {
            local_dir: local_dir.into(),
            remote: Remote::new("ddev", "remote-config", "main", "remote-config.jsonc"),
            source: None,
            github_api_base: None,
            update_interval: 0,
            ticker_interval: 0,
            ticker_disabled: false,
            ddev_version: DDEV_VERSION.to_string(),
            clock: system_clock(),
        }
    }

    /// Options from the `remote_config` block of the global config.
    pub fn from_global_config(config: &GlobalConfig, paths: &Paths) -> Self {
        let settings = &config.remote_config;
        let mut options = Self::new(paths.base_dir().clone());
        options.update_interval = settings.update_interval;
        options.ticker_interval = settings.ticker_interval;
        options.ticker_disabled = settings.ticker_disabled;
        if !settings.url.is_empty() {
            options.source = Some(DocumentSource::Url(settings.url.clone()));
        }
        options
    }

    pub fn cache_file(&self) -> PathBuf {
        self.local_dir.join(REMOTE_CONFIG_CACHE_FILE)
    }
}

impl std::fmt::Debug for RemoteConfigOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfigOptions")
            .field("local_dir", &self.local_dir)
            .field("remote", &self.remote)
            .field("source", &self.source)
            .field("update_interval", &self.update_interval)
            .field("ticker_interval", &self.ticker_interval)
            .field("ticker_disabled", &self.ticker_disabled)
            .field("ddev_version", &self.ddev_version)
            .finish_non_exhaustive()
    }
}

struct Inner {
    options: RemoteConfigOptions,
    document: RemoteDocument<RemoteConfigData, RemoteConfigState>,
    probe: ProbeFn,
}

impl Inner {
    fn refresh(&self) -> RefreshOutcome {
        let now = (self.options.clock)();
        self.document.refresh(
            &self.probe,
            |data| resolve_update_interval(self.options.update_interval, data),
            |data| self.source_for(data).downloader(),
            now,
        )
    }

    fn source_for(&self, data: &RemoteConfigData) -> DocumentSource {
        if let Some(source) = &self.options.source {
            return source.clone();
        }
        let remote = if data.remote.is_complete() {
            data.remote.clone()
        } else {
            self.options.remote.clone()
        };
        DocumentSource::Github {
            remote,
            api_base: self.options.github_api_base.clone(),
        }
    }
}

/// Keeps the remote-config document fresh and shows its messages.
///
/// Construction never touches the network on the calling thread: the first
/// refresh runs on a background thread, and until it completes (or when it
/// fails) the copy from `.remote-config` is served.
pub struct RemoteConfig {
    inner: Arc<Inner>,
    ui: Arc<dyn UiSink>,
    refresh: BackgroundRefresh,
}

impl RemoteConfig {
    pub fn new(
        options: RemoteConfigOptions,
        state: Arc<StateStore>,
        probe: ProbeFn,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        let document = RemoteDocument::open(
            "remote-config",
            options.cache_file(),
            REMOTE_CONFIG_STATE_KEY,
            state,
            FailurePolicy::AdvanceUpdatedAt,
            CorruptCache::Warn,
        );
        let inner = Arc::new(Inner {
            options,
            document,
            probe,
        });

        let job = Arc::clone(&inner);
        let refresh = BackgroundRefresh::spawn(REFRESH_THREAD_NAME, move || {
            let outcome = job.refresh();
            debug!(?outcome, "Remote config refresh finished");
        });

        Self { inner, ui, refresh }
    }

    /// Block until the construction-time refresh has finished.
    pub fn wait_for_refresh(&self) {
        self.refresh.wait();
    }

    /// Refresh on the calling thread, subject to the usual gating.
    pub fn refresh(&self) -> RefreshOutcome {
        self.inner.refresh()
    }

    pub fn data(&self) -> RemoteConfigData {
        self.inner.document.data()
    }

    pub fn state(&self) -> RemoteConfigState {
        self.inner.document.with(|_, state| state.clone())
    }

    /// Effective refresh interval in hours.
    pub fn update_interval(&self) -> i64 {
        self.inner
            .document
            .with(|data, _| resolve_update_interval(self.inner.options.update_interval, data))
    }

    /// Effective ticker interval in hours, `None` when the ticker is disabled.
    pub fn ticker_interval(&self) -> Option<i64> {
        self.inner
            .document
            .with(|data, _| self.resolve_ticker_interval(data.effective_ticker()))
    }

    /// Show every warning, then every info, whose version constraint the
    /// running DDEV version satisfies.
    pub fn show_notifications(&self) {
        let version = match parse_version(&self.inner.options.ddev_version) {
            Ok(version) => version,
            Err(err) => {
                warn!(error = %err, "Unable to parse DDEV version, skipping notifications");
                return;
            }
        };
        let now = (self.inner.options.clock)();

        self.inner.document.update_state(|data, state| {
            let notifications = &data.messages.notifications;
            for message in &notifications.warnings {
                if version_allows(message, Some(&version)) {
                    self.ui.warning(&message.render());
                }
            }
            for message in &notifications.infos {
                if version_allows(message, Some(&version)) {
                    self.ui.success(&message.render());
                }
            }
            state.last_notification_at = now;
            true
        });
    }

    /// Show the next ticker tip if the ticker interval has elapsed.
    pub fn show_ticker(&self) {
        let version = parse_version(&self.inner.options.ddev_version)
            .map_err(|err| debug!(error = %err, "Unable to parse DDEV version for ticker"))
            .ok();
        let now = (self.inner.options.clock)();

        self.inner.document.update_state(|data, state| {
            let ticker = data.effective_ticker();
            let Some(interval) = self.resolve_ticker_interval(ticker) else {
                return false;
            };
            if !is_due(state.last_ticker_at, interval, now) || ticker.messages.is_empty() {
                return false;
            }

            let len = ticker.messages.len() as i64;
            let start = state.last_ticker_message.rem_euclid(len);
            for offset in 0..len {
                let index = (start + offset) % len;
                let message = &ticker.messages[index as usize];
                if !version_allows(message, version.as_ref()) {
                    continue;
                }
                self.ui.success(&message.render());
                state.last_ticker_message = index + 1;
                state.last_ticker_at = now;
                return true;
            }
            false
        });
    }

    /// Thank sponsors using the sponsorship document. Returns whether
    /// anything was shown.
    pub fn show_sponsorship_appreciation(&self, sponsorship: &SponsorshipManager) -> bool {
        let data = sponsorship.sponsorship_data();
        let text = if !data.appreciation_message.trim().is_empty() {
            data.appreciation_message.clone()
        } else if data.total_monthly_average_income > 0.0 {
            appreciation_text(data.total_monthly_average_income, data.total_sponsors())
        } else {
            return false;
        };

        self.ui.success(&text);
        let now = (self.inner.options.clock)();
        self.inner.document.update_state(|_, state| {
            state.last_sponsorship_at = now;
            true
        });
        true
    }

    /// Whether a ticker interval has passed since the last appreciation.
    pub fn sponsorship_appreciation_due(&self) -> bool {
        let now = (self.inner.options.clock)();
        self.inner.document.with(|data, state| {
            self.resolve_ticker_interval(data.effective_ticker())
                .is_some_and(|interval| is_due(state.last_sponsorship_at, interval, now))
        })
    }

    fn resolve_ticker_interval(&self, ticker: &Ticker) -> Option<i64> {
        let options = &self.inner.options;
        if options.ticker_disabled || ticker.disabled {
            return None;
        }
        if options.ticker_interval > 0 {
            return Some(options.ticker_interval);
        }
        match ticker.interval {
            i if i < 0 => None,
            0 => Some(DEFAULT_TICKER_INTERVAL_HOURS),
            i => Some(i),
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("options", &self.inner.options)
            .field("document", &self.inner.document)
            .finish_non_exhaustive()
    }
}

fn resolve_update_interval(local: i64, data: &RemoteConfigData) -> i64 {
    if local > 0 {
        local
    } else if data.update_interval > 0 {
        data.update_interval
    } else {
        DEFAULT_UPDATE_INTERVAL_HOURS
    }
}

/// Messages without a constraint always pass; an unparseable constraint or
/// an unknown running version never does.
fn version_allows(message: &Message, version: Option<&Version>) -> bool {
    if message.versions.trim().is_empty() {
        return true;
    }
    let Some(version) = version else {
        return false;
    };
    match VersionConstraint::parse(&message.versions) {
        Ok(constraint) => constraint.matches(version),
        Err(err) => {
            debug!(error = %err, "Skipping message with invalid version constraint");
            false
        }
    }
}
