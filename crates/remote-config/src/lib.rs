//! # remote-config
//!
//! Messages, tips and project data published outside the DDEV release cycle.
//!
//! Three documents are kept locally and refreshed in the background:
//!
//! | Document | Cache file | State key | Source |
//! |---|---|---|---|
//! | [`RemoteConfigData`] | `.remote-config` | `remote_config` | `ddev/remote-config` on GitHub |
//! | [`SponsorshipData`] | `.sponsorship-data` | `sponsorship_data` | `ddev/sponsorship-data` on GitHub |
//! | [`AddonData`] | `.addon-data` | `addon_data` | `addons.ddev.com` |
//!
//! Each one is served from its binary cache immediately; a refresh happens on
//! a background thread once the document's interval has elapsed and the
//! internet probe says we are online. Refresh failures are logged at debug
//! level and never surface to the user.
//!
//! [`RemoteConfig`] shows the version-gated notifications and rotates through
//! the ticker tips. Process-wide instances are installed through
//! [`init_global`] and friends, which install at most once.
//!
//! ```ignore
//! let remote_config = remote_config::init_global(options, state, probe, Arc::new(ConsoleUi::new(true)));
//! remote_config.show_notifications();
//! remote_config.show_ticker();
//! ```

mod addon;
mod addon_manager;
mod document;
mod error;
mod flexible_string;
mod manager;
mod services;
mod sponsorship;
mod sponsorship_manager;
mod state;
mod types;
mod ui;
mod version;

pub use addon::{Addon, AddonData};
pub use addon_manager::{
    AddonManager, ADDON_CACHE_FILE, DEFAULT_ADDON_DATA_URL, DEFAULT_ADDON_UPDATE_INTERVAL_HOURS,
};
pub use document::{
    system_clock, BackgroundRefresh, Clock, CorruptCache, DocumentOptions, DocumentSource,
    FailurePolicy, RefreshOutcome, RemoteDocument,
};
pub use error::{RemoteConfigError, RemoteConfigResult};
pub use flexible_string::FlexibleString;
pub use manager::{
    RemoteConfig, RemoteConfigOptions, DEFAULT_TICKER_INTERVAL_HOURS,
    DEFAULT_UPDATE_INTERVAL_HOURS, REMOTE_CONFIG_CACHE_FILE,
};
pub use services::{
    get_global, get_global_addons, get_global_sponsorship, global, init_global,
    init_global_addons, init_global_sponsorship, Services,
};
pub use sponsorship::{
    appreciation_text, AnnualSponsorship, GitHubSponsorship, InvoicedSponsorship,
    SponsorshipCurrentGoal, SponsorshipData, SponsorshipGoalItem, SponsorshipHistoryEntry,
};
pub use sponsorship_manager::{
    default_sponsorship_source, SponsorshipManager, DEFAULT_SPONSORSHIP_UPDATE_INTERVAL_HOURS,
    SPONSORSHIP_CACHE_FILE,
};
pub use state::{
    is_due, DocumentState, RemoteConfigState, TimestampedState, ADDON_STATE_KEY,
    REMOTE_CONFIG_STATE_KEY, SPONSORSHIP_STATE_KEY,
};
pub use types::{Message, Messages, Notifications, Remote, RemoteConfigData, Ticker};
pub use ui::{ConsoleUi, RecordingUi, UiLevel, UiLine, UiSink};
pub use version::{parse_version, VersionConstraint};
