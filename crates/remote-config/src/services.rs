//! Process-wide installation of the managers.
//!
//! Each slot is set at most once. The first `init_*` call builds and installs
//! its manager; later calls return that instance without building anything,
//! so their arguments are ignored.

use crate::addon_manager::AddonManager;
use crate::document::DocumentOptions;
use crate::manager::{RemoteConfig, RemoteConfigOptions};
use crate::sponsorship_manager::SponsorshipManager;
use crate::ui::UiSink;
use ddev_config_and_utils::ProbeFn;
use state_store::StateStore;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Default)]
pub struct Services {
    remote_config: OnceLock<Arc<RemoteConfig>>,
    sponsorship: OnceLock<Arc<SponsorshipManager>>,
    addons: OnceLock<Arc<AddonManager>>,
}

impl Services {
    pub const fn new() -> Self {
        Self {
            remote_config: OnceLock::new(),
            sponsorship: OnceLock::new(),
            addons: OnceLock::new(),
        }
    }

    pub fn init_remote_config(&self, build: impl FnOnce() -> RemoteConfig) -> Arc<RemoteConfig> {
        Arc::clone(self.remote_config.get_or_init(|| Arc::new(build())))
    }

    pub fn remote_config(&self) -> Option<Arc<RemoteConfig>> {
        self.remote_config.get().cloned()
    }

    pub fn init_sponsorship(
        &self,
        build: impl FnOnce() -> SponsorshipManager,
    ) -> Arc<SponsorshipManager> {
        Arc::clone(self.sponsorship.get_or_init(|| Arc::new(build())))
    }

    pub fn sponsorship(&self) -> Option<Arc<SponsorshipManager>> {
        self.sponsorship.get().cloned()
    }

    pub fn init_addons(&self, build: impl FnOnce() -> AddonManager) -> Arc<AddonManager> {
        Arc::clone(self.addons.get_or_init(|| Arc::new(build())))
    }

    pub fn addons(&self) -> Option<Arc<AddonManager>> {
        self.addons.get().cloned()
    }
}

static GLOBAL: Services = Services::new();

pub fn global() -> &'static Services {
    &GLOBAL
}

pub fn init_global(
    options: RemoteConfigOptions,
    state: Arc<StateStore>,
    probe: ProbeFn,
    ui: Arc<dyn UiSink>,
) -> Arc<RemoteConfig> {
    GLOBAL.init_remote_config(|| RemoteConfig::new(options, state, probe, ui))
}

pub fn get_global() -> Option<Arc<RemoteConfig>> {
    GLOBAL.remote_config()
}

pub fn init_global_sponsorship(
    options: DocumentOptions,
    state: Arc<StateStore>,
    probe: ProbeFn,
) -> Arc<SponsorshipManager> {
    GLOBAL.init_sponsorship(|| SponsorshipManager::new(options, state, probe))
}

pub fn get_global_sponsorship() -> Option<Arc<SponsorshipManager>> {
    GLOBAL.sponsorship()
}

pub fn init_global_addons(
    options: DocumentOptions,
    state: Arc<StateStore>,
    probe: ProbeFn,
) -> Arc<AddonManager> {
    GLOBAL.init_addons(|| AddonManager::new(options, state, probe))
}

pub fn get_global_addons() -> Option<Arc<AddonManager>> {
    GLOBAL.addons()
}
