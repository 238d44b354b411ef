//! Internet reachability probe.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::net::ToSocketAddrs;
use std::sync::mpsc;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;

/// Injected `() -> bool` answering "is the internet reachable right now?".
pub type ProbeFn = Arc<dyn Fn() -> bool + Send + Sync>;

type Resolver = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Checks connectivity by resolving a random `*.ddev.site` name.
///
/// `ddev.site` has a wildcard DNS record, so any name resolves when DNS
/// works. The result is computed at most once per probe instance.
pub struct InternetProbe {
    timeout: Duration,
    resolver: Resolver,
    result: OnceLock<bool>,
}

impl InternetProbe {
    pub fn new(timeout_ms: u64) -> Self {
        Self::with_resolver(timeout_ms, |host| {
            (host, 80)
                .to_socket_addrs()
                .map(|mut addrs| addrs.next().is_some())
                .unwrap_or(false)
        })
    }

    /// Probe with a custom lookup function (used by tests).
    pub fn with_resolver<F>(timeout_ms: u64, resolver: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            resolver: Arc::new(resolver),
            result: OnceLock::new(),
        }
    }

    /// Whether DNS resolution succeeded within the timeout.
    pub fn is_active(&self) -> bool {
        *self.result.get_or_init(|| self.check())
    }

    /// Convert into the shared function form consumed by the managers.
    pub fn into_probe_fn(self) -> ProbeFn {
        let probe = Arc::new(self);
        Arc::new(move || probe.is_active())
    }

    /// Probe that always answers `value`.
    pub fn fixed(value: bool) -> ProbeFn {
        Arc::new(move || value)
    }

    fn check(&self) -> bool {
        let host = random_host();
        let (tx, rx) = mpsc::channel();
        let resolver = Arc::clone(&self.resolver);
        let lookup_host = host.clone();

        let spawned = std::thread::Builder::new()
            .name("ddev-internet-probe".to_string())
            .spawn(move || {
                let _ = tx.send(resolver(&lookup_host));
            });

        let active = match spawned {
            Ok(_) => rx.recv_timeout(self.timeout).unwrap_or(false),
            Err(e) => {
                debug!(error = %e, "could not spawn internet probe thread");
                false
            }
        };

        debug!(
            host = %host,
            active,
            timeout_ms = self.timeout.as_millis() as u64,
            "internet reachability checked"
        );
        active
    }
}

fn random_host() -> String {
    let label: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{label}.ddev.site")
}
