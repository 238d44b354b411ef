mod common;

use chrono::Duration;
use common::{online, remote_config, start_time, store, ManualClock, StaticDownloader};
use remote_config::{
    AddonManager, DocumentOptions, DocumentSource, RefreshOutcome, SponsorshipManager,
    UiLevel, ADDON_CACHE_FILE, DEFAULT_SPONSORSHIP_UPDATE_INTERVAL_HOURS,
};
use std::sync::Arc;
use tempfile::tempdir;

const SPONSORSHIP: &str = r#"{
  "github_ddev_sponsorships": {"total_monthly_sponsorship": 2000, "total_sponsors": 50},
  "github_rfay_sponsorships": {"total_monthly_sponsorship": 100, "total_sponsors": 5},
  "monthly_invoiced_sponsorships": {"total_monthly_sponsorship": 700, "total_sponsors": 4},
  "annual_invoiced_sponsorships": {"total_sponsors": 1},
  "total_monthly_average_income": 2800.4,
  "updated_datetime": "2025-05-31T00:00:00Z"
}"#;

fn sponsorship(
    dir: &std::path::Path,
    downloader: &Arc<StaticDownloader>,
    clock: &ManualClock,
) -> SponsorshipManager {
    let mut options = DocumentOptions::sponsorship(dir);
    options.source = DocumentSource::Custom(downloader.clone());
    options.clock = clock.clock();
    let manager = SponsorshipManager::new(options, store(dir), online());
    manager.wait_for_refresh();
    manager
}

#[test]
fn test_sponsorship_totals() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(SPONSORSHIP);
    let clock = ManualClock::new(start_time());
    let manager = sponsorship(dir.path(), &downloader, &clock);

    assert_eq!(manager.total_monthly_income(), 2800.4);
    assert_eq!(manager.total_sponsors(), 60);
    assert!(!manager.is_data_stale());

    clock.advance(Duration::hours(DEFAULT_SPONSORSHIP_UPDATE_INTERVAL_HOURS));
    assert!(manager.is_data_stale());
}

#[test]
fn test_sponsorship_failure_retries_next_time() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::failing();
    let clock = ManualClock::new(start_time());
    let manager = sponsorship(dir.path(), &downloader, &clock);

    assert_eq!(downloader.calls(), 1);
    assert!(manager.is_data_stale());

    downloader.set_body(SPONSORSHIP);
    assert_eq!(manager.refresh(), RefreshOutcome::Updated);
    assert_eq!(downloader.calls(), 2);
    assert_eq!(manager.total_sponsors(), 60);
}

#[test]
fn test_appreciation_uses_published_message() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(start_time());
    let sponsor_source = StaticDownloader::new(
        r#"{"sponsor_appreciation_message": "Thank you, sponsors!", "total_monthly_average_income": 9000}"#,
    );
    let sponsors = sponsorship(dir.path(), &sponsor_source, &clock);
    let config_source = StaticDownloader::new("{}");
    let (manager, ui) = remote_config(dir.path(), &config_source, "v1.24.0", &clock);

    assert!(manager.sponsorship_appreciation_due());
    assert!(manager.show_sponsorship_appreciation(&sponsors));

    let lines = ui.lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].level, UiLevel::Success);
    assert_eq!(lines[0].text, "Thank you, sponsors!");
    assert_eq!(manager.state().last_sponsorship_at, clock.now());
    assert!(!manager.sponsorship_appreciation_due());
}

#[test]
fn test_appreciation_falls_back_to_tiered_text() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(start_time());
    let sponsor_source = StaticDownloader::new(SPONSORSHIP);
    let sponsors = sponsorship(dir.path(), &sponsor_source, &clock);
    let config_source = StaticDownloader::new("{}");
    let (manager, ui) = remote_config(dir.path(), &config_source, "v1.24.0", &clock);

    assert!(manager.show_sponsorship_appreciation(&sponsors));
    assert!(ui.texts()[0]
        .starts_with("DDEV is growing strong with $2800/month from 60 generous sponsors!"));
}

#[test]
fn test_no_appreciation_without_data() {
    let dir = tempdir().unwrap();
    let clock = ManualClock::new(start_time());
    let sponsors = sponsorship(dir.path(), &StaticDownloader::failing(), &clock);
    let (manager, ui) = remote_config(dir.path(), &StaticDownloader::new("{}"), "v1.24.0", &clock);

    assert!(!manager.show_sponsorship_appreciation(&sponsors));
    assert!(ui.lines().is_empty());
}

#[test]
fn test_addon_manager_downloads_and_finds() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(
        r#"{"total_addons_count": 2, "addons": [
            {"user": "ddev", "repo": "ddev-redis", "tag_name": "v2.1.0", "type": "official"},
            {"user": "someone", "repo": "ddev-thing", "tag_name": 20250101, "type": "contrib"}
        ]}"#,
    );
    let mut options = DocumentOptions::addons(dir.path());
    options.source = DocumentSource::Custom(downloader.clone());
    let manager = AddonManager::new(options.clone(), store(dir.path()), online());
    manager.wait_for_refresh();

    assert_eq!(manager.addon_data().total_addons_count, 2);
    assert_eq!(manager.find_addon("someone/ddev-thing").unwrap().tag_name.as_str(), "20250101");
    assert!(manager.find_addon("ddev/ddev-missing").is_none());
    assert!(dir.path().join(ADDON_CACHE_FILE).exists());

    let reopened = AddonManager::new(options, store(dir.path()), online());
    reopened.wait_for_refresh();
    assert_eq!(downloader.calls(), 1);
    assert_eq!(reopened.find_addon("ddev/ddev-redis").unwrap().addon_type, "official");
}
