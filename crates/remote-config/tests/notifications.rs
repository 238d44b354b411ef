mod common;

use chrono::Duration;
use common::{remote_config, start_time, ManualClock, StaticDownloader};
use remote_config::{RefreshOutcome, UiLevel, UiLine};
use tempfile::tempdir;

const GATED_WARNING: &str = r#"{
  // hours between downloads
  "update-interval": 10,
  "messages": {
    "notifications": {
      "warnings": [{"message": "upgrade", "versions": ">= 1.20.0"}],
      "infos": []
    }
  }
}"#;

const MIXED: &str = r#"{
  "messages": {
    "notifications": {
      "infos": [
        {"message": "always info"},
        {"message": "new only", "versions": ">=1.23"},
        {"message": "old only", "versions": "<1.23"},
        {"message": "broken", "versions": "not a constraint"},
        {"message": "release notes", "title": "v1.24"}
      ],
      "warnings": [
        {"message": "always warning"},
        {"message": "garbage", "versions": ">= >="}
      ]
    }
  }
}"#;

#[test]
fn test_version_gated_warning_shown() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(GATED_WARNING);
    let clock = ManualClock::new(start_time());
    let (manager, ui) = remote_config(dir.path(), &downloader, "v1.24.0", &clock);

    manager.show_notifications();

    assert_eq!(
        ui.lines(),
        vec![UiLine {
            level: UiLevel::Warning,
            text: "upgrade".to_string()
        }]
    );
}

#[test]
fn test_version_gated_warning_skipped() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(GATED_WARNING);
    let clock = ManualClock::new(start_time());
    let (manager, ui) = remote_config(dir.path(), &downloader, "v1.10.0", &clock);

    manager.show_notifications();

    assert!(ui.lines().is_empty());
}

#[test]
fn test_warnings_first_then_gated_infos() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(MIXED);
    let clock = ManualClock::new(start_time());
    let (manager, ui) = remote_config(dir.path(), &downloader, "v1.24.0", &clock);

    manager.show_notifications();

    let lines = ui.lines();
    assert_eq!(
        ui.texts(),
        vec!["always warning", "always info", "new only", "v1.24: release notes"]
    );
    assert_eq!(lines[0].level, UiLevel::Warning);
    assert!(lines[1..].iter().all(|line| line.level == UiLevel::Success));
}

#[test]
fn test_unconstrained_messages_emitted_once_per_call() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(MIXED);
    let clock = ManualClock::new(start_time());
    let (manager, ui) = remote_config(dir.path(), &downloader, "v1.20.0", &clock);

    manager.show_notifications();
    manager.show_notifications();

    let texts = ui.texts();
    assert_eq!(texts.iter().filter(|t| *t == "always info").count(), 2);
    assert_eq!(texts.iter().filter(|t| *t == "always warning").count(), 2);
    assert_eq!(texts.iter().filter(|t| *t == "old only").count(), 2);
    assert!(!texts.iter().any(|t| t == "broken" || t == "garbage" || t == "new only"));
}

#[test]
fn test_unparseable_running_version_shows_nothing() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(MIXED);
    let clock = ManualClock::new(start_time());
    let (manager, ui) = remote_config(dir.path(), &downloader, "development", &clock);

    manager.show_notifications();

    assert!(ui.lines().is_empty());
}

#[test]
fn test_show_notifications_records_time() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(GATED_WARNING);
    let clock = ManualClock::new(start_time());
    let (manager, _ui) = remote_config(dir.path(), &downloader, "v1.24.0", &clock);

    clock.advance(Duration::minutes(5));
    manager.show_notifications();

    assert_eq!(manager.state().last_notification_at, clock.now());
}

#[test]
fn test_no_network_calls_within_interval() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(GATED_WARNING);
    let clock = ManualClock::new(start_time());
    let (manager, _ui) = remote_config(dir.path(), &downloader, "v1.24.0", &clock);
    assert_eq!(downloader.calls(), 1);
    assert_eq!(manager.update_interval(), 10);

    clock.advance(Duration::hours(9));
    manager.show_notifications();
    manager.show_ticker();
    assert_eq!(manager.refresh(), RefreshOutcome::Fresh);

    let (second, _ui) = remote_config(dir.path(), &downloader, "v1.24.0", &clock);
    second.show_notifications();
    assert_eq!(downloader.calls(), 1);

    clock.advance(Duration::hours(1));
    assert_eq!(second.refresh(), RefreshOutcome::Updated);
    assert_eq!(downloader.calls(), 2);
}

#[test]
fn test_served_from_cache_when_download_fails() {
    let dir = tempdir().unwrap();
    let downloader = StaticDownloader::new(GATED_WARNING);
    let clock = ManualClock::new(start_time());
    drop(remote_config(dir.path(), &downloader, "v1.24.0", &clock));

    clock.advance(Duration::hours(11));
    let failing = StaticDownloader::failing();
    let (manager, ui) = remote_config(dir.path(), &failing, "v1.24.0", &clock);
    assert_eq!(failing.calls(), 1);

    manager.show_notifications();
    assert_eq!(ui.texts(), vec!["upgrade"]);

    // A failed messages download still pushes the next attempt out a full interval.
    assert_eq!(manager.state().updated_at, clock.now());
    assert_eq!(manager.refresh(), RefreshOutcome::Fresh);
    assert_eq!(failing.calls(), 1);
}
