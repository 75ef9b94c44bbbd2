use super::*;
use hearth_adapters::{FakeAlertAdapter, FakeFrameSource};
use hearth_core::{CameraAddress, CameraState, ReadingSample, SensorKind, SensorState};
use tempfile::TempDir;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn cfg(dir: &TempDir) -> HubConfig {
    HubConfig {
        evidence_dir: dir.path().to_path_buf(),
        ..HubConfig::default() // start_delay 15m, send_interval 5m
    }
}

fn registry_with_camera() -> (DeviceRegistry, CameraAddress) {
    let mut registry = DeviceRegistry::new();
    let address = CameraAddress::Device(0);
    registry
        .add_camera(CameraState::new("porch", address.clone()))
        .unwrap();
    (registry, address)
}

fn report_motion(registry: &mut DeviceRegistry, now: DateTime<Utc>) {
    if registry.sensor("pir").is_none() {
        registry
            .add_sensor(SensorState::new("pir", "", SensorKind::Wifi))
            .unwrap();
    }
    for sensor in registry.sensors_mut() {
        sensor.add_data(now, &[ReadingSample::new("Motion", true)], false, now);
    }
}

fn armed_monitor(config: &HubConfig, now: DateTime<Utc>) -> SecurityMonitor {
    let mut monitor = SecurityMonitor::new();
    let output = monitor.set_enabled(true, now, to_chrono(config.start_delay));
    assert!(output.changed);
    assert!(output
        .events
        .contains(&Event::SecurityToggled { enabled: true }));
    monitor
}

#[tokio::test]
async fn disarmed_monitor_ignores_motion() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, _) = registry_with_camera();
    let frames = FakeFrameSource::new();
    let notify = FakeAlertAdapter::new();
    let mut monitor = SecurityMonitor::new();

    let now = ts("2026-05-01T10:00:00Z");
    report_motion(&mut registry, now);
    let out = monitor.tick(now, &mut registry, &config, &frames, &notify).await;
    assert!(!out.changed);
    assert!(out.events.is_empty());
    assert_eq!(monitor.state().phase(), AlarmPhase::Disarmed);
}

#[tokio::test]
async fn motion_inside_the_grace_period_does_not_trigger() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, _) = registry_with_camera();
    let frames = FakeFrameSource::new();
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    let now = ts("2026-05-01T10:10:00Z");
    report_motion(&mut registry, now);
    let out = monitor.tick(now, &mut registry, &config, &frames, &notify).await;
    assert!(out.events.is_empty());
    assert_eq!(monitor.state().phase(), AlarmPhase::Waiting);
}

#[tokio::test]
async fn motion_after_the_grace_period_triggers_exactly_once() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, address) = registry_with_camera();
    let frames = FakeFrameSource::new();
    frames.push_frame(&address, FakeFrameSource::flat_frame(100));
    frames.push_frame(&address, FakeFrameSource::flat_frame(100));
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    let now = ts("2026-05-01T10:16:00Z");
    report_motion(&mut registry, now);
    let out = monitor.tick(now, &mut registry, &config, &frames, &notify).await;
    assert_eq!(out.events, vec![Event::AlarmActivated]);
    assert_eq!(monitor.state().phase(), AlarmPhase::Triggered);

    // still-true motion signal on the next tick does not re-emit
    let out = monitor
        .tick(ts("2026-05-01T10:16:30Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert!(out.events.is_empty());
}

#[tokio::test]
async fn first_evidence_save_includes_the_baseline() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, address) = registry_with_camera();
    let frames = FakeFrameSource::new();
    frames.push_frame(&address, FakeFrameSource::flat_frame(100)); // baseline
    frames.push_frame(&address, FakeFrameSource::flat_frame(200)); // movement
    frames.push_frame(&address, FakeFrameSource::flat_frame(200)); // settled
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    report_motion(&mut registry, ts("2026-05-01T10:16:00Z"));
    monitor
        .tick(ts("2026-05-01T10:16:00Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert!(!monitor.state().has_evidence()); // baseline only

    monitor
        .tick(ts("2026-05-01T10:16:30Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert_eq!(monitor.state().evidence_count("porch"), 2);
    assert!(dir.path().join("porch0.jpg").exists());
    assert!(dir.path().join("porch1.jpg").exists());

    // an unchanged frame adds nothing
    monitor
        .tick(ts("2026-05-01T10:17:00Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert_eq!(monitor.state().evidence_count("porch"), 2);
}

#[tokio::test]
async fn successful_delivery_clears_evidence_and_rearms() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, address) = registry_with_camera();
    let frames = FakeFrameSource::new();
    for intensity in [100, 200, 200] {
        frames.push_frame(&address, FakeFrameSource::flat_frame(intensity));
    }
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    report_motion(&mut registry, ts("2026-05-01T10:16:00Z"));
    monitor
        .tick(ts("2026-05-01T10:16:00Z"), &mut registry, &config, &frames, &notify)
        .await;
    monitor
        .tick(ts("2026-05-01T10:16:30Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert_eq!(monitor.state().evidence_count("porch"), 2);

    // past the send interval (triggered at 10:16)
    let out = monitor
        .tick(ts("2026-05-01T10:21:01Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert!(out.changed);
    let calls = notify.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].force);
    assert_eq!(calls[0].files.len(), 2);
    assert_eq!(monitor.state().phase(), AlarmPhase::Waiting);
    assert!(!monitor.state().has_evidence());
    assert!(!dir.path().join("porch0.jpg").exists());
}

#[tokio::test]
async fn failed_delivery_keeps_evidence_for_the_next_interval() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, address) = registry_with_camera();
    let frames = FakeFrameSource::new();
    for intensity in [100, 200, 200, 200] {
        frames.push_frame(&address, FakeFrameSource::flat_frame(intensity));
    }
    let notify = FakeAlertAdapter::new();
    notify.fail_next(1);
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    report_motion(&mut registry, ts("2026-05-01T10:16:00Z"));
    monitor
        .tick(ts("2026-05-01T10:16:00Z"), &mut registry, &config, &frames, &notify)
        .await;
    monitor
        .tick(ts("2026-05-01T10:16:30Z"), &mut registry, &config, &frames, &notify)
        .await;

    monitor
        .tick(ts("2026-05-01T10:21:01Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert_eq!(notify.calls().len(), 1);
    assert_eq!(monitor.state().phase(), AlarmPhase::Triggered);
    assert!(monitor.state().has_evidence());
    assert!(dir.path().join("porch0.jpg").exists());

    // the retry window counts from the failure
    monitor
        .tick(ts("2026-05-01T10:26:02Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert_eq!(notify.calls().len(), 2);
    assert_eq!(monitor.state().phase(), AlarmPhase::Waiting);
    assert!(!monitor.state().has_evidence());
}

#[tokio::test]
async fn offline_camera_is_suspicious_even_without_evidence() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, _) = registry_with_camera();
    let frames = FakeFrameSource::new(); // every grab fails
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    report_motion(&mut registry, ts("2026-05-01T10:16:00Z"));
    monitor
        .tick(ts("2026-05-01T10:16:00Z"), &mut registry, &config, &frames, &notify)
        .await;

    monitor
        .tick(ts("2026-05-01T10:21:01Z"), &mut registry, &config, &frames, &notify)
        .await;
    let calls = notify.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].force);
    assert!(calls[0].files.is_empty());
    assert!(calls[0].message.contains("porch"));
    assert_eq!(monitor.state().phase(), AlarmPhase::Waiting);
}

#[tokio::test]
async fn quiet_send_window_skips_and_rearms() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let mut registry = DeviceRegistry::new(); // no cameras at all
    let frames = FakeFrameSource::new();
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    report_motion(&mut registry, ts("2026-05-01T10:16:00Z"));
    monitor
        .tick(ts("2026-05-01T10:16:00Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert_eq!(monitor.state().phase(), AlarmPhase::Triggered);

    monitor
        .tick(ts("2026-05-01T10:21:01Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert!(notify.calls().is_empty());
    assert_eq!(monitor.state().phase(), AlarmPhase::Waiting);
    assert!(monitor
        .history()
        .iter()
        .any(|line| line.contains("Skip alert sending")));
}

#[tokio::test]
async fn disarming_deletes_stale_evidence_files() {
    let dir = TempDir::new().unwrap();
    let config = cfg(&dir);
    let (mut registry, address) = registry_with_camera();
    let frames = FakeFrameSource::new();
    frames.push_frame(&address, FakeFrameSource::flat_frame(100));
    frames.push_frame(&address, FakeFrameSource::flat_frame(200));
    let notify = FakeAlertAdapter::new();
    let mut monitor = armed_monitor(&config, ts("2026-05-01T10:00:00Z"));

    report_motion(&mut registry, ts("2026-05-01T10:16:00Z"));
    monitor
        .tick(ts("2026-05-01T10:16:00Z"), &mut registry, &config, &frames, &notify)
        .await;
    monitor
        .tick(ts("2026-05-01T10:16:30Z"), &mut registry, &config, &frames, &notify)
        .await;
    assert!(dir.path().join("porch0.jpg").exists());

    let out = monitor.set_enabled(false, ts("2026-05-01T10:17:00Z"), to_chrono(config.start_delay));
    assert!(out.events.contains(&Event::SecurityToggled { enabled: false }));
    assert_eq!(monitor.state().phase(), AlarmPhase::Disarmed);
    assert!(!dir.path().join("porch0.jpg").exists());
    assert!(!dir.path().join("porch1.jpg").exists());
}
