use super::*;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let file = SettingsFile::new(dir.path().join("settings.toml"));

    let config = file.load().unwrap();
    assert_eq!(config.check_interval, 15);
    assert_eq!(config.start_delay, Duration::from_secs(15 * 60));
}

#[test]
fn settings_round_trip() {
    let dir = TempDir::new().unwrap();
    let file = SettingsFile::new(dir.path().join("settings.toml"));

    let mut config = HubConfig::default();
    config.check_interval = 5;
    config.workers = 2;
    config
        .alert_rules
        .insert("Temperature".to_string(), ">30".to_string());
    file.save(&config).unwrap();

    let back = file.load().unwrap();
    assert_eq!(back.check_interval, 5);
    assert_eq!(back.workers, 2);
    assert_eq!(back.alert_rules.get("Temperature").map(String::as_str), Some(">30"));
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "check_interval = 30\n").unwrap();

    let config = SettingsFile::new(&path).load().unwrap();
    assert_eq!(config.check_interval, 30);
    assert_eq!(config.workers, HubConfig::default().workers);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "check_interval = [oops").unwrap();

    assert!(matches!(
        SettingsFile::new(&path).load(),
        Err(SettingsError::Parse(_))
    ));
}
