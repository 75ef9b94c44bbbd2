use super::*;
use tempfile::TempDir;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn missing_file_loads_empty_document() {
    let dir = TempDir::new().unwrap();
    let file = StateFile::new(dir.path().join("data.json"));

    let document = file.load().unwrap();
    assert!(document.systems.is_empty());
}

#[test]
fn document_blobs_round_trip() {
    let mut document = StateDocument::default();
    document.set("schedule", &vec!["a".to_string(), "b".to_string()]).unwrap();

    let back: Option<Vec<String>> = document.get("schedule").unwrap();
    assert_eq!(back, Some(vec!["a".to_string(), "b".to_string()]));

    let missing: Option<Vec<String>> = document.get("security").unwrap();
    assert!(missing.is_none());
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let file = StateFile::new(dir.path().join("data.json"));
    let now = ts("2026-05-01T10:00:00Z");

    let mut document = StateDocument::default();
    document.set("devices", &42u32).unwrap();
    file.save(&document, now).unwrap();

    let back = file.load().unwrap();
    assert_eq!(back.get::<u32>("devices").unwrap(), Some(42));
}

#[test]
fn save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let file = StateFile::new(dir.path().join("nested/dir/data.json"));

    file.save(&StateDocument::default(), ts("2026-05-01T10:00:00Z"))
        .unwrap();
    assert!(file.path().exists());
}

#[test]
fn backup_rotates_at_most_once_per_day() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    let file = StateFile::new(&path);
    let bak = dir.path().join("data.json.bak");

    let mut document = StateDocument::default();
    document.set("devices", &1u32).unwrap();
    file.save(&document, ts("2026-05-01T10:00:00Z")).unwrap();
    assert!(!bak.exists());

    // second save the same day: backup of the first version appears
    document.set("devices", &2u32).unwrap();
    file.save(&document, ts("2026-05-01T11:00:00Z")).unwrap();
    assert!(bak.exists());
    let backed: StateDocument =
        serde_json::from_str(&std::fs::read_to_string(&bak).unwrap()).unwrap();
    assert_eq!(backed.get::<u32>("devices").unwrap(), Some(1));

    // third save the same day: backup untouched
    document.set("devices", &3u32).unwrap();
    file.save(&document, ts("2026-05-01T12:00:00Z")).unwrap();
    let backed: StateDocument =
        serde_json::from_str(&std::fs::read_to_string(&bak).unwrap()).unwrap();
    assert_eq!(backed.get::<u32>("devices").unwrap(), Some(1));
}

#[test]
fn corrupt_file_is_an_error_not_a_panic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, "{not json").unwrap();

    let file = StateFile::new(&path);
    assert!(matches!(file.load(), Err(StateError::Json(_))));
}
