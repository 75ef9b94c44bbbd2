use super::*;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn entry(name: &str, time: &str, repeat_secs: u64) -> ScheduleEntry {
    ScheduleEntry {
        name: name.to_string(),
        time: ts(time),
        repeat: Duration::from_secs(repeat_secs),
        command: Command::new("host", "save"),
        annotation: None,
    }
}

#[test]
fn entries_stay_time_sorted() {
    let mut list = ScheduleList::new();
    list.add(entry("b", "2026-05-01T12:00:00Z", 0));
    list.add(entry("a", "2026-05-01T08:00:00Z", 0));

    let names: Vec<_> = list.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn sweep_fires_nothing_before_due_time() {
    let mut list = ScheduleList::new();
    list.add(entry("later", "2026-05-01T12:00:00Z", 0));

    assert!(list.sweep(ts("2026-05-01T11:59:59Z")).is_empty());
    // exactly at the firing instant: not yet (fires once the time has passed)
    assert!(list.sweep(ts("2026-05-01T12:00:00Z")).is_empty());
}

#[test]
fn one_shot_entry_removed_after_firing() {
    let mut list = ScheduleList::new();
    list.add(entry("once", "2026-05-01T12:00:00Z", 0));

    let fired = list.sweep(ts("2026-05-01T12:00:01Z"));

    assert_eq!(fired.len(), 1);
    assert!(list.is_empty());
}

#[test]
fn repeating_entry_advances_past_now_once_per_sweep() {
    let mut list = ScheduleList::new();
    // created 3 days in the past with a 24h repeat
    list.add(entry("daily", "2026-05-01T08:00:00Z", 24 * 3600));
    let now = ts("2026-05-04T08:00:00Z");

    let fired = list.sweep(now);

    // executed once; the time advancement skipped the missed occurrences
    assert_eq!(fired.len(), 1);
    assert_eq!(list.entries()[0].time, ts("2026-05-04T08:00:00Z"));
    assert!(list.entries()[0].time >= now);
}

#[test]
fn repeating_entry_never_lands_in_the_past() {
    let mut list = ScheduleList::new();
    list.add(entry("hourly", "2026-05-01T00:00:00Z", 3600));
    let now = ts("2026-05-03T13:37:42Z");

    list.sweep(now);

    assert!(list.entries()[0].time >= now);
}

#[test]
fn sweep_fires_multiple_due_entries() {
    let mut list = ScheduleList::new();
    list.add(entry("a", "2026-05-01T08:00:00Z", 0));
    list.add(entry("b", "2026-05-01T09:00:00Z", 0));
    list.add(entry("c", "2026-05-01T12:00:00Z", 0));

    let fired = list.sweep(ts("2026-05-01T10:00:00Z"));

    let names: Vec<_> = fired.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(list.entries().len(), 1);
}

#[test]
fn remove_by_name() {
    let mut list = ScheduleList::new();
    list.add(entry("keep", "2026-05-01T08:00:00Z", 0));
    list.add(entry("drop", "2026-05-01T09:00:00Z", 0));

    assert_eq!(list.remove("drop"), 1);
    assert_eq!(list.remove("drop"), 0);
    assert_eq!(list.entries().len(), 1);
}

#[test]
fn next_wake_is_earliest_entry_or_one_second() {
    let mut list = ScheduleList::new();
    let now = ts("2026-05-01T10:00:00Z");
    assert_eq!(list.next_wake(now), now + chrono::Duration::seconds(1));

    list.add(entry("later", "2026-05-01T12:00:00Z", 0));
    assert_eq!(list.next_wake(now), ts("2026-05-01T12:00:00Z"));
}

#[test]
fn entry_round_trips_with_human_readable_repeat() {
    let item = entry("daily", "2026-05-01T08:00:00Z", 24 * 3600);
    let json = serde_json::to_string(&item).unwrap();
    assert!(json.contains("1day"));

    let back: ScheduleEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back, item);
}
