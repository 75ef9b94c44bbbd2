use super::*;

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let start = clock.now();

    clock.advance(Duration::minutes(15));
    assert_eq!(clock.now(), start + Duration::minutes(15));
}

#[test]
fn fake_clock_set_overrides() {
    let clock = FakeClock::new();
    let target = "2026-03-01T12:00:00Z".parse().unwrap();

    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();

    clock.advance(Duration::hours(1));
    assert_eq!(clock.now(), other.now());
}
