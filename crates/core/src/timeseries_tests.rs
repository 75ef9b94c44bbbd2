use super::*;
use chrono::NaiveDate;

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn meta() -> BTreeMap<String, SubchannelMeta> {
    BTreeMap::new()
}

#[test]
fn add_stores_reading_in_bucket() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    let time = ts("2026-05-01T10:00:00Z");

    let changed = store.add(
        time,
        &[ReadingSample::new("Temperature", 20.5)],
        false,
        &mut metadata,
    );

    assert!(changed);
    assert_eq!(store.latest_time(), Some(time));
    assert_eq!(
        store.latest().unwrap().get("Temperature"),
        Some(&Value::Number(20.5))
    );
}

#[test]
fn add_identical_value_is_noop() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    let time = ts("2026-05-01T10:00:00Z");
    let samples = [ReadingSample::new("Temperature", 20.5)];

    assert!(store.add(time, &samples, false, &mut metadata));
    assert!(!store.add(time, &samples, false, &mut metadata));
}

#[test]
fn add_bigger_only_keeps_recorded_peak() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    let time = ts("2026-05-01T10:00:00Z");

    store.add(
        time,
        &[ReadingSample::new("Smoke", 80.0)],
        false,
        &mut metadata,
    );
    let changed = store.add(
        time,
        &[ReadingSample::new("Smoke", 40.0)],
        true,
        &mut metadata,
    );

    assert!(!changed);
    assert_eq!(store.latest().unwrap().get("Smoke"), Some(&Value::Number(80.0)));
}

#[test]
fn add_bigger_only_still_accepts_larger_value() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    let time = ts("2026-05-01T10:00:00Z");

    store.add(
        time,
        &[ReadingSample::new("Smoke", 40.0)],
        false,
        &mut metadata,
    );
    let changed = store.add(
        time,
        &[ReadingSample::new("Smoke", 80.0)],
        true,
        &mut metadata,
    );

    assert!(changed);
    assert_eq!(store.latest().unwrap().get("Smoke"), Some(&Value::Number(80.0)));
}

#[test]
fn accumulating_stores_delta_since_baseline() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();

    store.add(
        ts("2026-05-01T10:00:00Z"),
        &[ReadingSample::accumulating("Energy", 100.0)],
        false,
        &mut metadata,
    );
    store.add(
        ts("2026-05-01T10:15:00Z"),
        &[ReadingSample::accumulating("Energy", 130.0)],
        false,
        &mut metadata,
    );

    assert_eq!(
        store.latest().unwrap().get("Energy"),
        Some(&Value::Number(30.0))
    );
}

#[test]
fn accumulating_counter_reset_clamps_baseline_to_zero() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();

    store.add(
        ts("2026-05-01T10:00:00Z"),
        &[ReadingSample::accumulating("Energy", 100.0)],
        false,
        &mut metadata,
    );
    // device rebooted, counter restarted below the baseline
    store.add(
        ts("2026-05-01T10:15:00Z"),
        &[ReadingSample::accumulating("Energy", 7.0)],
        false,
        &mut metadata,
    );

    assert_eq!(
        store.latest().unwrap().get("Energy"),
        Some(&Value::Number(7.0))
    );
}

#[test]
fn add_updates_metadata_from_sample_descriptor() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    let sample = ReadingSample {
        name: "Energy".into(),
        value: Value::Number(5.0),
        aggregation: Some(AggregationKind::Accumulate),
        description: Some("meter".into()),
    };

    store.add(ts("2026-05-01T10:00:00Z"), &[sample], false, &mut metadata);

    let entry = metadata.get("Energy").unwrap();
    assert_eq!(entry.aggregation, AggregationKind::Accumulate);
    assert_eq!(entry.description.as_deref(), Some("meter"));
}

#[test]
fn archive_deletes_entries_older_than_a_year() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    store.add(
        ts("2025-01-01T10:00:00Z"),
        &[ReadingSample::new("Temperature", 5.0)],
        false,
        &mut metadata,
    );

    store.archive(ts("2026-05-01T10:00:00Z"), &metadata);

    assert!(store.is_empty());
}

#[test]
fn archive_folds_old_days_to_one_midnight_entry() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    store.add(
        ts("2026-04-01T09:00:00Z"),
        &[ReadingSample::new("Temperature", 20.0)],
        false,
        &mut metadata,
    );
    store.add(
        ts("2026-04-01T21:00:00Z"),
        &[ReadingSample::new("Temperature", 21.0)],
        false,
        &mut metadata,
    );

    store.archive(ts("2026-05-01T10:30:00Z"), &metadata);

    assert_eq!(store.len(), 1);
    let (time, bucket) = store.entries().iter().next().unwrap();
    assert_eq!(*time, ts("2026-04-01T00:00:00Z"));
    assert_eq!(bucket.get("Temperature"), Some(&Value::Number(20.5)));
}

#[test]
fn archive_keeps_last_day_at_full_resolution() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    let now = ts("2026-05-01T10:30:00Z");
    store.add(
        ts("2026-05-01T09:00:00Z"),
        &[ReadingSample::new("Temperature", 20.0)],
        false,
        &mut metadata,
    );
    store.add(
        ts("2026-05-01T09:15:00Z"),
        &[ReadingSample::new("Temperature", 21.0)],
        false,
        &mut metadata,
    );

    store.archive(now, &metadata);

    assert_eq!(store.len(), 2);
}

#[test]
fn archive_majority_vote_for_booleans() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    for (hour, motion) in [(8, true), (9, false), (10, true)] {
        store.add(
            Utc.from_utc_datetime(
                &NaiveDate::from_ymd_opt(2026, 4, 1)
                    .unwrap()
                    .and_hms_opt(hour, 0, 0)
                    .unwrap(),
            ),
            &[ReadingSample::new("Motion", motion)],
            false,
            &mut metadata,
        );
    }

    store.archive(ts("2026-05-01T10:00:00Z"), &metadata);

    assert_eq!(
        store.latest().unwrap().get("Motion"),
        Some(&Value::Bool(true))
    );
}

#[test]
fn archive_sums_accumulating_subchannels() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    store.add(
        ts("2026-04-01T09:00:00Z"),
        &[ReadingSample::accumulating("Energy", 10.0)],
        false,
        &mut metadata,
    );
    store.add(
        ts("2026-04-01T21:00:00Z"),
        &[ReadingSample::accumulating("Energy", 14.0)],
        false,
        &mut metadata,
    );

    store.archive(ts("2026-05-01T10:00:00Z"), &metadata);

    // deltas 10 and 4 sum to the day's total
    assert_eq!(
        store.latest().unwrap().get("Energy"),
        Some(&Value::Number(14.0))
    );
}

#[test]
fn archive_never_folds_a_partial_day() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    for (time, value) in [
        ("2026-04-01T01:00:00Z", 0.0),
        ("2026-04-01T02:00:00Z", 0.0),
        ("2026-04-01T16:00:00Z", 10.0),
    ] {
        store.add(
            ts(time),
            &[ReadingSample::new("Temperature", value)],
            false,
            &mut metadata,
        );
    }

    // mid-afternoon sweeps on the following day must not touch yesterday
    store.archive(ts("2026-04-02T15:30:00Z"), &metadata);
    assert_eq!(store.len(), 3);
    store.archive(ts("2026-04-02T17:30:00Z"), &metadata);
    assert_eq!(store.len(), 3);

    // once the day leaves the full-resolution window it folds in one pass
    store.archive(ts("2026-04-03T00:30:00Z"), &metadata);
    assert_eq!(store.len(), 1);
    assert_eq!(
        store
            .entries()
            .get(&ts("2026-04-01T00:00:00Z"))
            .and_then(|bucket| bucket.get("Temperature")),
        Some(&Value::Number(10.0 / 3.0))
    );
}

#[test]
fn archive_is_idempotent() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    for hour in [1, 5, 9, 13] {
        store.add(
            Utc.from_utc_datetime(
                &NaiveDate::from_ymd_opt(2026, 4, 2)
                    .unwrap()
                    .and_hms_opt(hour, 0, 0)
                    .unwrap(),
            ),
            &[ReadingSample::new("Temperature", hour as f64)],
            false,
            &mut metadata,
        );
    }
    let now = ts("2026-05-01T10:00:00Z");

    store.archive(now, &metadata);
    let once = store.entries().clone();
    store.archive(now, &metadata);

    assert_eq!(store.entries(), &once);
}

#[test]
fn sub_names_reflect_latest_bucket_only() {
    let mut store = TimeSeriesStore::new();
    let mut metadata = meta();
    store.add(
        ts("2026-05-01T09:00:00Z"),
        &[
            ReadingSample::new("Temperature", 20.0),
            ReadingSample::new("Humidity", 40.0),
        ],
        false,
        &mut metadata,
    );
    store.add(
        ts("2026-05-01T10:00:00Z"),
        &[ReadingSample::new("Temperature", 21.0)],
        false,
        &mut metadata,
    );

    assert_eq!(store.sub_names(), vec!["Temperature".to_string()]);
}

#[test]
fn value_serde_wire_shape() {
    let sample: ReadingSample =
        serde_json::from_str(r#"{"name":"Motion","value":true,"aggrType":"avg"}"#).unwrap();
    assert_eq!(sample.value, Value::Bool(true));
    assert_eq!(sample.aggregation, Some(AggregationKind::Average));

    let json = serde_json::to_string(&ReadingSample::new("Temperature", 20.5)).unwrap();
    assert_eq!(json, r#"{"name":"Temperature","value":20.5}"#);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_day_readings() -> impl Strategy<Value = Vec<(u32, u32, f64)>> {
        // (day offset 2..20, hour, value) all old enough to fold
        proptest::collection::vec((2u32..20, 0u32..24, -50.0f64..150.0), 1..40)
    }

    proptest! {
        #[test]
        fn fold_is_idempotent(readings in arb_day_readings()) {
            let mut store = TimeSeriesStore::new();
            let mut metadata = BTreeMap::new();
            let now: DateTime<Utc> = "2026-05-21T10:00:00Z".parse().unwrap();

            for (day, hour, value) in readings {
                let time = now - Duration::days(day as i64) + Duration::hours(hour as i64);
                store.add(
                    time,
                    &[ReadingSample::new("Temperature", value)],
                    false,
                    &mut metadata,
                );
            }

            store.archive(now, &metadata);
            let once = store.entries().clone();
            store.archive(now, &metadata);

            prop_assert_eq!(store.entries(), &once);
        }
    }
}
