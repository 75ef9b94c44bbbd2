// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule time argument parsing tests

use super::parse_time_from;
use chrono::{DateTime, Utc};

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn rfc3339_is_taken_verbatim() {
    let now = ts("2026-05-01T12:00:00Z");
    assert_eq!(
        parse_time_from(now, "2026-06-01T22:30:00Z").unwrap(),
        ts("2026-06-01T22:30:00Z")
    );
}

#[test]
fn date_and_time_without_zone_is_utc() {
    let now = ts("2026-05-01T12:00:00Z");
    assert_eq!(
        parse_time_from(now, "2026-06-01 22:30").unwrap(),
        ts("2026-06-01T22:30:00Z")
    );
}

#[test]
fn bare_time_means_the_next_occurrence() {
    let now = ts("2026-05-01T12:00:00Z");

    // Later today
    assert_eq!(
        parse_time_from(now, "22:30").unwrap(),
        ts("2026-05-01T22:30:00Z")
    );

    // Already past today, so tomorrow
    assert_eq!(
        parse_time_from(now, "07:00").unwrap(),
        ts("2026-05-02T07:00:00Z")
    );
}

#[test]
fn garbage_is_rejected() {
    let now = ts("2026-05-01T12:00:00Z");
    assert!(parse_time_from(now, "half past noon").is_err());
    assert!(parse_time_from(now, "").is_err());
}
