// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-sensor time-series store with retention folding
//!
//! Readings are keyed by timestamp, each holding one value per subchannel.
//! Retention keeps full resolution for the current and previous day, one
//! folded entry per calendar day up to a year, and nothing beyond that. Folding is idempotent:
//! a day already reduced to a single midnight entry is left alone.

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single reading value: sensors report booleans (motion) or numbers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Number(n) => n,
        }
    }

    pub fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Number(n) => n != 0.0,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// How same-bucket values for a subchannel combine when folding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregationKind {
    /// Instantaneous quantity: overwrite on add, mean (or majority) on fold
    #[default]
    #[serde(rename = "avg")]
    Average,
    /// Monotonic counter: store the delta since the previous raw reading
    #[serde(rename = "sum")]
    Accumulate,
}

/// Per-subchannel descriptor carried in sensor metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubchannelMeta {
    #[serde(rename = "aggrType", default)]
    pub aggregation: AggregationKind,
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One named reading as pushed by a device or an external caller
///
/// This is the wire shape devices send: `{"name": "Temperature",
/// "value": 20.5, "aggrType": "avg", "desc": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingSample {
    pub name: String,
    pub value: Value,
    #[serde(rename = "aggrType", default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationKind>,
    #[serde(rename = "desc", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReadingSample {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            aggregation: None,
            description: None,
        }
    }

    pub fn accumulating(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: Value::Number(value),
            aggregation: Some(AggregationKind::Accumulate),
            description: None,
        }
    }
}

/// Append-only readings for one sensor, timestamp -> (subchannel -> value)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeSeriesStore {
    entries: BTreeMap<DateTime<Utc>, BTreeMap<String, Value>>,
    /// Last raw counter value per accumulating subchannel
    baselines: BTreeMap<String, f64>,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add readings into the bucket at `time`, updating `metadata` from each
    /// sample's descriptor fields.
    ///
    /// `bigger_only` suppresses an averaging value when the bucket already
    /// holds a greater one (duplicate pushes must not lower a recorded peak).
    /// Accumulating subchannels store the delta since the previous raw value;
    /// a raw value below the baseline means the counter reset, so the
    /// baseline clamps to zero and the delta equals the raw value.
    ///
    /// Returns true only if a stored value actually changed, so callers can
    /// skip events and persistence on no-op pushes.
    pub fn add(
        &mut self,
        time: DateTime<Utc>,
        samples: &[ReadingSample],
        bigger_only: bool,
        metadata: &mut BTreeMap<String, SubchannelMeta>,
    ) -> bool {
        let mut changed = false;
        for sample in samples {
            let kind = sample
                .aggregation
                .or_else(|| metadata.get(&sample.name).map(|m| m.aggregation))
                .unwrap_or_default();
            let bucket = self.entries.entry(time).or_default();

            match kind {
                AggregationKind::Average => {
                    let existing = bucket.get(&sample.name).copied();
                    if bigger_only
                        && existing.is_some_and(|v| v.as_f64() > sample.value.as_f64())
                    {
                        tracing::debug!(
                            subchannel = %sample.name,
                            value = sample.value.as_f64(),
                            "skipping reading smaller than recorded value"
                        );
                    } else if existing != Some(sample.value) {
                        bucket.insert(sample.name.clone(), sample.value);
                        changed = true;
                    }
                }
                AggregationKind::Accumulate => {
                    let raw = sample.value.as_f64();
                    let mut baseline = self.baselines.get(&sample.name).copied().unwrap_or(0.0);
                    if baseline > raw {
                        // counter reset (device reboot)
                        baseline = 0.0;
                    }
                    bucket.insert(sample.name.clone(), Value::Number(raw - baseline));
                    self.baselines.insert(sample.name.clone(), raw);
                    changed = true;
                }
            }

            let meta = metadata.entry(sample.name.clone()).or_default();
            if let Some(kind) = sample.aggregation {
                meta.aggregation = kind;
            }
            if let Some(desc) = &sample.description {
                meta.description = Some(desc.clone());
            }
        }

        // drop a bucket created for samples that were all suppressed
        if let Some(bucket) = self.entries.get(&time) {
            if bucket.is_empty() {
                self.entries.remove(&time);
            }
        }
        changed
    }

    /// Enforce the retention invariant relative to `now`.
    ///
    /// Entries older than a year are deleted. Entries before the start of
    /// the previous day fold to a single midnight entry per calendar day,
    /// combined per each subchannel's aggregation policy. A day folds only
    /// once it is complete: the cutoff sits on a midnight boundary, so a
    /// day's readings always fold together in a single pass. Re-running on
    /// folded data is a no-op.
    pub fn archive(&mut self, now: DateTime<Utc>, metadata: &BTreeMap<String, SubchannelMeta>) {
        let year_ago = now
            .checked_sub_months(Months::new(12))
            .unwrap_or(now - Duration::days(365));
        self.entries.retain(|time, _| *time >= year_ago);

        let midnight = Utc
            .from_utc_datetime(&now.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default());
        let cutoff = midnight - Duration::days(1);

        // group foldable timestamps by calendar day
        let mut days: BTreeMap<chrono::NaiveDate, Vec<DateTime<Utc>>> = BTreeMap::new();
        for time in self.entries.keys().filter(|t| **t < cutoff) {
            days.entry(time.date_naive()).or_default().push(*time);
        }

        for (date, times) in days {
            if times.len() == 1 {
                // already folded
                continue;
            }

            let buckets: Vec<BTreeMap<String, Value>> = times
                .iter()
                .filter_map(|t| self.entries.remove(t))
                .collect();

            let mut names: Vec<&String> = buckets.iter().flat_map(|b| b.keys()).collect();
            names.sort();
            names.dedup();

            let mut folded = BTreeMap::new();
            for name in names {
                let values: Vec<Value> =
                    buckets.iter().filter_map(|b| b.get(name)).copied().collect();
                let kind = metadata.get(name).map(|m| m.aggregation).unwrap_or_default();
                folded.insert(name.clone(), combine(&values, kind));
            }

            let midnight = Utc
                .from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default());
            self.entries.insert(midnight, folded);
        }
    }

    /// Timestamp of the most recent bucket
    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.entries.keys().next_back().copied()
    }

    /// The most recent bucket's values
    pub fn latest(&self) -> Option<&BTreeMap<String, Value>> {
        self.entries.values().next_back()
    }

    /// Subchannel names present in the latest bucket (not global history)
    pub fn sub_names(&self) -> Vec<String> {
        self.latest()
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn entries(&self) -> &BTreeMap<DateTime<Utc>, BTreeMap<String, Value>> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn combine(values: &[Value], kind: AggregationKind) -> Value {
    let boolean = matches!(values.first(), Some(Value::Bool(_)));
    match (kind, boolean) {
        (AggregationKind::Average, true) => {
            let set = values.iter().filter(|v| v.truthy()).count();
            Value::Bool(set * 2 >= values.len())
        }
        (AggregationKind::Average, false) => {
            let sum: f64 = values.iter().map(|v| v.as_f64()).sum();
            Value::Number(sum / values.len() as f64)
        }
        (AggregationKind::Accumulate, true) => Value::Bool(values.iter().any(|v| v.truthy())),
        (AggregationKind::Accumulate, false) => {
            Value::Number(values.iter().map(|v| v.as_f64()).sum())
        }
    }
}

#[cfg(test)]
#[path = "timeseries_tests.rs"]
mod tests;
