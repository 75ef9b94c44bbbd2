// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-ordered automation schedule
//!
//! Pure list operations; command execution happens in the engine. The list
//! invariant: entries are time-sorted, one-shot entries disappear after
//! firing, and a repeating entry's time advances past "now" without ever
//! re-firing an instant it already skipped.

use crate::command::Command;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One scheduled automation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub name: String,
    /// Next (or only) firing instant
    pub time: DateTime<Utc>,
    /// Zero means one-shot
    #[serde(with = "humantime_serde", default)]
    pub repeat: Duration,
    pub command: Command,
    /// Display color/label for the UI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl ScheduleEntry {
    pub fn is_one_shot(&self) -> bool {
        self.repeat.is_zero()
    }
}

/// The active schedule, kept time-sorted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleList {
    entries: Vec<ScheduleEntry>,
}

impl ScheduleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, entry: ScheduleEntry) {
        self.entries.push(entry);
        self.sort();
    }

    /// Remove all entries with the given name; returns how many were removed
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        before - self.entries.len()
    }

    /// Collect entries due at `now`, advancing repeating entries past `now`
    /// (skipping missed occurrences) and dropping one-shots.
    ///
    /// Each returned entry carries the command to execute, once per sweep
    /// regardless of how many occurrences were missed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
        self.sort();

        let mut fired = Vec::new();
        let mut remove = Vec::new();
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if now <= entry.time {
                break;
            }
            fired.push(entry.clone());

            if entry.is_one_shot() {
                remove.push(index);
            } else if let Ok(repeat) = chrono::Duration::from_std(entry.repeat) {
                while entry.time < now {
                    entry.time += repeat;
                }
            }
        }
        for index in remove.into_iter().rev() {
            self.entries.remove(index);
        }
        self.sort();
        fired
    }

    /// When the scheduler should next look at the list: the earliest entry's
    /// time, or shortly after `now` so a concurrently added entry is picked
    /// up promptly.
    pub fn next_wake(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.entries
            .first()
            .map(|e| e.time)
            .unwrap_or(now + chrono::Duration::seconds(1))
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.time);
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
