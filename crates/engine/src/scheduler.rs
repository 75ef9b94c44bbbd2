// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler system: the persisted schedule plus its sweep
//!
//! Command execution happens in the runtime's dispatch table; this system
//! only decides what is due and keeps the list consistent afterwards.

use chrono::{DateTime, Utc};
use hearth_core::{ScheduleEntry, ScheduleList};

#[derive(Debug, Default)]
pub struct Scheduler {
    list: ScheduleList,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_list(list: ScheduleList) -> Self {
        Self { list }
    }

    pub fn list(&self) -> &ScheduleList {
        &self.list
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        self.list.entries()
    }

    pub fn add(&mut self, entry: ScheduleEntry) {
        tracing::info!(name = %entry.name, time = %entry.time, command = %entry.command, "schedule entry added");
        self.list.add(entry);
    }

    pub fn remove(&mut self, name: &str) -> usize {
        let removed = self.list.remove(name);
        if removed > 0 {
            tracing::info!(name, removed, "schedule entries removed");
        }
        removed
    }

    /// Entries due at `now`, each carrying the command to run once
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
        self.list.sweep(now)
    }

    pub fn next_wake(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.list.next_wake(now)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
