// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security alarm state machine
//!
//! Pure state; camera I/O and alert delivery are driven by the engine's
//! monitor. Phases: disarmed -> waiting (grace period) -> triggered. Evidence
//! survives failed delivery so the next send interval retries with the same
//! (possibly larger) set; only confirmed delivery resets to waiting.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

/// Bounded history size, matching the persisted log limit
const HISTORY_LIMIT: usize = 500;

/// Observable phase of the alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmPhase {
    Disarmed,
    /// Armed, inside the grace period or watching for motion
    Waiting,
    /// Motion observed; capturing evidence and batching alerts
    Triggered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityState {
    enabled: bool,
    /// Bounded log of arm/trigger/delivery events, persisted
    history: VecDeque<String>,
    #[serde(skip)]
    triggered: bool,
    /// Waiting: end of the grace period. Triggered: start of the current
    /// send-interval window.
    #[serde(skip, default = "default_start_time")]
    start_time: DateTime<Utc>,
    /// Saved evidence frames per camera, awaiting delivery
    #[serde(skip)]
    evidence: BTreeMap<String, Vec<PathBuf>>,
}

fn default_start_time() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

impl Default for SecurityState {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityState {
    pub fn new() -> Self {
        Self {
            enabled: false,
            history: VecDeque::new(),
            triggered: false,
            start_time: default_start_time(),
            evidence: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn phase(&self) -> AlarmPhase {
        if !self.enabled {
            AlarmPhase::Disarmed
        } else if self.triggered {
            AlarmPhase::Triggered
        } else {
            AlarmPhase::Waiting
        }
    }

    /// Arm or disarm. Any change resets the wait clock to `now + start_delay`
    /// and invalidates pending evidence; the returned paths must be deleted
    /// by the caller.
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        now: DateTime<Utc>,
        start_delay: Duration,
    ) -> Vec<PathBuf> {
        if self.enabled == enabled {
            return Vec::new();
        }
        self.enabled = enabled;
        if self.triggered {
            self.log(now, "Alarm deactivated");
        }
        self.log(now, if enabled { "Alarm armed" } else { "Alarm disarmed" });
        self.triggered = false;
        self.start_time = now + start_delay;
        self.drain_evidence()
    }

    /// Restore runtime clocks after loading persisted state
    pub fn rearm(&mut self, now: DateTime<Utc>, start_delay: Duration) {
        self.triggered = false;
        self.start_time = now + start_delay;
    }

    /// Report a motion signal. Returns true exactly when this transitions
    /// waiting -> triggered (the caller emits the AlarmActivated event).
    pub fn on_motion(&mut self, now: DateTime<Utc>) -> bool {
        if !self.enabled || self.triggered || now <= self.start_time {
            return false;
        }
        self.triggered = true;
        self.start_time = now;
        self.log(now, "Alarm activated");
        true
    }

    /// Whether the current send-interval window has elapsed while triggered
    pub fn send_due(&self, now: DateTime<Utc>, send_interval: Duration) -> bool {
        self.triggered && now - self.start_time > send_interval
    }

    pub fn has_evidence(&self) -> bool {
        self.evidence.values().any(|files| !files.is_empty())
    }

    pub fn evidence_count(&self, camera: &str) -> usize {
        self.evidence.get(camera).map_or(0, Vec::len)
    }

    pub fn add_evidence(&mut self, camera: &str, path: PathBuf) {
        self.evidence.entry(camera.to_string()).or_default().push(path);
    }

    pub fn evidence_files(&self) -> Vec<PathBuf> {
        self.evidence.values().flatten().cloned().collect()
    }

    /// Delivery confirmed: clear evidence (returning the files to delete)
    /// and fall back to waiting.
    pub fn delivery_succeeded(
        &mut self,
        now: DateTime<Utc>,
        start_delay: Duration,
    ) -> Vec<PathBuf> {
        self.log(now, "Alert sent");
        self.triggered = false;
        self.start_time = now + start_delay;
        self.drain_evidence()
    }

    /// Delivery failed: keep the evidence and stay triggered; the next
    /// interval retries.
    pub fn delivery_failed(&mut self, now: DateTime<Utc>) {
        self.log(now, "Alert delivery failed");
        self.start_time = now;
    }

    /// Send window elapsed with nothing suspicious: back to waiting
    pub fn skip_delivery(&mut self, now: DateTime<Utc>, start_delay: Duration) {
        self.log(now, "Skip alert sending");
        self.triggered = false;
        self.start_time = now + start_delay;
    }

    pub fn log(&mut self, now: DateTime<Utc>, entry: &str) {
        self.history
            .push_back(format!("{} {entry}", now.format("%Y-%m-%d %H:%M:%S")));
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(String::as_str)
    }

    fn drain_evidence(&mut self) -> Vec<PathBuf> {
        let files = self.evidence_files();
        self.evidence.clear();
        files
    }
}

#[cfg(test)]
#[path = "security_tests.rs"]
mod tests;
