// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub configuration
//!
//! Scalar settings live in the key/value settings store, separate from the
//! state document. One explicit struct owned by the host and passed to the
//! systems at construction; nothing reads configuration globals.

use crate::alert::{AlertRule, AlertRuleError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Top-level tick period
    #[serde(with = "humantime_serde")]
    pub update_interval: Duration,
    /// Sensor sweep interval in minutes; `next_time` aligns to this grid
    pub check_interval: u32,
    /// Grace period after arming the security system
    #[serde(with = "humantime_serde")]
    pub start_delay: Duration,
    /// How often the security monitor attempts evidence delivery
    #[serde(with = "humantime_serde")]
    pub send_interval: Duration,
    /// Worker pool size for device I/O
    pub workers: usize,
    /// Where evidence frames are written
    pub evidence_dir: PathBuf,
    /// Subchannel name prefix treated as a motion signal
    pub motion_subchannel: String,
    /// Alert rules: subchannel name (or `*`-prefix) -> threshold expression
    pub alert_rules: BTreeMap<String, String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(1),
            check_interval: 15,
            start_delay: Duration::from_secs(15 * 60),
            send_interval: Duration::from_secs(5 * 60),
            workers: 4,
            evidence_dir: PathBuf::from("evidence"),
            motion_subchannel: "Motion".to_string(),
            alert_rules: BTreeMap::new(),
        }
    }
}

impl HubConfig {
    /// Parse the configured alert rules, failing on the first invalid one
    pub fn rules(&self) -> Result<Vec<AlertRule>, AlertRuleError> {
        self.alert_rules
            .iter()
            .map(|(key, expr)| AlertRule::parse(key, expr))
            .collect()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
