// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub events emitted by the systems and consumed by other systems or the
//! daemon (logging, challenge responses, persistence hooks)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A sensor stored new data (poll or push)
    SensorDataAdded { sensor: String, names: Vec<String> },
    /// The security monitor transitioned into triggered
    AlarmActivated,
    /// The security system was armed or disarmed
    SecurityToggled { enabled: bool },
    /// The scheduler executed an automation command
    CommandExecuted { command: String },
}

impl Event {
    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            Event::SensorDataAdded { .. } => "sensor_data_added",
            Event::AlarmActivated => "alarm_activated",
            Event::SecurityToggled { .. } => "security_toggled",
            Event::CommandExecuted { .. } => "command_executed",
        }
    }
}
