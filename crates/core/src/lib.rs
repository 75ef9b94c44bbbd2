// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hearth-core: Core library for the Hearth home-automation hub
//!
//! This crate provides:
//! - The per-sensor time-series store with retention folding
//! - Pure state for sensors, cameras, schedules, and the security alarm
//! - Alert rules, typed automation commands, and the hub event enum
//! - Frame diffing used by the security monitor

pub mod clock;

pub mod alert;
pub mod command;
pub mod config;
pub mod device;
pub mod event;
pub mod schedule;
pub mod security;
pub mod timeseries;
pub mod vision;

// Re-exports
pub use alert::{AlertRule, AlertRuleError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{Command, CommandError};
pub use config::HubConfig;
pub use device::{CameraAddress, CameraState, PtzDirection, SensorKind, SensorState};
pub use event::Event;
pub use schedule::{ScheduleEntry, ScheduleList};
pub use security::{AlarmPhase, SecurityState};
pub use timeseries::{AggregationKind, ReadingSample, SubchannelMeta, TimeSeriesStore, Value};
