// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Hearth automation engine: the tick-driven systems behind the daemon

mod devices;
mod error;
mod executor;
mod monitor;
mod polling;
mod runtime;
mod scheduler;

pub use devices::{DeviceRegistry, DeviceSummary, RegistryError};
pub use error::RuntimeError;
pub use executor::TaskExecutor;
pub use monitor::SecurityMonitor;
pub use polling::{PollingOrchestrator, PushError, TickOutput};
pub use runtime::{Runtime, RuntimeDeps, StatusSnapshot};
pub use scheduler::Scheduler;
