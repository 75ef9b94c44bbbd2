// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: device probes, camera frames, alert delivery

pub mod camera;
pub mod notify;
pub mod probe;

pub use camera::{FfmpegFrameSource, FrameSource};
pub use notify::{AlertAdapter, NoOpAlertAdapter};
pub use probe::{DeviceProbe, NetProbe};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use camera::{FakeFrameSource, FrameCall};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{AlertCall, FakeAlertAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use probe::{FakeProbe, ProbeCall};
