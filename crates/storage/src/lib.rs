// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! JSON state document and TOML settings store

pub mod settings;
pub mod state;

pub use settings::{SettingsError, SettingsFile};
pub use state::{StateDocument, StateError, StateFile};
