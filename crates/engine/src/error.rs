// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use thiserror::Error;

/// Errors that can occur in the runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("state error: {0}")]
    State(#[from] hearth_storage::StateError),
    #[error("registry error: {0}")]
    Registry(#[from] crate::devices::RegistryError),
    #[error("alert rule error: {0}")]
    AlertRule(#[from] hearth_core::AlertRuleError),
    #[error("command error: {0}")]
    Command(#[from] hearth_core::CommandError),
}
