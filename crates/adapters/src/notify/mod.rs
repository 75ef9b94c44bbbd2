// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert delivery adapter
//!
//! The real SMS/email channel lives outside this core; the hub only depends
//! on this contract. `force` bypasses any do-not-disturb schedule the
//! implementation honors.

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AlertCall, FakeAlertAdapter};

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from alert delivery
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Adapter for sending alerts with optional file attachments
#[async_trait]
pub trait AlertAdapter: Clone + Send + Sync + 'static {
    async fn send_alert(
        &self,
        message: &str,
        files: &[PathBuf],
        force: bool,
    ) -> Result<(), NotifyError>;
}

/// Adapter that logs alerts without delivering them
#[derive(Clone, Default)]
pub struct NoOpAlertAdapter;

#[async_trait]
impl AlertAdapter for NoOpAlertAdapter {
    async fn send_alert(
        &self,
        message: &str,
        files: &[PathBuf],
        force: bool,
    ) -> Result<(), NotifyError> {
        tracing::info!(message, ?files, force, "alert (no delivery channel configured)");
        Ok(())
    }
}
