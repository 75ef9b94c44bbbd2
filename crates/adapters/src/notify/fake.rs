// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake alert adapter for tests: recorded deliveries, scripted failures

use super::{AlertAdapter, NotifyError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertCall {
    pub message: String,
    pub files: Vec<PathBuf>,
    pub force: bool,
}

#[derive(Clone, Default)]
pub struct FakeAlertAdapter {
    calls: Arc<Mutex<Vec<AlertCall>>>,
    failures: Arc<AtomicUsize>,
}

impl FakeAlertAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` deliveries fail
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<AlertCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl AlertAdapter for FakeAlertAdapter {
    async fn send_alert(
        &self,
        message: &str,
        files: &[PathBuf],
        force: bool,
    ) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(AlertCall {
                message: message.to_string(),
                files: files.to_vec(),
                force,
            });

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(NotifyError::Delivery("scripted failure".to_string()));
        }
        Ok(())
    }
}
