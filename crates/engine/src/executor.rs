// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight task dispatch over a bounded worker pool
//!
//! Device I/O is fanned out through here. One key (one device) has at most
//! one task in flight; dispatching while a task for the key is outstanding
//! is a drop, not a queue. The semaphore bounds how many tasks actually run
//! at once regardless of how many were spawned.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

pub struct TaskExecutor {
    semaphore: Arc<Semaphore>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl TaskExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn `work` under `key` unless a task for the key is still in
    /// flight. Returns whether the task was accepted.
    pub fn execute<F>(&self, key: &str, work: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|_, handle| !handle.is_finished());
        if tasks.contains_key(key) {
            tracing::debug!(key, "task already in flight, dropping");
            return false;
        }

        let semaphore = Arc::clone(&self.semaphore);
        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            work.await;
        });
        tasks.insert(key.to_string(), handle);
        true
    }

    /// Whether a task for the key is still in flight
    pub fn running(&self, key: &str) -> bool {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.get(key).is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the task under `key` to finish. Returns false on timeout;
    /// the task keeps running detached.
    pub async fn wait(&self, key: &str, timeout: Duration) -> bool {
        let handle = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.remove(key)
        };
        match handle {
            Some(handle) => tokio::time::timeout(timeout, handle).await.is_ok(),
            None => true,
        }
    }

    /// Drain every outstanding task within one shared deadline
    pub async fn wait_all(&self, timeout: Duration) -> bool {
        let handles: Vec<JoinHandle<()>> = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.drain().map(|(_, handle)| handle).collect()
        };
        let drain = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        tokio::time::timeout(timeout, drain).await.is_ok()
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
