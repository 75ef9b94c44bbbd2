// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake probe for tests: scripted responses, recorded calls

use super::{DeviceProbe, ProbeError};
use async_trait::async_trait;
use hearth_core::{ReadingSample, SensorKind};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeCall {
    pub kind: SensorKind,
    pub address: String,
}

#[derive(Clone, Default)]
pub struct FakeProbe {
    calls: Arc<Mutex<Vec<ProbeCall>>>,
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<Vec<ReadingSample>, String>>>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful read for the given address
    pub fn push_samples(&self, address: &str, samples: Vec<ReadingSample>) {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses
            .entry(address.to_string())
            .or_default()
            .push_back(Ok(samples));
    }

    /// Queue a failed read for the given address
    pub fn push_failure(&self, address: &str, message: &str) {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses
            .entry(address.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
    }

    /// Make every read take this long (for single-flight tests)
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl DeviceProbe for FakeProbe {
    async fn read(&self, kind: SensorKind, address: &str) -> Result<Vec<ReadingSample>, ProbeError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ProbeCall {
                kind,
                address: address.to_string(),
            });

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = {
            let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
            responses.get_mut(address).and_then(VecDeque::pop_front)
        };
        match next {
            Some(Ok(samples)) => Ok(samples),
            Some(Err(message)) => Err(ProbeError::Http(message)),
            None => Err(ProbeError::Http(format!("no scripted response for {address}"))),
        }
    }
}
