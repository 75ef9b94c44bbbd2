// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device probes: the per-kind read behind a polled sensor
//!
//! Probe failures are transient by design: the orchestrator logs them and
//! treats the tick as "no data", never propagating them into the loop.

mod http;
mod serial;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProbe, ProbeCall};

use async_trait::async_trait;
use hearth_core::{ReadingSample, SensorKind};
use thiserror::Error;

/// Errors from device reads
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("http error: {0}")]
    Http(String),
    #[error("serial error: {0}")]
    Serial(String),
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("worker failed: {0}")]
    Worker(String),
}

/// Adapter performing one device read
#[async_trait]
pub trait DeviceProbe: Clone + Send + Sync + 'static {
    async fn read(&self, kind: SensorKind, address: &str) -> Result<Vec<ReadingSample>, ProbeError>;
}

/// Real probe: HTTP for WiFi sensors, line protocol for serial sensors.
///
/// Both transports are blocking clients with their own timeouts (connect
/// ~1 s, overall ~5 s), run on the blocking pool so a hung device never
/// stalls the runtime.
#[derive(Clone, Default)]
pub struct NetProbe;

impl NetProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeviceProbe for NetProbe {
    async fn read(&self, kind: SensorKind, address: &str) -> Result<Vec<ReadingSample>, ProbeError> {
        let address = address.to_string();
        let handle = tokio::task::spawn_blocking(move || match kind {
            SensorKind::Wifi => http::fetch(&address),
            SensorKind::Serial => serial::exchange(&address),
        });
        handle
            .await
            .map_err(|e| ProbeError::Worker(e.to_string()))?
    }
}
