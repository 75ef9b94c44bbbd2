// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure state for sensors and cameras
//!
//! Device I/O lives in hearth-adapters; this module holds the identity,
//! metadata, and stored history that survive restarts, plus the capture
//! open/retry/idle policy for cameras.

use crate::timeseries::{ReadingSample, SubchannelMeta, TimeSeriesStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a sensor with a non-empty address is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// HTTP GET `http://{address}/data`
    Wifi,
    /// Line protocol over a serial port
    Serial,
}

/// One sensor: identity, subchannel metadata, and its owned readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorState {
    pub name: String,
    /// Network/serial locator; empty means the device only pushes data
    pub address: String,
    pub kind: SensorKind,
    /// Opaque secret authenticating pushed data; stable identity for
    /// push-only devices
    pub token: String,
    pub metadata: BTreeMap<String, SubchannelMeta>,
    #[serde(default)]
    pub store: TimeSeriesStore,
    /// Last time the device delivered data, by poll or push
    #[serde(default)]
    pub last_online: Option<DateTime<Utc>>,
}

impl SensorState {
    pub fn new(name: impl Into<String>, address: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            kind,
            token: uuid::Uuid::new_v4().simple().to_string(),
            metadata: BTreeMap::new(),
            store: TimeSeriesStore::new(),
            last_online: None,
        }
    }

    /// A device with no pollable address only reaches the hub by pushing
    pub fn is_push_only(&self) -> bool {
        self.address.is_empty()
    }

    /// Add readings and, when anything changed, enforce retention
    pub fn add_data(
        &mut self,
        time: DateTime<Utc>,
        samples: &[ReadingSample],
        bigger_only: bool,
        now: DateTime<Utc>,
    ) -> bool {
        let changed = self.store.add(time, samples, bigger_only, &mut self.metadata);
        if changed {
            self.last_online = Some(now);
            self.store.archive(now, &self.metadata);
        }
        changed
    }

    pub fn latest_time(&self) -> Option<DateTime<Utc>> {
        self.store.latest_time()
    }
}

/// Camera locator variants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraAddress {
    /// Local capture device index (`device:0` or a bare number)
    Device(u32),
    /// Raw stream URL, e.g. `rtsp://host:554/stream`
    Stream(String),
    /// Protocol-managed endpoint: `user:pass@host:port`
    Credentials {
        username: String,
        password: String,
        host: String,
        port: u16,
    },
}

impl CameraAddress {
    /// Device-index cameras are local; everything else is an IP camera
    pub fn is_ip(&self) -> bool {
        !matches!(self, CameraAddress::Device(_))
    }
}

/// Error parsing a camera address string
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid camera address: {0}")]
pub struct CameraAddressError(pub String);

impl FromStr for CameraAddress {
    type Err = CameraAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(index) = s.strip_prefix("device:") {
            let index = index
                .parse()
                .map_err(|_| CameraAddressError(s.to_string()))?;
            return Ok(CameraAddress::Device(index));
        }
        if let Ok(index) = s.parse() {
            return Ok(CameraAddress::Device(index));
        }
        if s.contains("://") {
            return Ok(CameraAddress::Stream(s.to_string()));
        }
        // username:password@host:port
        let (creds, endpoint) = s.split_once('@').ok_or_else(|| CameraAddressError(s.to_string()))?;
        let (username, password) = creds
            .split_once(':')
            .ok_or_else(|| CameraAddressError(s.to_string()))?;
        let (host, port) = endpoint
            .split_once(':')
            .ok_or_else(|| CameraAddressError(s.to_string()))?;
        let port = port.parse().map_err(|_| CameraAddressError(s.to_string()))?;
        Ok(CameraAddress::Credentials {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
        })
    }
}

/// Rendering for logs and device listings; the credentials password is
/// never included
impl fmt::Display for CameraAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraAddress::Device(index) => write!(f, "device:{index}"),
            CameraAddress::Stream(url) => write!(f, "{url}"),
            CameraAddress::Credentials {
                username,
                host,
                port,
                ..
            } => write!(f, "{username}:***@{host}:{port}"),
        }
    }
}

/// Capture handle lifecycle: lazy open, failed-open backoff, idle release
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    opened: bool,
    last_use: Option<DateTime<Utc>>,
}

impl CaptureState {
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Whether an open (or re-open after failure) may be attempted now.
    /// Failed opens are retried no sooner than one minute apart.
    pub fn may_open(&self, now: DateTime<Utc>) -> bool {
        !self.opened
            && self
                .last_use
                .is_none_or(|t| now - t >= Duration::minutes(1))
    }

    /// Record a successful grab
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.opened = true;
        self.last_use = Some(now);
    }

    /// Record a failed grab; the handle is considered closed
    pub fn mark_failed(&mut self, now: DateTime<Utc>) {
        self.opened = false;
        self.last_use = Some(now);
    }

    /// An open handle unused for five minutes should be released
    pub fn idle_expired(&self, now: DateTime<Utc>) -> bool {
        self.opened
            && self
                .last_use
                .is_some_and(|t| now - t >= Duration::minutes(5))
    }

    pub fn release(&mut self) {
        self.opened = false;
    }
}

/// One camera: identity plus capture lifecycle (the handle itself lives in
/// the adapter layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraState {
    pub name: String,
    pub address: CameraAddress,
    /// Last successful frame grab
    #[serde(default)]
    pub last_online: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub capture: CaptureState,
}

impl CameraState {
    pub fn new(name: impl Into<String>, address: CameraAddress) -> Self {
        Self {
            name: name.into(),
            address,
            last_online: None,
            capture: CaptureState::default(),
        }
    }
}

/// Pan/tilt/zoom direction for cameras that support movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtzDirection {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
}

impl FromStr for PtzDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(PtzDirection::Up),
            "down" => Ok(PtzDirection::Down),
            "left" => Ok(PtzDirection::Left),
            "right" => Ok(PtzDirection::Right),
            "zoomin" | "zoom-in" => Ok(PtzDirection::ZoomIn),
            "zoomout" | "zoom-out" => Ok(PtzDirection::ZoomOut),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
