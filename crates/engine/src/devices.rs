// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The device registry: every sensor and camera the hub knows about
//!
//! Names are unique across both kinds. Renaming keeps history; only an
//! explicit remove destroys a sensor's stored readings.

use chrono::{DateTime, Utc};
use hearth_core::{CameraState, SensorState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from registry mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("device '{0}' already exists")]
    Duplicate(String),
    #[error("device '{0}' not found")]
    NotFound(String),
}

/// One row of the device listing, for the control surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub name: String,
    pub kind: String,
    pub address: String,
    pub last_online: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRegistry {
    sensors: Vec<SensorState>,
    cameras: Vec<CameraState>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sensors.iter().any(|s| s.name == name) || self.cameras.iter().any(|c| c.name == name)
    }

    pub fn add_sensor(&mut self, sensor: SensorState) -> Result<(), RegistryError> {
        if self.contains(&sensor.name) {
            return Err(RegistryError::Duplicate(sensor.name));
        }
        tracing::info!(name = %sensor.name, "sensor added");
        self.sensors.push(sensor);
        Ok(())
    }

    pub fn add_camera(&mut self, camera: CameraState) -> Result<(), RegistryError> {
        if self.contains(&camera.name) {
            return Err(RegistryError::Duplicate(camera.name));
        }
        tracing::info!(name = %camera.name, address = %camera.address, "camera added");
        self.cameras.push(camera);
        Ok(())
    }

    /// Remove a device and its history
    pub fn remove(&mut self, name: &str) -> Result<(), RegistryError> {
        let before = self.sensors.len() + self.cameras.len();
        self.sensors.retain(|s| s.name != name);
        self.cameras.retain(|c| c.name != name);
        if self.sensors.len() + self.cameras.len() == before {
            return Err(RegistryError::NotFound(name.to_string()));
        }
        tracing::info!(name, "device removed");
        Ok(())
    }

    /// Rename a device in place; its history and token are untouched
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), RegistryError> {
        if self.contains(new) {
            return Err(RegistryError::Duplicate(new.to_string()));
        }
        if let Some(sensor) = self.sensors.iter_mut().find(|s| s.name == old) {
            sensor.name = new.to_string();
        } else if let Some(camera) = self.cameras.iter_mut().find(|c| c.name == old) {
            camera.name = new.to_string();
        } else {
            return Err(RegistryError::NotFound(old.to_string()));
        }
        tracing::info!(old, new, "device renamed");
        Ok(())
    }

    pub fn sensor(&self, name: &str) -> Option<&SensorState> {
        self.sensors.iter().find(|s| s.name == name)
    }

    pub fn sensor_by_token_mut(&mut self, token: &str) -> Option<&mut SensorState> {
        self.sensors.iter_mut().find(|s| s.token == token)
    }

    pub fn camera(&self, name: &str) -> Option<&CameraState> {
        self.cameras.iter().find(|c| c.name == name)
    }

    pub fn camera_mut(&mut self, name: &str) -> Option<&mut CameraState> {
        self.cameras.iter_mut().find(|c| c.name == name)
    }

    pub fn sensors(&self) -> &[SensorState] {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut [SensorState] {
        &mut self.sensors
    }

    pub fn cameras(&self) -> &[CameraState] {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut [CameraState] {
        &mut self.cameras
    }

    pub fn summaries(&self) -> Vec<DeviceSummary> {
        let sensors = self.sensors.iter().map(|s| DeviceSummary {
            name: s.name.clone(),
            kind: if s.is_push_only() {
                "push".to_string()
            } else {
                format!("{:?}", s.kind).to_lowercase()
            },
            address: s.address.clone(),
            last_online: s.last_online,
        });
        let cameras = self.cameras.iter().map(|c| DeviceSummary {
            name: c.name.clone(),
            kind: "camera".to_string(),
            address: c.address.to_string(),
            last_online: c.last_online,
        });
        sensors.chain(cameras).collect()
    }
}

#[cfg(test)]
#[path = "devices_tests.rs"]
mod tests;
