// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Security monitor
//!
//! Drives the alarm state machine: watches the sensors' motion subchannels,
//! and while the alarm is triggered grabs camera frames, diffs them against
//! the per-camera baseline, and writes evidence files for the batched alert.
//! Delivery is attempted once per send interval; only a confirmed delivery
//! clears the evidence and re-arms the wait.

use crate::devices::DeviceRegistry;
use crate::polling::TickOutput;
use chrono::{DateTime, Duration, Utc};
use hearth_adapters::camera::FrameSource;
use hearth_adapters::notify::AlertAdapter;
use hearth_core::{vision, AlarmPhase, Event, HubConfig, SecurityState};
use image::RgbImage;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Default)]
pub struct SecurityMonitor {
    state: SecurityState,
    /// Last frame per camera that evidence was measured against
    baselines: HashMap<String, RgbImage>,
    /// Cameras whose last grab failed while triggered; an unreachable camera
    /// during an alarm is itself suspicious
    offline: HashSet<String>,
}

impl SecurityMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted state; runtime clocks are re-armed fresh
    pub fn from_state(state: SecurityState, now: DateTime<Utc>, start_delay: Duration) -> Self {
        let mut state = state;
        state.rearm(now, start_delay);
        Self {
            state,
            baselines: HashMap::new(),
            offline: HashSet::new(),
        }
    }

    pub fn state(&self) -> &SecurityState {
        &self.state
    }

    /// Arm or disarm; stale evidence files are deleted
    pub fn set_enabled(
        &mut self,
        enabled: bool,
        now: DateTime<Utc>,
        start_delay: Duration,
    ) -> TickOutput {
        let mut output = TickOutput::default();
        if self.state.is_enabled() == enabled {
            return output;
        }
        for path in self.state.set_enabled(enabled, now, start_delay) {
            remove_evidence_file(&path);
        }
        self.baselines.clear();
        self.offline.clear();
        output.changed = true;
        output.events.push(Event::SecurityToggled { enabled });
        output
    }

    pub async fn tick<C, N>(
        &mut self,
        now: DateTime<Utc>,
        registry: &mut DeviceRegistry,
        config: &HubConfig,
        frames: &C,
        notify: &N,
    ) -> TickOutput
    where
        C: FrameSource,
        N: AlertAdapter,
    {
        let mut output = TickOutput::default();
        if !self.state.is_enabled() {
            return output;
        }

        if motion_reported(registry, &config.motion_subchannel) && self.state.on_motion(now) {
            output.changed = true;
            output.events.push(Event::AlarmActivated);
        }

        if self.state.phase() == AlarmPhase::Triggered {
            self.capture_evidence(now, registry, config, frames).await;
            output.changed |= self.deliver_if_due(now, config, notify).await;
        }

        output
    }

    pub fn history(&self) -> Vec<String> {
        self.state.history().map(str::to_string).collect()
    }

    /// While triggered, grab a frame per camera and keep any that differ
    /// from the camera's baseline
    async fn capture_evidence<C: FrameSource>(
        &mut self,
        now: DateTime<Utc>,
        registry: &mut DeviceRegistry,
        config: &HubConfig,
        frames: &C,
    ) {
        for camera in registry.cameras_mut() {
            if !camera.capture.is_opened() && !camera.capture.may_open(now) {
                self.offline.insert(camera.name.clone());
                continue;
            }
            let frame = match frames.grab(&camera.address).await {
                Ok(frame) => {
                    camera.capture.touch(now);
                    camera.last_online = Some(now);
                    self.offline.remove(&camera.name);
                    frame
                }
                Err(e) => {
                    camera.capture.mark_failed(now);
                    self.offline.insert(camera.name.clone());
                    tracing::warn!(name = %camera.name, error = %e, "camera offline while triggered");
                    continue;
                }
            };

            match self.baselines.get(&camera.name) {
                Some(baseline) => {
                    let moved = vision::find_movement(
                        &vision::to_gray(baseline),
                        &vision::to_gray(&frame),
                    )
                    .is_some();
                    if moved {
                        self.save_evidence(&camera.name, &frame, &config.evidence_dir);
                        self.baselines.insert(camera.name.clone(), frame);
                    }
                }
                None => {
                    self.baselines.insert(camera.name.clone(), frame);
                }
            }
        }
    }

    /// Write one evidence frame; the first save for a camera also writes the
    /// baseline it moved against
    fn save_evidence(&mut self, camera: &str, frame: &RgbImage, dir: &Path) {
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::error!(dir = %dir.display(), error = %e, "cannot create evidence dir");
            return;
        }
        if self.state.evidence_count(camera) == 0 {
            if let Some(baseline) = self.baselines.get(camera).cloned() {
                self.write_frame(camera, baseline, dir);
            }
        }
        self.write_frame(camera, frame.clone(), dir);
    }

    fn write_frame(&mut self, camera: &str, frame: RgbImage, dir: &Path) {
        let n = self.state.evidence_count(camera);
        let path = dir.join(format!("{camera}{n}.jpg"));
        match frame.save(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "evidence saved");
                self.state.add_evidence(camera, path);
            }
            Err(e) => tracing::error!(path = %path.display(), error = %e, "cannot save evidence"),
        }
    }

    /// Once per send interval: deliver evidence (or an offline-camera alarm)
    /// with force, or log a skip when there is nothing suspicious
    async fn deliver_if_due<N: AlertAdapter>(
        &mut self,
        now: DateTime<Utc>,
        config: &HubConfig,
        notify: &N,
    ) -> bool {
        let send_interval = to_chrono(config.send_interval);
        if !self.state.send_due(now, send_interval) {
            return false;
        }
        let start_delay = to_chrono(config.start_delay);

        if self.state.has_evidence() || !self.offline.is_empty() {
            let files = self.state.evidence_files();
            let mut message = "Security alarm activated!".to_string();
            if !self.offline.is_empty() {
                let mut names: Vec<&str> = self.offline.iter().map(String::as_str).collect();
                names.sort_unstable();
                message.push_str(&format!(" Cameras offline: {}", names.join(", ")));
            }
            match notify.send_alert(&message, &files, true).await {
                Ok(()) => {
                    for path in self.state.delivery_succeeded(now, start_delay) {
                        remove_evidence_file(&path);
                    }
                    self.baselines.clear();
                }
                Err(e) => {
                    tracing::error!(error = %e, "alert delivery failed, keeping evidence");
                    self.state.delivery_failed(now);
                }
            }
        } else {
            self.state.skip_delivery(now, start_delay);
        }
        true
    }
}

fn motion_reported(registry: &DeviceRegistry, motion_subchannel: &str) -> bool {
    registry.sensors().iter().any(|sensor| {
        sensor.store.latest().is_some_and(|bucket| {
            bucket
                .iter()
                .any(|(name, value)| name.starts_with(motion_subchannel) && value.truthy())
        })
    })
}

fn remove_evidence_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "cannot remove evidence file");
    }
}

pub(crate) fn to_chrono(duration: std::time::Duration) -> Duration {
    Duration::from_std(duration).unwrap_or(Duration::MAX)
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
