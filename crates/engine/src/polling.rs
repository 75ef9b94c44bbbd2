// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling orchestrator
//!
//! Drives per-device reads on a minute-aligned grid. Reads run on the
//! executor's worker pool and report back over a channel; all state mutation
//! happens here on the tick thread when the outcomes are drained. A device
//! that stops answering is reported exactly once, when its silence enters
//! the fourth missed interval, so a dead sensor does not alert on every
//! sweep thereafter.

use crate::devices::DeviceRegistry;
use crate::executor::TaskExecutor;
use chrono::{DateTime, Duration, Timelike, Utc};
use hearth_adapters::camera::FrameSource;
use hearth_adapters::probe::DeviceProbe;
use hearth_core::{alert, AlertRule, Event, HubConfig, ReadingSample, SensorState, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from push ingestion
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PushError {
    #[error("unknown device token")]
    UnknownToken,
}

/// What one tick of a system produced, folded into the host's loop
#[derive(Debug, Default)]
pub struct TickOutput {
    /// Persist the state document after this tick
    pub changed: bool,
    /// Complete outbound alert messages
    pub alerts: Vec<String>,
    pub events: Vec<Event>,
}

impl TickOutput {
    pub fn merge(&mut self, other: TickOutput) {
        self.changed |= other.changed;
        self.alerts.extend(other.alerts);
        self.events.extend(other.events);
    }
}

/// A completed worker read, applied on the tick thread
enum ReadOutcome {
    Sensor {
        token: String,
        result: Result<Vec<ReadingSample>, String>,
    },
    Camera {
        name: String,
        ok: bool,
    },
}

pub struct PollingOrchestrator {
    next_time: DateTime<Utc>,
    outcomes: mpsc::UnboundedSender<ReadOutcome>,
    completed: mpsc::UnboundedReceiver<ReadOutcome>,
}

impl PollingOrchestrator {
    pub fn new(now: DateTime<Utc>, check_interval: u32) -> Self {
        let (outcomes, completed) = mpsc::unbounded_channel();
        Self {
            next_time: align(now, check_interval),
            outcomes,
            completed,
        }
    }

    /// When the next sweep fires
    pub fn next_time(&self) -> DateTime<Utc> {
        self.next_time
    }

    /// One tick: drain completed reads, then run the sweep when due
    pub fn tick<P, C>(
        &mut self,
        now: DateTime<Utc>,
        config: &HubConfig,
        registry: &mut DeviceRegistry,
        rules: &[AlertRule],
        probe: &P,
        frames: &C,
        executor: &TaskExecutor,
    ) -> TickOutput
    where
        P: DeviceProbe,
        C: FrameSource,
    {
        let mut output = TickOutput::default();
        let mut fragments = self.drain(now, registry, rules, &mut output);

        for camera in registry.cameras_mut() {
            if camera.capture.idle_expired(now) {
                tracing::debug!(name = %camera.name, "releasing idle capture");
                camera.capture.release();
            }
        }

        let interval = config.check_interval.max(1);
        if now >= self.next_time {
            // realigned when check_interval changed mid-cycle
            if self.next_time.minute() % interval != 0 {
                self.next_time = align(now, interval);
            }

            fragments.extend(self.inactive_devices(registry, interval));
            self.dispatch(now, registry, probe, frames, executor);

            // the sweep clock is rebuilt on restart, not persisted; only
            // drained outcomes mark the state changed
            self.next_time += Duration::minutes(i64::from(interval));
        }

        if !fragments.is_empty() {
            output.alerts.push(fragments.join("; "));
        }
        output
    }

    /// Apply an externally pushed payload, authenticated by device token
    pub fn process_data(
        &self,
        now: DateTime<Utc>,
        registry: &mut DeviceRegistry,
        rules: &[AlertRule],
        token: &str,
        samples: &[ReadingSample],
    ) -> Result<TickOutput, PushError> {
        let sensor = registry
            .sensor_by_token_mut(token)
            .ok_or(PushError::UnknownToken)?;

        let mut output = TickOutput::default();
        if let Some(fragment) = apply_readings(sensor, samples, now, rules, true, &mut output) {
            output.alerts.push(fragment);
        }
        Ok(output)
    }

    fn drain(
        &mut self,
        now: DateTime<Utc>,
        registry: &mut DeviceRegistry,
        rules: &[AlertRule],
        output: &mut TickOutput,
    ) -> Vec<String> {
        let mut fragments = Vec::new();
        while let Ok(outcome) = self.completed.try_recv() {
            match outcome {
                ReadOutcome::Sensor { token, result } => {
                    let Some(sensor) = registry.sensor_by_token_mut(&token) else {
                        continue; // removed while the read was in flight
                    };
                    match result {
                        Ok(samples) => {
                            fragments.extend(apply_readings(
                                sensor, &samples, now, rules, false, output,
                            ));
                        }
                        Err(message) => {
                            tracing::warn!(name = %sensor.name, %message, "sensor read failed");
                        }
                    }
                }
                ReadOutcome::Camera { name, ok } => {
                    let Some(camera) = registry.cameras_mut().iter_mut().find(|c| c.name == name)
                    else {
                        continue;
                    };
                    if ok {
                        camera.capture.touch(now);
                        camera.last_online = Some(now);
                        output.changed = true;
                    } else {
                        camera.capture.mark_failed(now);
                        tracing::warn!(name = %camera.name, "camera read failed");
                    }
                }
            }
        }
        fragments
    }

    /// Devices whose last data age sits in exactly the 4th-5th missed
    /// interval window
    fn inactive_devices(&self, registry: &DeviceRegistry, interval: u32) -> Vec<String> {
        let newest = self.next_time - Duration::minutes(i64::from(interval) * 4);
        let oldest = self.next_time - Duration::minutes(i64::from(interval) * 5);
        let in_window = |last: Option<DateTime<Utc>>| {
            last.is_some_and(|last| last <= newest && last > oldest)
        };

        let mut fragments = Vec::new();
        for sensor in registry.sensors() {
            if !sensor.is_push_only() && in_window(sensor.last_online) {
                tracing::warn!(name = %sensor.name, last = ?sensor.last_online, "sensor inactive");
                fragments.push(format!("{} inactive", sensor.name));
            }
        }
        for camera in registry.cameras() {
            // streaming failures on IP cameras are not telemetry gaps
            if !camera.address.is_ip() && in_window(camera.last_online) {
                tracing::warn!(name = %camera.name, last = ?camera.last_online, "camera inactive");
                fragments.push(format!("{} inactive", camera.name));
            }
        }
        fragments
    }

    fn dispatch<P, C>(
        &self,
        now: DateTime<Utc>,
        registry: &DeviceRegistry,
        probe: &P,
        frames: &C,
        executor: &TaskExecutor,
    ) where
        P: DeviceProbe,
        C: FrameSource,
    {
        for sensor in registry.sensors() {
            if sensor.is_push_only() {
                continue;
            }
            let probe = probe.clone();
            let outcomes = self.outcomes.clone();
            let token = sensor.token.clone();
            let kind = sensor.kind;
            let address = sensor.address.clone();
            executor.execute(&format!("sensor:{}", sensor.name), async move {
                let result = probe.read(kind, &address).await.map_err(|e| e.to_string());
                let _ = outcomes.send(ReadOutcome::Sensor { token, result });
            });
        }

        for camera in registry.cameras() {
            if !camera.capture.is_opened() && !camera.capture.may_open(now) {
                continue; // failed recently, back off
            }
            let frames = frames.clone();
            let outcomes = self.outcomes.clone();
            let name = camera.name.clone();
            let address = camera.address.clone();
            executor.execute(&format!("camera:{}", camera.name), async move {
                let ok = frames.grab(&address).await.is_ok();
                let _ = outcomes.send(ReadOutcome::Camera { name, ok });
            });
        }
    }
}

/// Store readings on a sensor, evaluating alert rules against them.
///
/// Polled reads stamp with the hub clock. A pushed payload landing on a
/// polled sensor refines that sensor's current bucket instead (larger value
/// wins), so out-of-band pushes never fork the timeline the poll grid owns;
/// push-only sensors have no grid and stamp with the hub clock.
fn apply_readings(
    sensor: &mut SensorState,
    samples: &[ReadingSample],
    now: DateTime<Utc>,
    rules: &[AlertRule],
    pushed: bool,
    output: &mut TickOutput,
) -> Option<String> {
    let (time, bigger_only) = if pushed && !sensor.is_push_only() {
        (sensor.latest_time().unwrap_or(now), true)
    } else {
        (now, false)
    };

    if !sensor.add_data(time, samples, bigger_only, now) {
        return None;
    }
    output.changed = true;
    output.events.push(Event::SensorDataAdded {
        sensor: sensor.name.clone(),
        names: samples.iter().map(|s| s.name.clone()).collect(),
    });

    let bucket: BTreeMap<String, Value> =
        samples.iter().map(|s| (s.name.clone(), s.value)).collect();
    let violations = alert::violations(rules, &bucket);
    if violations.is_empty() {
        None
    } else {
        Some(format!("{}: {}", sensor.name, violations.join(", ")))
    }
}

/// First interval boundary at or after `now`, counted from the hour
fn align(now: DateTime<Utc>, check_interval: u32) -> DateTime<Utc> {
    let floor = now
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let step = Duration::minutes(i64::from(check_interval.max(1)));
    let mut time = floor;
    while time < now {
        time += step;
    }
    time
}

#[cfg(test)]
#[path = "polling_tests.rs"]
mod tests;
