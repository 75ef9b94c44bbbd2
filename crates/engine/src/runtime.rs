// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The automation host: composition root and tick loop body
//!
//! Owns every system and the adapters, runs one tick at a time (orchestrator,
//! monitor, scheduler, persist), and exposes the control-surface operations
//! the daemon serves. No error in here terminates the loop: failures are
//! logged and the next tick carries on.

use crate::devices::{DeviceRegistry, DeviceSummary, RegistryError};
use crate::error::RuntimeError;
use crate::executor::TaskExecutor;
use crate::monitor::{to_chrono, SecurityMonitor};
use crate::polling::{PollingOrchestrator, PushError, TickOutput};
use crate::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use hearth_adapters::camera::FrameSource;
use hearth_adapters::notify::AlertAdapter;
use hearth_adapters::probe::DeviceProbe;
use hearth_core::{
    vision, AlarmPhase, AlertRule, CameraAddress, CameraState, Clock, Command, CommandError,
    Event, HubConfig, PtzDirection, ReadingSample, ScheduleEntry, ScheduleList, SecurityState,
    SensorKind, SensorState, Value,
};
use hearth_storage::{StateDocument, StateError, StateFile};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

const DEVICES_BLOB: &str = "devices";
const SECURITY_BLOB: &str = "security";
const SCHEDULE_BLOB: &str = "schedule";

/// The external adapters the runtime drives
pub struct RuntimeDeps<P, C, N> {
    pub probe: P,
    pub frames: C,
    pub notify: N,
}

/// One row of `status` output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub security: AlarmPhase,
    pub sensors: usize,
    pub cameras: usize,
    pub schedule_entries: usize,
    pub next_poll: DateTime<Utc>,
}

pub struct Runtime<K, P, C, N> {
    config: HubConfig,
    rules: Vec<AlertRule>,
    clock: K,
    deps: RuntimeDeps<P, C, N>,
    registry: DeviceRegistry,
    executor: TaskExecutor,
    orchestrator: PollingOrchestrator,
    monitor: SecurityMonitor,
    scheduler: Scheduler,
    state_file: StateFile,
    events: mpsc::UnboundedSender<Event>,
    changed: bool,
}

impl<K, P, C, N> Runtime<K, P, C, N>
where
    K: Clock,
    P: DeviceProbe,
    C: FrameSource,
    N: AlertAdapter,
{
    /// Build the runtime from persisted state, returning the event stream
    /// alongside it
    pub fn new(
        config: HubConfig,
        clock: K,
        deps: RuntimeDeps<P, C, N>,
        state_file: StateFile,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Event>), RuntimeError> {
        let rules = config.rules()?;
        let document = state_file.load()?;
        let registry: DeviceRegistry = document.get(DEVICES_BLOB)?.unwrap_or_default();
        let security: SecurityState = document.get(SECURITY_BLOB)?.unwrap_or_default();
        let schedule: ScheduleList = document.get(SCHEDULE_BLOB)?.unwrap_or_default();

        let now = clock.now();
        let monitor = SecurityMonitor::from_state(security, now, to_chrono(config.start_delay));
        let orchestrator = PollingOrchestrator::new(now, config.check_interval);
        let executor = TaskExecutor::new(config.workers);
        let (events, events_rx) = mpsc::unbounded_channel();

        tracing::info!(
            sensors = registry.sensors().len(),
            cameras = registry.cameras().len(),
            schedule = schedule.entries().len(),
            "runtime loaded"
        );

        Ok((
            Self {
                config,
                rules,
                clock,
                deps,
                registry,
                executor,
                orchestrator,
                monitor,
                scheduler: Scheduler::from_list(schedule),
                state_file,
                events,
                changed: false,
            },
            events_rx,
        ))
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// One turn of the loop: orchestrator, monitor, scheduler, persist
    pub async fn tick(&mut self) {
        let now = self.clock.now();
        let mut output = self.orchestrator.tick(
            now,
            &self.config,
            &mut self.registry,
            &self.rules,
            &self.deps.probe,
            &self.deps.frames,
            &self.executor,
        );
        output.merge(
            self.monitor
                .tick(now, &mut self.registry, &self.config, &self.deps.frames, &self.deps.notify)
                .await,
        );

        for entry in self.scheduler.sweep(now) {
            output.changed = true;
            match self.dispatch(&entry.command).await {
                Ok(out) => {
                    output.merge(out);
                    output.events.push(Event::CommandExecuted {
                        command: entry.command.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!(name = %entry.name, command = %entry.command, error = %e, "scheduled command failed");
                }
            }
        }

        let alerts = std::mem::take(&mut output.alerts);
        self.send_alerts(&alerts).await;
        self.finish(now, output);
    }

    /// Ingest an externally pushed payload; returns whether anything changed
    pub async fn push(
        &mut self,
        token: &str,
        samples: &[ReadingSample],
    ) -> Result<bool, PushError> {
        let now = self.clock.now();
        let mut output =
            self.orchestrator
                .process_data(now, &mut self.registry, &self.rules, token, samples)?;
        let changed = output.changed;
        let alerts = std::mem::take(&mut output.alerts);
        self.send_alerts(&alerts).await;
        self.finish(now, output);
        Ok(changed)
    }

    pub fn set_security(&mut self, enabled: bool) -> AlarmPhase {
        let now = self.clock.now();
        let output = self
            .monitor
            .set_enabled(enabled, now, to_chrono(self.config.start_delay));
        self.finish(now, output);
        self.monitor.state().phase()
    }

    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            security: self.monitor.state().phase(),
            sensors: self.registry.sensors().len(),
            cameras: self.registry.cameras().len(),
            schedule_entries: self.scheduler.entries().len(),
            next_poll: self.orchestrator.next_time(),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.monitor.history()
    }

    pub fn devices(&self) -> Vec<DeviceSummary> {
        self.registry.summaries()
    }

    /// One frame from the named camera. A failed grab, or one inside the
    /// retry backoff, yields the placeholder frame instead of an error, so
    /// callers always receive a readable image.
    pub async fn get_image(&mut self, name: &str) -> Result<RgbImage, RegistryError> {
        let now = self.clock.now();
        let camera = self
            .registry
            .camera_mut(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        if !camera.capture.is_opened() && !camera.capture.may_open(now) {
            return Ok(vision::placeholder_frame());
        }
        match self.deps.frames.grab(&camera.address).await {
            Ok(frame) => {
                camera.capture.touch(now);
                camera.last_online = Some(now);
                self.mark_changed();
                Ok(frame)
            }
            Err(e) => {
                camera.capture.mark_failed(now);
                tracing::warn!(name = %name, error = %e, "frame grab failed, serving placeholder");
                Ok(vision::placeholder_frame())
            }
        }
    }

    /// Latest readings bucket of one sensor; None for an unknown name
    pub fn latest_data(&self, name: &str) -> Option<BTreeMap<String, Value>> {
        self.registry
            .sensor(name)
            .map(|sensor| sensor.store.latest().cloned().unwrap_or_default())
    }

    /// Register a sensor, returning its push token
    pub fn add_sensor(
        &mut self,
        name: &str,
        address: &str,
        kind: SensorKind,
    ) -> Result<String, RegistryError> {
        let sensor = SensorState::new(name, address, kind);
        let token = sensor.token.clone();
        self.registry.add_sensor(sensor)?;
        self.mark_changed();
        Ok(token)
    }

    pub fn add_camera(&mut self, name: &str, address: CameraAddress) -> Result<(), RegistryError> {
        self.registry.add_camera(CameraState::new(name, address))?;
        self.mark_changed();
        Ok(())
    }

    pub fn remove_device(&mut self, name: &str) -> Result<(), RegistryError> {
        self.registry.remove(name)?;
        self.mark_changed();
        Ok(())
    }

    pub fn rename_device(&mut self, old: &str, new: &str) -> Result<(), RegistryError> {
        self.registry.rename(old, new)?;
        self.mark_changed();
        Ok(())
    }

    pub fn schedule_add(&mut self, entry: ScheduleEntry) {
        self.scheduler.add(entry);
        self.mark_changed();
    }

    pub fn schedule_remove(&mut self, name: &str) -> usize {
        let removed = self.scheduler.remove(name);
        if removed > 0 {
            self.mark_changed();
        }
        removed
    }

    pub fn schedule_entries(&self) -> &[ScheduleEntry] {
        self.scheduler.entries()
    }

    /// Wait for in-flight device reads to complete (their outcomes still
    /// apply on the next tick)
    pub async fn wait_for_reads(&self, timeout: std::time::Duration) -> bool {
        self.executor.wait_all(timeout).await
    }

    /// Drain outstanding device reads and write the final state
    pub async fn shutdown(&mut self) {
        if !self.executor.wait_all(std::time::Duration::from_secs(10)).await {
            tracing::warn!("device reads still running at shutdown");
        }
        self.changed = true;
        self.persist(self.clock.now());
    }

    /// Resolve a command against the registered actions
    async fn dispatch(&mut self, command: &Command) -> Result<TickOutput, CommandError> {
        let now = self.clock.now();
        match (command.system.as_str(), command.action.as_str()) {
            ("security", "arm") => {
                Ok(self
                    .monitor
                    .set_enabled(true, now, to_chrono(self.config.start_delay)))
            }
            ("security", "disarm") => {
                Ok(self
                    .monitor
                    .set_enabled(false, now, to_chrono(self.config.start_delay)))
            }
            ("camera", "move") => {
                let (name, direction) = match command.args.as_slice() {
                    [name, direction] => (name, direction),
                    _ => {
                        return Err(CommandError::BadArgument {
                            command: command.to_string(),
                            reason: "expected <camera> <direction>".to_string(),
                        })
                    }
                };
                let direction: PtzDirection =
                    direction.parse().map_err(|reason| CommandError::BadArgument {
                        command: command.to_string(),
                        reason,
                    })?;
                let camera =
                    self.registry
                        .camera(name)
                        .ok_or_else(|| CommandError::BadArgument {
                            command: command.to_string(),
                            reason: format!("unknown camera '{name}'"),
                        })?;
                if let Err(e) = self.deps.frames.move_camera(&camera.address, direction).await {
                    tracing::warn!(name = %name, error = %e, "camera move failed");
                }
                Ok(TickOutput::default())
            }
            ("schedule", "remove") => {
                let name = command.args.first().ok_or_else(|| CommandError::BadArgument {
                    command: command.to_string(),
                    reason: "expected <name>".to_string(),
                })?;
                self.scheduler.remove(name);
                Ok(TickOutput {
                    changed: true,
                    ..TickOutput::default()
                })
            }
            ("host", "save") => Ok(TickOutput {
                changed: true,
                ..TickOutput::default()
            }),
            ("security" | "camera" | "schedule" | "host", action) => Err(
                CommandError::UnknownAction(command.system.clone(), action.to_string()),
            ),
            (system, _) => Err(CommandError::UnknownSystem(system.to_string())),
        }
    }

    async fn send_alerts(&self, alerts: &[String]) {
        for message in alerts {
            if let Err(e) = self.deps.notify.send_alert(message, &[], false).await {
                tracing::error!(error = %e, "alert delivery failed");
            }
        }
    }

    fn mark_changed(&mut self) {
        let now = self.clock.now();
        self.changed = true;
        self.persist(now);
    }

    /// Forward events, then persist once when anything changed
    fn finish(&mut self, now: DateTime<Utc>, output: TickOutput) {
        for event in output.events {
            let _ = self.events.send(event);
        }
        if output.changed {
            self.changed = true;
        }
        if self.changed {
            self.persist(now);
        }
    }

    /// A failed save keeps the changed flag so the next tick retries
    fn persist(&mut self, now: DateTime<Utc>) {
        match self.snapshot(now) {
            Ok(()) => self.changed = false,
            Err(e) => tracing::error!(error = %e, "state save failed, will retry"),
        }
    }

    fn snapshot(&self, now: DateTime<Utc>) -> Result<(), StateError> {
        let mut document = StateDocument::default();
        document.set(DEVICES_BLOB, &self.registry)?;
        document.set(SECURITY_BLOB, self.monitor.state())?;
        document.set(SCHEDULE_BLOB, self.scheduler.list())?;
        self.state_file.save(&document, now)
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
