// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use fs2::FileExt;
use hearth_adapters::{FfmpegFrameSource, NetProbe, NoOpAlertAdapter};
use hearth_core::{Event, SystemClock};
use hearth_engine::{Runtime, RuntimeDeps, RuntimeError};
use hearth_storage::{SettingsError, SettingsFile, StateFile};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Daemon runtime with concrete adapter types
pub type DaemonRuntime = Runtime<SystemClock, NetProbe, FfmpegFrameSource, NoOpAlertAdapter>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding everything the hub owns
    pub data_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to persisted hub state
    pub state_path: PathBuf,
    /// Path to hub settings
    pub settings_path: PathBuf,
}

impl Config {
    /// Create config rooted at a data directory
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            socket_path: data_dir.join("hearthd.sock"),
            lock_path: data_dir.join("hearthd.pid"),
            log_path: data_dir.join("hearthd.log"),
            state_path: data_dir.join("state.json"),
            settings_path: data_dir.join("settings.toml"),
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// The hub runtime
    pub runtime: DaemonRuntime,
    /// Events produced by the runtime, drained into the log
    pub events: mpsc::UnboundedReceiver<Event>,
    /// When daemon started
    pub start_time: Instant,
    /// Shutdown requested flag
    pub shutdown_requested: bool,
}

impl DaemonState {
    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Let in-flight device reads land and persist state
        self.runtime.shutdown().await;

        // 2. Remove socket file
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 3. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine data directory (set HEARTH_HOME or HOME)")]
    NoDataDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create data directory (needed for socket, lock, state)
    std::fs::create_dir_all(&config.data_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = File::create(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Reborrow as immutable

    // 3. Load settings BEFORE binding socket (fail fast on a broken file)
    let mut settings = SettingsFile::new(&config.settings_path).load()?;

    // Evidence files land inside the data directory unless configured absolute
    if settings.evidence_dir.is_relative() {
        settings.evidence_dir = config.data_dir.join(&settings.evidence_dir);
    }

    // 4. Build the runtime from persisted state
    let state_file = StateFile::new(&config.state_path);
    let deps = RuntimeDeps {
        probe: NetProbe::new(),
        frames: FfmpegFrameSource::new(),
        notify: NoOpAlertAdapter,
    };
    let (runtime, events) = Runtime::new(settings, SystemClock, deps, state_file)?;

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("Daemon started in {}", config.data_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        runtime,
        events,
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Resolve the data directory: explicit argument, then HEARTH_HOME,
/// then ~/.hearth
pub fn data_dir(arg: Option<&str>) -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = arg {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(dir) = std::env::var("HEARTH_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoDataDir)?;
    Ok(PathBuf::from(home).join(".hearth"))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
