// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use hearth_core::{AlarmPhase, ReadingSample, ScheduleEntry, SensorKind, Value};
use hearth_daemon::protocol::{self, ProtocolError};
use hearth_daemon::{Request, Response};
use hearth_engine::{DeviceSummary, StatusSnapshot};
use thiserror::Error;
use tokio::net::UnixStream;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("HEARTH_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("HEARTH_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("HEARTH_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("HEARTH_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine data directory (set HEARTH_HOME or HOME)")]
    NoDataDir,
}

/// Resolve the hub data directory: explicit flag, then HEARTH_HOME,
/// then ~/.hearth
pub fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf, ClientError> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var("HEARTH_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoDataDir)?;
    Ok(PathBuf::from(home).join(".hearth"))
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to daemon, auto-starting if not running
    pub fn connect_or_start(data_dir: PathBuf) -> Result<Self, ClientError> {
        match Self::connect(data_dir.clone()) {
            Ok(client) => Ok(client),
            Err(ClientError::DaemonNotRunning) => {
                // Start daemon in background
                let child = start_daemon_background(&data_dir)?;
                // Wait for socket with retry, watching for early exit
                Self::connect_with_retry(data_dir, timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e, &data_dir)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect(data_dir: PathBuf) -> Result<Self, ClientError> {
        let socket_path = data_dir.join("hearthd.sock");

        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        data_dir: PathBuf,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Check if daemon process exited early (startup failure)
            match child.try_wait() {
                Ok(Some(status)) => {
                    // Process exited - startup failed
                    // Poll for startup error in log (filesystem may need to sync)
                    let poll_start = Instant::now();
                    while poll_start.elapsed() < timeout_exit() {
                        if let Some(err) = read_startup_error(&data_dir) {
                            return Err(ClientError::DaemonStartFailed(err));
                        }
                        std::thread::sleep(poll_interval());
                    }
                    // No error found in log, return generic failure
                    return Err(ClientError::DaemonStartFailed(format!(
                        "exited with {}",
                        status
                    )));
                }
                Ok(None) => {
                    // Still running, try to connect
                }
                Err(_) => {
                    // Error checking status, assume still running
                }
            }

            match Self::connect(data_dir.clone()) {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e, &data_dir)),
            }
        }

        // Timeout - check log for startup errors
        Err(wrap_with_startup_error(
            ClientError::DaemonStartTimeout,
            &data_dir,
        ))
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        // Encode and send request with write timeout
        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        // Read response with read timeout
        let response_bytes =
            tokio::time::timeout(read_timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    /// Get hub status and daemon uptime
    pub async fn status(&self) -> Result<(StatusSnapshot, u64), ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                status,
                uptime_secs,
            } => Ok((status, uptime_secs)),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Push sensor readings on behalf of a device
    pub async fn push(
        &self,
        token: &str,
        samples: Vec<ReadingSample>,
    ) -> Result<bool, ClientError> {
        match self
            .send(Request::Push {
                token: token.to_string(),
                samples,
            })
            .await?
        {
            Response::Pushed { changed } => Ok(changed),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Arm or disarm the security system
    pub async fn set_security(&self, enabled: bool) -> Result<AlarmPhase, ClientError> {
        match self.send(Request::SetSecurity { enabled }).await? {
            Response::Security { phase } => Ok(phase),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Security event history, oldest first
    pub async fn history(&self) -> Result<Vec<String>, ClientError> {
        match self.send(Request::History).await? {
            Response::History { entries } => Ok(entries),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Add a schedule entry
    pub async fn schedule_add(&self, entry: ScheduleEntry) -> Result<(), ClientError> {
        match self.send(Request::ScheduleAdd { entry }).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// List schedule entries
    pub async fn schedule_list(&self) -> Result<Vec<ScheduleEntry>, ClientError> {
        match self.send(Request::ScheduleList).await? {
            Response::Schedule { entries } => Ok(entries),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Remove every schedule entry with this name
    pub async fn schedule_remove(&self, name: &str) -> Result<usize, ClientError> {
        match self
            .send(Request::ScheduleRemove {
                name: name.to_string(),
            })
            .await?
        {
            Response::Removed { count } => Ok(count),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Register a sensor, returning its push token
    pub async fn add_sensor(
        &self,
        name: &str,
        address: &str,
        kind: SensorKind,
    ) -> Result<String, ClientError> {
        match self
            .send(Request::DeviceAddSensor {
                name: name.to_string(),
                address: address.to_string(),
                kind,
            })
            .await?
        {
            Response::Token { token } => Ok(token),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Register a camera
    pub async fn add_camera(&self, name: &str, address: &str) -> Result<(), ClientError> {
        match self
            .send(Request::DeviceAddCamera {
                name: name.to_string(),
                address: address.to_string(),
            })
            .await?
        {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Remove a device and its readings
    pub async fn remove_device(&self, name: &str) -> Result<(), ClientError> {
        match self
            .send(Request::DeviceRemove {
                name: name.to_string(),
            })
            .await?
        {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Rename a device, keeping its readings and token
    pub async fn rename_device(&self, old: &str, new: &str) -> Result<(), ClientError> {
        match self
            .send(Request::DeviceRename {
                old: old.to_string(),
                new: new.to_string(),
            })
            .await?
        {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// List registered devices
    pub async fn device_list(&self) -> Result<Vec<DeviceSummary>, ClientError> {
        match self.send(Request::DeviceList).await? {
            Response::Devices { devices } => Ok(devices),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Latest stored value per subchannel of one sensor
    pub async fn latest_data(&self, name: &str) -> Result<BTreeMap<String, Value>, ClientError> {
        match self
            .send(Request::LatestData {
                name: name.to_string(),
            })
            .await?
        {
            Response::Latest { values } => Ok(values),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// One JPEG-encoded frame from a camera
    pub async fn camera_image(&self, name: &str) -> Result<Vec<u8>, ClientError> {
        match self
            .send(Request::CameraImage {
                name: name.to_string(),
            })
            .await?
        {
            Response::Frame { jpeg } => Ok(jpeg),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background(data_dir: &Path) -> Result<std::process::Child, ClientError> {
    // Find the hearthd binary - look in cargo target dir or PATH
    let hearthd_path = find_hearthd_binary();

    Command::new(&hearthd_path)
        .arg(data_dir)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon (graceful first, then forceful)
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop(data_dir: &Path) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(data_dir.to_path_buf()) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            // Clean up any stale files
            cleanup_stale_pid(data_dir);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    // Try graceful shutdown (timeout handled by send())
    let shutdown_result = client.shutdown().await;

    if let Some(pid) = read_daemon_pid(data_dir) {
        if shutdown_result.is_ok() {
            // Graceful shutdown succeeded, wait for process to exit
            wait_for_exit(pid, timeout_exit()).await;
        }

        // Force kill if still running
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    // Clean up stale files
    cleanup_stale_pid(data_dir);

    Ok(true)
}

/// Wait for a process to exit
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the hearthd binary
fn find_hearthd_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("HEARTH_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // First check if we're running from cargo (development)
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let dev_path = PathBuf::from(manifest_dir)
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.join("target/debug/hearthd"));
        if let Some(path) = dev_path {
            if path.exists() {
                return path;
            }
        }
    }

    // Check current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("hearthd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("hearthd")
}

/// Clean up orphaned PID file during shutdown.
///
/// Called by daemon_stop when the daemon is not running or after stopping it.
fn cleanup_stale_pid(data_dir: &Path) {
    let pid_path = data_dir.join("hearthd.pid");
    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(data_dir: &Path) -> Option<u32> {
    let pid_path = data_dir.join("hearthd.pid");
    let content = std::fs::read_to_string(&pid_path).ok()?;
    content.trim().parse::<u32>().ok()
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // Use kill -0 to check if process exists without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Startup marker prefix that daemon writes to log before anything else.
/// Full format: "--- hearthd: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- hearthd: starting (pid: ";

/// Read daemon log from startup marker, looking for errors.
/// Returns the error message if found, None otherwise.
pub fn read_startup_error(data_dir: &Path) -> Option<String> {
    let log_path = data_dir.join("hearthd.log");

    let content = std::fs::read_to_string(&log_path).ok()?;

    // Find the last startup marker
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    // Look for ERROR lines
    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Extract just the error messages (strip timestamp/level prefix)
    let error_messages: Vec<String> = errors
        .iter()
        .filter_map(|line| {
            // Format: "timestamp LEVEL target: message"
            // Find the message part after the last colon-space
            line.split_once(": ").map(|(_, msg)| msg.to_string())
        })
        .collect();

    if error_messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(error_messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available.
/// If the daemon log contains errors, return DaemonStartFailed with that info.
/// Otherwise, return the original error.
fn wrap_with_startup_error(err: ClientError, data_dir: &Path) -> ClientError {
    // Don't double-wrap
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    if let Some(startup_error) = read_startup_error(data_dir) {
        ClientError::DaemonStartFailed(startup_error)
    } else {
        err
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
