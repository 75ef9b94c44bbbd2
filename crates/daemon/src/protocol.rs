// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol for the control socket.
//!
//! Messages are JSON, framed with a 4-byte big-endian length prefix.
//! One request/response pair per connection.

use std::collections::BTreeMap;
use std::time::Duration;

use hearth_core::{AlarmPhase, ReadingSample, ScheduleEntry, SensorKind, Value};
use hearth_engine::{DeviceSummary, StatusSnapshot};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default timeout for reading/writing a single message
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Refuse frames larger than this (corrupt prefix or misbehaving client)
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Requests a client can send to the daemon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Liveness check
    Ping,
    /// Daemon status summary
    Status,
    /// Ingest sensor data on behalf of a device
    Push {
        token: String,
        samples: Vec<ReadingSample>,
    },
    /// Arm or disarm the security system
    SetSecurity { enabled: bool },
    /// Security event history, oldest first
    History,
    /// Add a schedule entry
    ScheduleAdd { entry: ScheduleEntry },
    /// List schedule entries
    ScheduleList,
    /// Remove every schedule entry with this name
    ScheduleRemove { name: String },
    /// Register a sensor; responds with its push token
    DeviceAddSensor {
        name: String,
        address: String,
        kind: SensorKind,
    },
    /// Register a camera
    DeviceAddCamera { name: String, address: String },
    /// Remove a device and its readings
    DeviceRemove { name: String },
    /// Rename a device, keeping its readings and token
    DeviceRename { old: String, new: String },
    /// List registered devices
    DeviceList,
    /// Latest stored value per subchannel of one sensor
    LatestData { name: String },
    /// One frame from a camera, JPEG-encoded
    CameraImage { name: String },
    /// Request graceful shutdown
    Shutdown,
}

/// Responses the daemon sends back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Pong,
    Ok,
    Status {
        status: StatusSnapshot,
        uptime_secs: u64,
    },
    Pushed {
        changed: bool,
    },
    Security {
        phase: AlarmPhase,
    },
    History {
        entries: Vec<String>,
    },
    Schedule {
        entries: Vec<ScheduleEntry>,
    },
    Removed {
        count: usize,
    },
    Token {
        token: String,
    },
    Devices {
        devices: Vec<DeviceSummary>,
    },
    Latest {
        values: BTreeMap<String, Value>,
    },
    Frame {
        jpeg: Vec<u8>,
    },
    ShuttingDown,
    Error {
        message: String,
    },
}

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Timed out waiting for message")]
    Timeout,

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize a message to raw JSON (no length prefix)
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message from raw JSON
pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Write a length-prefixed frame
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ProtocolError::MessageTooLarge(payload.len()))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read a length-prefixed frame
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Read one request with a timeout
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let payload = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&payload)
}

/// Write one response with a timeout
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let payload = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &payload))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
