// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use hearth_core::CameraAddress;
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT};

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    // Split stream for reading/writing
    let (mut reader, mut writer) = stream.into_split();

    // Read request with timeout
    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);

    // Handle request
    let response = handle_request(daemon, request).await;

    debug!("Sending response: {:?}", response);

    // Write response with timeout
    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

/// Handle a single request and return a response
async fn handle_request(daemon: &mut DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => Response::Status {
            status: daemon.runtime.status(),
            uptime_secs: daemon.start_time.elapsed().as_secs(),
        },

        Request::Push { token, samples } => match daemon.runtime.push(&token, &samples).await {
            Ok(changed) => Response::Pushed { changed },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::SetSecurity { enabled } => Response::Security {
            phase: daemon.runtime.set_security(enabled),
        },

        Request::History => Response::History {
            entries: daemon.runtime.history(),
        },

        Request::ScheduleAdd { entry } => {
            daemon.runtime.schedule_add(entry);
            Response::Ok
        }

        Request::ScheduleList => Response::Schedule {
            entries: daemon.runtime.schedule_entries().to_vec(),
        },

        Request::ScheduleRemove { name } => Response::Removed {
            count: daemon.runtime.schedule_remove(&name),
        },

        Request::DeviceAddSensor {
            name,
            address,
            kind,
        } => match daemon.runtime.add_sensor(&name, &address, kind) {
            Ok(token) => Response::Token { token },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::DeviceAddCamera { name, address } => {
            let address: CameraAddress = match address.parse() {
                Ok(a) => a,
                Err(e) => {
                    return Response::Error {
                        message: e.to_string(),
                    }
                }
            };
            match daemon.runtime.add_camera(&name, address) {
                Ok(()) => Response::Ok,
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            }
        }

        Request::DeviceRemove { name } => match daemon.runtime.remove_device(&name) {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::DeviceRename { old, new } => match daemon.runtime.rename_device(&old, &new) {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::DeviceList => Response::Devices {
            devices: daemon.runtime.devices(),
        },

        Request::LatestData { name } => match daemon.runtime.latest_data(&name) {
            Some(values) => Response::Latest { values },
            None => Response::Error {
                message: format!("Sensor not found: {}", name),
            },
        },

        Request::CameraImage { name } => match daemon.runtime.get_image(&name).await {
            Ok(frame) => match encode_jpeg(&frame) {
                Ok(jpeg) => Response::Frame { jpeg },
                Err(e) => Response::Error {
                    message: e.to_string(),
                },
            },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

fn encode_jpeg(frame: &image::RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut jpeg = Vec::new();
    frame.write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)?;
    Ok(jpeg)
}

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Request read timeout")]
    Timeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),
}
