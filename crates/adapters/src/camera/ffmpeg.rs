// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame grabbing via an ffmpeg subprocess
//!
//! One invocation per frame keeps the hub free of native codec dependencies;
//! the capture-handle lifecycle (backoff, idle release) is tracked by the
//! engine, not here.

use super::{CameraError, FrameSource};
use async_trait::async_trait;
use hearth_core::{CameraAddress, PtzDirection};
use image::RgbImage;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const GRAB_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
pub struct FfmpegFrameSource;

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self
    }

    fn input_args(address: &CameraAddress) -> Vec<String> {
        match address {
            CameraAddress::Device(index) => vec![
                "-f".into(),
                "v4l2".into(),
                "-i".into(),
                format!("/dev/video{index}"),
            ],
            CameraAddress::Stream(url) => {
                let mut args = Vec::new();
                if url.starts_with("rtsp://") {
                    args.extend(["-rtsp_transport".into(), "tcp".into()]);
                }
                args.extend(["-i".into(), url.clone()]);
                args
            }
            CameraAddress::Credentials {
                username,
                password,
                host,
                port,
            } => vec![
                "-rtsp_transport".into(),
                "tcp".into(),
                "-i".into(),
                format!("rtsp://{username}:{password}@{host}:{port}"),
            ],
        }
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn grab(&self, address: &CameraAddress) -> Result<RgbImage, CameraError> {
        let mut command = Command::new("ffmpeg");
        command
            .arg("-nostdin")
            .args(["-loglevel", "error"])
            .args(Self::input_args(address))
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(GRAB_TIMEOUT, command.output())
            .await
            .map_err(|_| CameraError::Timeout)?
            .map_err(|e| CameraError::Capture(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CameraError::Capture(stderr.trim().to_string()));
        }

        let frame = image::load_from_memory(&output.stdout)
            .map_err(|e| CameraError::Decode(e.to_string()))?;
        Ok(frame.to_rgb8())
    }

    async fn move_camera(
        &self,
        address: &CameraAddress,
        direction: PtzDirection,
    ) -> Result<(), CameraError> {
        // single-frame grabbing has no PTZ channel; movement is best-effort
        tracing::warn!(%address, ?direction, "PTZ not supported by this frame source");
        Ok(())
    }
}

#[cfg(test)]
#[path = "ffmpeg_tests.rs"]
mod tests;
