// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Camera frame sources
//!
//! A frame source grabs single frames; streaming consumers outside this core
//! share the same adapter, which is why implementations must tolerate
//! concurrent grabs for one camera.

mod ffmpeg;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeFrameSource, FrameCall};

pub use ffmpeg::FfmpegFrameSource;

use async_trait::async_trait;
use hearth_core::{CameraAddress, PtzDirection};
use image::RgbImage;
use thiserror::Error;

/// Errors from camera operations
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("grab timed out")]
    Timeout,
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Adapter for grabbing frames and moving pan-tilt-zoom cameras
#[async_trait]
pub trait FrameSource: Clone + Send + Sync + 'static {
    /// Grab one frame from the camera
    async fn grab(&self, address: &CameraAddress) -> Result<RgbImage, CameraError>;

    /// Move the camera. Implementations without PTZ support log and succeed;
    /// callers must never treat movement as fatal.
    async fn move_camera(
        &self,
        address: &CameraAddress,
        direction: PtzDirection,
    ) -> Result<(), CameraError>;
}
