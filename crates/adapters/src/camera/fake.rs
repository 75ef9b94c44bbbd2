// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake frame source for tests: scripted frames, recorded calls

use super::{CameraError, FrameSource};
use async_trait::async_trait;
use hearth_core::{CameraAddress, PtzDirection};
use image::{Rgb, RgbImage};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One recorded camera invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameCall {
    Grab { address: String },
    Move { address: String, direction: PtzDirection },
}

#[derive(Clone, Default)]
pub struct FakeFrameSource {
    calls: Arc<Mutex<Vec<FrameCall>>>,
    frames: Arc<Mutex<HashMap<String, VecDeque<Result<RgbImage, String>>>>>,
}

impl FakeFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flat frame of the given intensity, convenient for diff tests
    pub fn flat_frame(intensity: u8) -> RgbImage {
        RgbImage::from_pixel(64, 48, Rgb([intensity, intensity, intensity]))
    }

    /// Queue a frame for the given camera address
    pub fn push_frame(&self, address: &CameraAddress, frame: RgbImage) {
        let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        frames
            .entry(address.to_string())
            .or_default()
            .push_back(Ok(frame));
    }

    /// Queue a capture failure for the given camera address
    pub fn push_failure(&self, address: &CameraAddress, message: &str) {
        let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        frames
            .entry(address.to_string())
            .or_default()
            .push_back(Err(message.to_string()));
    }

    pub fn calls(&self) -> Vec<FrameCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl FrameSource for FakeFrameSource {
    async fn grab(&self, address: &CameraAddress) -> Result<RgbImage, CameraError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FrameCall::Grab {
                address: address.to_string(),
            });

        let next = {
            let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
            frames
                .get_mut(&address.to_string())
                .and_then(VecDeque::pop_front)
        };
        match next {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(message)) => Err(CameraError::Capture(message)),
            None => Err(CameraError::Capture("no scripted frame".to_string())),
        }
    }

    async fn move_camera(
        &self,
        address: &CameraAddress,
        direction: PtzDirection,
    ) -> Result<(), CameraError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(FrameCall::Move {
                address: address.to_string(),
                direction,
            });
        Ok(())
    }
}
