// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame comparison for motion detection
//!
//! Two frames are compared by subtracting their grayscale versions,
//! binarizing the difference at a fixed intensity threshold, and flagging
//! motion when the mean of the binarized difference exceeds ~1% of full
//! intensity.

use image::{GrayImage, Rgb, RgbImage};

/// Per-pixel intensity delta below which a difference is noise
pub const BINARIZE_THRESHOLD: u8 = 32;

/// Mean binarized difference (fraction of full intensity) that counts as
/// motion
pub const MOTION_RATIO: f64 = 0.01;

/// Mean of the binarized difference between two frames, or None when the
/// frames cannot be compared (different dimensions).
pub fn movement_level(baseline: &GrayImage, frame: &GrayImage) -> Option<f64> {
    if baseline.dimensions() != frame.dimensions() {
        return None;
    }
    let pixels = (baseline.width() * baseline.height()) as f64;
    if pixels == 0.0 {
        return None;
    }

    let mut sum = 0u64;
    for (a, b) in baseline.pixels().zip(frame.pixels()) {
        if a.0[0].abs_diff(b.0[0]) > BINARIZE_THRESHOLD {
            sum += 255;
        }
    }
    Some(sum as f64 / pixels)
}

/// Returns the movement level when it exceeds the motion threshold
pub fn find_movement(baseline: &GrayImage, frame: &GrayImage) -> Option<f64> {
    movement_level(baseline, frame).filter(|level| *level > MOTION_RATIO * 255.0)
}

pub fn to_gray(frame: &RgbImage) -> GrayImage {
    image::imageops::grayscale(frame)
}

/// A readable stand-in frame (red X on black) returned when a capture is
/// unavailable, so consumers never have to handle a missing image.
pub fn placeholder_frame() -> RgbImage {
    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;
    let red = Rgb([255u8, 0, 0]);

    let mut frame = RgbImage::new(WIDTH, HEIGHT);
    for x in 0..WIDTH {
        let y = x * HEIGHT / WIDTH;
        for dy in 0..2 {
            let y = (y + dy).min(HEIGHT - 1);
            frame.put_pixel(x, y, red);
            frame.put_pixel(x, HEIGHT - 1 - y, red);
        }
    }
    frame
}

#[cfg(test)]
#[path = "vision_tests.rs"]
mod tests;
