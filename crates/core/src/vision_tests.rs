use super::*;
use image::Luma;

fn flat(width: u32, height: u32, intensity: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([intensity]))
}

#[test]
fn identical_frames_have_zero_level() {
    let frame = flat(64, 48, 100);
    assert_eq!(movement_level(&frame, &frame), Some(0.0));
    assert!(find_movement(&frame, &frame).is_none());
}

#[test]
fn small_intensity_shift_is_noise() {
    let baseline = flat(64, 48, 100);
    let frame = flat(64, 48, 120);

    // 20 < binarize threshold, whole frame still counts as unchanged
    assert_eq!(movement_level(&baseline, &frame), Some(0.0));
}

#[test]
fn large_shift_on_whole_frame_is_motion() {
    let baseline = flat(64, 48, 20);
    let frame = flat(64, 48, 200);

    let level = find_movement(&baseline, &frame).unwrap();
    assert_eq!(level, 255.0);
}

#[test]
fn motion_needs_more_than_one_percent_of_pixels() {
    let baseline = flat(100, 100, 20);

    // flip 0.5% of pixels hard: below the motion ratio
    let mut frame = baseline.clone();
    for x in 0..50 {
        frame.put_pixel(x, 0, Luma([255]));
    }
    assert!(find_movement(&baseline, &frame).is_none());

    // 2% of pixels: motion
    let mut frame = baseline.clone();
    for i in 0..200u32 {
        frame.put_pixel(i % 100, i / 100, Luma([255]));
    }
    assert!(find_movement(&baseline, &frame).is_some());
}

#[test]
fn mismatched_dimensions_are_not_comparable() {
    let a = flat(64, 48, 0);
    let b = flat(32, 48, 0);
    assert_eq!(movement_level(&a, &b), None);
}

#[test]
fn placeholder_frame_is_non_empty_and_marked() {
    let frame = placeholder_frame();
    assert_eq!(frame.dimensions(), (640, 480));
    // the X runs through the corners
    assert_eq!(*frame.get_pixel(0, 0), Rgb([255, 0, 0]));
    assert_eq!(*frame.get_pixel(0, 479), Rgb([255, 0, 0]));
    // but most of the frame stays black
    assert_eq!(*frame.get_pixel(320, 10), Rgb([0, 0, 0]));
}
