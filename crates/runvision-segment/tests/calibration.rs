use nalgebra::Point2;
use runvision_core::ColorImage;
use runvision_segment::{
    calibrate, track, CalibrationParams, ColorRange, ColorRangeStore, Frame, Target,
};

fn hsv_frame(hsv: ColorImage) -> Frame {
    Frame {
        rgb: hsv.clone(),
        blurred: hsv.clone(),
        hsv,
    }
}

/// HSV frame split into vertical bands with slightly different shades.
fn banded_frame() -> Frame {
    let shades = [
        [100u8, 150u8, 200u8],
        [104, 140, 180],
        [96, 170, 230],
        [110, 120, 160],
    ];
    let mut img = ColorImage::new(160, 60);
    for y in 0..60 {
        for x in 0..160 {
            img.put_pixel(x, y, shades[x / 40]);
        }
    }
    hsv_frame(img)
}

#[test]
fn single_click_on_known_mean_yields_documented_bounds() {
    let frame = hsv_frame(ColorImage::filled(64, 48, [100, 150, 200]));
    let mut store = ColorRangeStore::default();
    let params = CalibrationParams {
        radius: 10,
        threshold: 10.0,
        ..CalibrationParams::default()
    };
    let r = calibrate(&mut store, Target::Track, Point2::new(30, 20), &frame, &params);
    assert_eq!(r.lower, [90, 140, 190]);
    assert_eq!(r.upper, [110, 160, 210]);
}

#[test]
fn bounds_are_monotone_over_a_click_sequence() {
    let frame = banded_frame();
    let params = CalibrationParams::default();
    let mut store = ColorRangeStore::default();

    // Deterministic pseudo-random clicks, some of them off-frame.
    let mut seed = 0x2545_f491_u32;
    let mut prev = *store.get(Target::StepMarker);
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let x = (seed >> 8) % 200;
        let y = (seed >> 20) % 90;
        let p = Point2::new(x as i32 - 20, y as i32 - 15);

        let cur = calibrate(&mut store, Target::StepMarker, p, &frame, &params);
        if prev != ColorRange::EMPTY {
            for c in 0..3 {
                assert!(cur.lower[c] <= prev.lower[c], "lower grew at {p:?}");
                assert!(cur.upper[c] >= prev.upper[c], "upper shrank at {p:?}");
            }
        }
        prev = cur;
    }
    assert!(!store.step_marker.is_empty());
    assert_eq!(store.track, ColorRange::EMPTY);
}

#[test]
fn reset_then_one_click_gives_tight_bounds() {
    let frame = banded_frame();
    let params = CalibrationParams::default();
    let mut store = ColorRangeStore::default();

    calibrate(&mut store, Target::Track, Point2::new(20, 30), &frame, &params);
    calibrate(&mut store, Target::Track, Point2::new(140, 30), &frame, &params);
    assert_eq!(store.track.lower[1], 110);

    store.reset(Target::Track);
    let r = calibrate(&mut store, Target::Track, Point2::new(100, 30), &frame, &params);
    assert_eq!(r.lower, [86, 160, 220]);
    assert_eq!(r.upper, [106, 180, 240]);
}

#[test]
fn calibrated_range_drives_tracker() {
    let mut img = ColorImage::filled(80, 60, [0, 0, 40]);
    for y in 30..60 {
        for x in 10..50 {
            img.put_pixel(x, y, [60, 200, 180]);
        }
    }
    let frame = hsv_frame(img);
    let mut store = ColorRangeStore::default();
    assert!(track(&frame, store.get(Target::Track)).is_none());

    calibrate(
        &mut store,
        Target::Track,
        Point2::new(30, 45),
        &frame,
        &CalibrationParams::default(),
    );
    let c = track(&frame, store.get(Target::Track)).expect("track visible");
    assert!((c.x - 29.5).abs() < 1e-4);
    assert!((c.y - 44.5).abs() < 1e-4);
}
