//! Integration tests for gradient continuity and segment linearity.

use doomsday_core::{Rgb, color_for_days};

const ANCHORS: [(f64, f64, Rgb, Rgb); 4] = [
    (3.0, 7.0, Rgb::RED, Rgb::ORANGE),
    (7.0, 14.0, Rgb::ORANGE, Rgb::AMBER),
    (14.0, 21.0, Rgb::AMBER, Rgb::YELLOW),
    (21.0, 28.0, Rgb::YELLOW, Rgb::GREEN),
];

fn distance(a: Rgb, b: Rgb) -> f64 {
    (a.red - b.red).abs() + (a.green - b.green).abs() + (a.blue - b.blue).abs()
}

#[test]
fn color_gradient_tests_segments_are_straight_lines() {
    for (lower, upper, start, end) in ANCHORS {
        let mut days = lower;
        while days < upper {
            let fraction = (days - lower) / (upper - lower);
            let expected = start.shift(end, fraction);
            assert!(
                distance(color_for_days(days), expected) < 1e-9,
                "days = {days}"
            );
            days += 0.25;
        }
    }
}

#[test]
fn color_gradient_tests_boundaries_are_continuous() {
    for boundary in [7.0, 14.0, 21.0, 28.0] {
        let before = color_for_days(boundary - 1e-9);
        let at = color_for_days(boundary);
        assert!(distance(before, at) < 1e-5, "jump at day {boundary}");
    }
}

#[test]
fn color_gradient_tests_red_floor_below_three_days() {
    for days in [0.0, 1.0, 2.0, 2.99] {
        assert_eq!(color_for_days(days), Rgb::RED);
    }
}
