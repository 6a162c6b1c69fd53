// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::f64::consts::{PI, TAU};

use kurbo::Point;

/// Squared distances below this leave the angle undefined.
const MIN_SEPARATION_SQ: f64 = 1e-12;

/// Tracks the angle of the line through two key pointers.
///
/// Angles follow screen coordinates (y down), so a positive rotation is
/// clockwise on screen. Each update reports the smallest signed angle between
/// the previous and current line direction, so crossing the `±π` seam does not
/// produce a jump.
///
/// ```rust
/// use kurbo::Point;
/// use understory_gesture::RotationDetector;
///
/// let mut detector = RotationDetector::new();
/// detector.start(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0);
/// detector.update(Point::new(0.0, 0.0), Point::new(0.0, 10.0), 16);
/// assert!((detector.total() - core::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// assert_eq!(detector.anchor(), Some(Point::new(0.0, 5.0)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RotationDetector {
    previous_angle: Option<f64>,
    rotation: f64,
    total: f64,
    anchor: Option<Point>,
    previous_time: u64,
    current_time: u64,
    in_progress: bool,
}

impl RotationDetector {
    /// Creates an idle detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new rotation from the two key pointer positions.
    ///
    /// The accumulated rotation restarts at zero; the cached anchor is replaced.
    pub fn start(&mut self, first: Point, second: Point, time: u64) {
        self.in_progress = true;
        self.previous_angle = None;
        self.rotation = 0.0;
        self.total = 0.0;
        self.previous_time = time;
        self.current_time = time;
        self.sample(first, second);
    }

    /// Feeds the current key pointer positions and returns the incremental rotation.
    ///
    /// An idle detector starts instead and reports zero.
    pub fn update(&mut self, first: Point, second: Point, time: u64) -> f64 {
        if !self.in_progress {
            self.start(first, second, time);
            return 0.0;
        }
        self.previous_time = self.current_time;
        self.current_time = time;
        self.sample(first, second);
        self.rotation
    }

    fn sample(&mut self, first: Point, second: Point) {
        self.anchor = Some(first.midpoint(second));
        let line = second - first;
        if line.hypot2() < MIN_SEPARATION_SQ {
            // Coincident pointers: keep the last direction.
            self.rotation = 0.0;
            return;
        }
        let angle = line.atan2();
        self.rotation = match self.previous_angle {
            Some(previous) => wrap(angle - previous),
            None => 0.0,
        };
        self.total += self.rotation;
        self.previous_angle = Some(angle);
    }

    /// Stops tracking. The anchor stays cached so payloads remain defined.
    pub fn finish(&mut self) {
        self.in_progress = false;
        self.rotation = 0.0;
    }

    /// Forgets everything, including the cached anchor.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether a rotation is being tracked.
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Rotation reported by the last update, in radians.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Rotation accumulated since [`start`](Self::start), in radians.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Midpoint of the key pointers in the last valid frame.
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Milliseconds between the last two updates.
    pub fn time_delta(&self) -> u64 {
        self.current_time.saturating_sub(self.previous_time)
    }
}

/// Maps an angle difference into `(-π, π]`.
fn wrap(delta: f64) -> f64 {
    if delta > PI {
        delta - TAU
    } else if delta <= -PI {
        delta + TAU
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_4;
    use kurbo::Vec2;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn on_circle(angle: f64, radius: f64) -> Point {
        Point::new(100.0, 100.0) + Vec2::from_angle(angle) * radius
    }

    #[test]
    fn accumulates_small_steps() {
        let center = Point::new(100.0, 100.0);
        let mut detector = RotationDetector::new();
        detector.start(center, on_circle(0.0, 50.0), 0);
        for step in 1..=8_u32 {
            let angle = f64::from(step) * 0.1;
            let delta = detector.update(center, on_circle(angle, 50.0), u64::from(step) * 10);
            assert!(close(delta, 0.1));
        }
        assert!(close(detector.total(), 0.8));
        assert_eq!(detector.time_delta(), 10);
    }

    #[test]
    fn crossing_the_seam_does_not_jump() {
        let center = Point::new(100.0, 100.0);
        let mut detector = RotationDetector::new();
        detector.start(center, on_circle(PI - 0.05, 10.0), 0);
        let delta = detector.update(center, on_circle(-PI + 0.05, 10.0), 10);
        assert!(close(delta, 0.1), "{delta}");

        // And back the other way.
        let delta = detector.update(center, on_circle(PI - 0.05, 10.0), 20);
        assert!(close(delta, -0.1), "{delta}");
        assert!(close(detector.total(), 0.0));
    }

    #[test]
    fn anchor_is_cached_after_finish() {
        let mut detector = RotationDetector::new();
        detector.start(Point::new(0.0, 0.0), Point::new(20.0, 20.0), 0);
        detector.update(Point::new(0.0, 0.0), Point::new(0.0, 20.0), 5);
        assert!(close(detector.total(), FRAC_PI_4));
        detector.finish();
        assert!(!detector.is_in_progress());
        assert_eq!(detector.anchor(), Some(Point::new(0.0, 10.0)));

        detector.reset();
        assert_eq!(detector.anchor(), None);
    }

    #[test]
    fn coincident_pointers_keep_direction() {
        let mut detector = RotationDetector::new();
        detector.start(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 0);
        assert_eq!(detector.update(Point::new(5.0, 0.0), Point::new(5.0, 0.0), 5), 0.0);
        // The next real frame is measured against the last defined direction.
        let delta = detector.update(Point::new(0.0, 0.0), Point::new(10.0, 10.0), 10);
        assert!(close(delta, FRAC_PI_4));
    }

    #[test]
    fn idle_update_starts() {
        let mut detector = RotationDetector::new();
        assert_eq!(detector.update(Point::ZERO, Point::new(1.0, 1.0), 0), 0.0);
        assert!(detector.is_in_progress());
    }

    #[test]
    fn wrap_bounds() {
        assert!(close(wrap(PI + 0.5), -PI + 0.5));
        assert!(close(wrap(-PI - 0.5), PI - 0.5));
        assert!(close(wrap(PI), PI));
        assert!(close(wrap(-PI), PI));
    }
}
