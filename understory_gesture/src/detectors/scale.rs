// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};

/// Tracks the focal point and span of two or more pointers.
///
/// The focal point is the pointers' centroid. The span is the diagonal of the
/// pointers' average deviation from it, which for exactly two pointers is the
/// distance between them.
///
/// ```rust
/// use kurbo::Point;
/// use understory_gesture::ScaleDetector;
///
/// let mut detector = ScaleDetector::new();
/// detector.start(&[Point::new(0.0, 0.0), Point::new(30.0, 40.0)], 0);
/// assert_eq!(detector.span(), 50.0);
/// detector.update(&[Point::new(0.0, 0.0), Point::new(60.0, 80.0)], 20);
/// assert_eq!(detector.scale_factor(), 2.0);
/// assert_eq!(detector.span_velocity(), Some(2500.0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScaleDetector {
    focus: Point,
    span: f64,
    previous_span: f64,
    initial_span: f64,
    current_time: u64,
    previous_time: u64,
    in_progress: bool,
}

/// Centroid and span of a point set, if it has at least two points.
fn geometry(points: &[Point]) -> Option<(Point, f64)> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let focus = (points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2()) / n).to_point();
    let deviation = points.iter().fold(Vec2::ZERO, |acc, p| {
        let d = *p - focus;
        acc + Vec2::new(d.x.abs(), d.y.abs())
    }) / n;
    Some((focus, (deviation * 2.0).hypot()))
}

impl ScaleDetector {
    /// Creates an idle detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking from the given positions.
    ///
    /// Returns `false` (and stays idle) with fewer than two points.
    pub fn start(&mut self, points: &[Point], time: u64) -> bool {
        let Some((focus, span)) = geometry(points) else {
            self.in_progress = false;
            return false;
        };
        self.focus = focus;
        self.span = span;
        self.previous_span = span;
        self.initial_span = span;
        self.current_time = time;
        self.previous_time = time;
        self.in_progress = true;
        true
    }

    /// Feeds new positions of the same pointer set.
    ///
    /// Fewer than two points finish the detector. An idle detector starts.
    pub fn update(&mut self, points: &[Point], time: u64) {
        if !self.in_progress {
            self.start(points, time);
            return;
        }
        let Some((focus, span)) = geometry(points) else {
            self.finish();
            return;
        };
        self.previous_span = self.span;
        self.previous_time = self.current_time;
        self.focus = focus;
        self.span = span;
        self.current_time = time;
    }

    /// Re-measures after pointers were added or removed, without reporting a
    /// change in span.
    pub fn rebase(&mut self, points: &[Point], time: u64) {
        self.start(points, time);
    }

    /// Stops tracking; the last focal point stays available.
    pub fn finish(&mut self) {
        self.in_progress = false;
        self.previous_span = self.span;
    }

    /// Forgets everything.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether at least two pointers are being tracked.
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Centroid of the pointers.
    pub fn focus(&self) -> Point {
        self.focus
    }

    /// Current span.
    pub fn span(&self) -> f64 {
        self.span
    }

    /// Span when tracking last (re)started.
    pub fn initial_span(&self) -> f64 {
        self.initial_span
    }

    /// Ratio of the current span to the previous one; 1.0 when undefined.
    pub fn scale_factor(&self) -> f64 {
        if self.in_progress && self.previous_span > 0.0 {
            self.span / self.previous_span
        } else {
            1.0
        }
    }

    /// Change in span per second over the last update.
    pub fn span_velocity(&self) -> Option<f64> {
        let dt = self.time_delta();
        (dt > 0).then(|| (self.span - self.previous_span) / dt as f64 * 1000.0)
    }

    /// Milliseconds between the last two updates.
    pub fn time_delta(&self) -> u64 {
        self.current_time.saturating_sub(self.previous_time)
    }
}
