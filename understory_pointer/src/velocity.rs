// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Least-squares velocity estimation.
//!
//! Naive two-sample differencing is dominated by touch-sampling jitter, so the
//! estimator instead fits a low-degree polynomial (degree 2 by default) to each
//! axis of a pointer's recent history and reports the derivative at the newest
//! sample. Samples are taken newest first and collection stops at the first
//! sample that is older than the horizon, or that is separated from its
//! successor by a pause longer than `assume_stopped_ms`.

use alloc::vec::Vec;

use kurbo::Vec2;

use crate::lsq::LeastSquaresSolver;
use crate::tracker::{Pointer, Sample};

/// How samples are weighted in the fit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Every sample counts the same.
    Uniform,
    /// Weight falls off linearly from 1.0 at the newest sample to 0.5 at the horizon.
    #[default]
    Recency,
}

/// Tunables for [`VelocityEstimator`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VelocityConfig {
    /// Polynomial degree of the fit.
    pub degree: usize,
    /// Samples older than this (relative to the newest) are ignored.
    pub horizon_ms: u64,
    /// A gap between consecutive samples longer than this ends collection.
    pub assume_stopped_ms: u64,
    /// Minimum number of samples; the effective minimum is never below `degree + 1`.
    pub min_samples: usize,
    /// Sample weighting.
    pub weighting: Weighting,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            degree: 2,
            horizon_ms: 100,
            assume_stopped_ms: 40,
            min_samples: 3,
            weighting: Weighting::Recency,
        }
    }
}

/// Estimates pointer velocity in units per second.
#[derive(Clone, Debug, Default)]
pub struct VelocityEstimator {
    config: VelocityConfig,
}

impl VelocityEstimator {
    /// Creates an estimator with the given configuration.
    pub fn new(config: VelocityConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &VelocityConfig {
        &self.config
    }

    /// Estimates the velocity of a tracked pointer.
    ///
    /// Returns `None` when the history is too short or degenerate; callers
    /// are expected to fall back to zero or a previously known value.
    pub fn estimate(&self, pointer: &Pointer) -> Option<Vec2> {
        self.estimate_samples(pointer.history())
    }

    /// Estimates velocity from samples ordered oldest to newest.
    pub fn estimate_samples<'a, I>(&self, samples: I) -> Option<Vec2>
    where
        I: IntoIterator<Item = &'a Sample>,
        I::IntoIter: DoubleEndedIterator,
    {
        let config = &self.config;
        let mut iter = samples.into_iter().rev();
        let newest_ref: &'a Sample = iter.next()?;
        let newest = *newest_ref;

        let mut t = Vec::new();
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut w = Vec::new();
        let mut previous = newest;
        for sample in core::iter::once(newest_ref).chain(iter) {
            let age = newest.timestamp.saturating_sub(sample.timestamp);
            let gap = previous.timestamp.abs_diff(sample.timestamp);
            if age > config.horizon_ms || gap > config.assume_stopped_ms {
                break;
            }
            previous = *sample;
            t.push(-(age as f64));
            x.push(sample.position.x);
            y.push(sample.position.y);
            w.push(self.weight(age));
        }

        if t.len() < config.min_samples.max(config.degree + 1) {
            return None;
        }

        let fit_x = LeastSquaresSolver::new(&t, &x, &w).solve(config.degree)?;
        let fit_y = LeastSquaresSolver::new(&t, &y, &w).solve(config.degree)?;
        // Derivative at t = 0 (the newest sample), per millisecond.
        let per_ms = Vec2::new(
            fit_x.coefficients.get(1).copied().unwrap_or(0.0),
            fit_y.coefficients.get(1).copied().unwrap_or(0.0),
        );
        let velocity = per_ms * 1000.0;
        velocity.is_finite().then_some(velocity)
    }

    fn weight(&self, age: u64) -> f64 {
        match self.config.weighting {
            Weighting::Uniform => 1.0,
            Weighting::Recency if self.config.horizon_ms == 0 => 1.0,
            Weighting::Recency => 1.0 - 0.5 * age as f64 / self.config.horizon_ms as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PointerEvent, PointerId, PointerTracker};
    use kurbo::Point;

    fn trace(points: &[(f64, f64, u64)]) -> Vec<Sample> {
        points
            .iter()
            .map(|&(x, y, timestamp)| Sample {
                position: Point::new(x, y),
                timestamp,
            })
            .collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn constant_velocity_converges() {
        // 300 px/s right, 120 px/s down, sampled every 8ms.
        let samples: Vec<Sample> = (0..8_u32)
            .map(|i| Sample {
                position: Point::new(10.0 + 2.4 * f64::from(i), 5.0 + 0.96 * f64::from(i)),
                timestamp: 1000 + u64::from(i) * 8,
            })
            .collect();
        let v = VelocityEstimator::default()
            .estimate_samples(&samples)
            .unwrap();
        assert!(close(v.x, 300.0), "{v:?}");
        assert!(close(v.y, 120.0), "{v:?}");
    }

    #[test]
    fn three_samples_are_enough() {
        let samples = trace(&[(0.0, 0.0, 0), (1.0, 0.0, 10), (2.0, 0.0, 20)]);
        let v = VelocityEstimator::default()
            .estimate_samples(&samples)
            .unwrap();
        assert!(close(v.x, 100.0));
    }

    #[test]
    fn single_sample_is_unavailable() {
        let samples = trace(&[(3.0, 4.0, 10)]);
        assert!(
            VelocityEstimator::default()
                .estimate_samples(&samples)
                .is_none()
        );
    }

    #[test]
    fn empty_history_is_unavailable() {
        let samples: [Sample; 0] = [];
        assert!(
            VelocityEstimator::default()
                .estimate_samples(&samples)
                .is_none()
        );
    }

    #[test]
    fn identical_timestamps_are_unavailable() {
        let samples = trace(&[(0.0, 0.0, 50), (5.0, 1.0, 50), (9.0, 3.0, 50), (12.0, 4.0, 50)]);
        assert!(
            VelocityEstimator::default()
                .estimate_samples(&samples)
                .is_none()
        );
    }

    #[test]
    fn identical_samples_are_unavailable() {
        let samples = trace(&[(1.0, 1.0, 5); 6]);
        assert!(
            VelocityEstimator::default()
                .estimate_samples(&samples)
                .is_none()
        );
    }

    #[test]
    fn pause_cuts_off_history() {
        // Old fast motion, a long pause, then three slow samples.
        let samples = trace(&[
            (0.0, 0.0, 0),
            (50.0, 0.0, 10),
            (100.0, 0.0, 20),
            (100.0, 0.0, 80),
            (101.0, 0.0, 90),
            (102.0, 0.0, 100),
        ]);
        let v = VelocityEstimator::default()
            .estimate_samples(&samples)
            .unwrap();
        assert!(close(v.x, 100.0), "{v:?}");
    }

    #[test]
    fn horizon_limits_history() {
        let config = VelocityConfig {
            horizon_ms: 20,
            ..VelocityConfig::default()
        };
        // Only the last three samples fall within 20ms of the newest.
        let samples = trace(&[(0.0, 0.0, 0), (0.0, 0.0, 30), (0.0, 1.0, 40), (0.0, 2.0, 50)]);
        let estimator = VelocityEstimator::new(config);
        let v = estimator.estimate_samples(&samples).unwrap();
        assert!(close(v.y, 100.0), "{v:?}");

        let short = VelocityConfig {
            horizon_ms: 10,
            ..config
        };
        assert!(
            VelocityEstimator::new(short)
                .estimate_samples(&samples)
                .is_none()
        );
    }

    #[test]
    fn uniform_weighting_matches_on_linear_motion() {
        let samples = trace(&[(0.0, 0.0, 0), (4.0, 0.0, 10), (8.0, 0.0, 20), (12.0, 0.0, 30)]);
        let config = VelocityConfig {
            weighting: Weighting::Uniform,
            ..VelocityConfig::default()
        };
        let v = VelocityEstimator::new(config)
            .estimate_samples(&samples)
            .unwrap();
        assert!(close(v.x, 400.0));
    }

    #[test]
    fn estimates_tracked_pointer() {
        let id = PointerId(3);
        let mut tracker = PointerTracker::new();
        tracker.add(&PointerEvent::down(id, Point::new(0.0, 100.0), 0));
        for i in 1..=4_u32 {
            tracker.update(&PointerEvent::moved(
                id,
                Point::new(0.0, 100.0 - 3.0 * f64::from(i)),
                u64::from(i) * 10,
            ));
        }
        let v = VelocityEstimator::default()
            .estimate(tracker.get(id).unwrap())
            .unwrap();
        assert!(close(v.x, 0.0));
        assert!(close(v.y, -300.0));
    }
}
