// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pan activation options and their normalization.
//!
//! Pan accepts two generations of options describing the same thresholds:
//! the modern `active_offset_*` / `fail_offset_*` windows, and the deprecated
//! `min_delta_*`, `max_delta_*` and `min_offset_*` props. [`PanProps::normalize`]
//! validates the combination and folds everything into explicit start/end
//! bounds ([`PanConfig`]).
//!
//! Validation runs first, in this order:
//! 1. `min_delta_x` with `active_offset_x`, `max_delta_x` with `fail_offset_x`,
//!    and the same two pairs for y, are rejected. Zero values do not count as
//!    set for this check.
//! 2. Every `[start, end]` range must have `start <= 0` and `end >= 0`.
//!
//! Then the deprecated props are folded in for x (`min_delta`, `max_delta`,
//! `min_offset`), then for y, followed by the modern windows in the order
//! `active_offset_x`, `active_offset_y`, `fail_offset_x`, `fail_offset_y`.
//! Later writes win.
//!
//! ```rust
//! use understory_gesture::{OffsetRange, PanProps};
//!
//! let props = PanProps {
//!     active_offset_x: Some(OffsetRange::Range(-20.0, 20.0)),
//!     fail_offset_y: Some(OffsetRange::Single(5.0)),
//!     ..PanProps::default()
//! };
//! let config = props.normalize().unwrap();
//! assert_eq!(config.active_offset_x_start, Some(-20.0));
//! assert_eq!(config.fail_offset_y_end, Some(5.0));
//! // Custom activation criteria disable the default minimum distance.
//! assert_eq!(config.min_dist_sq, None);
//! ```

use crate::ConfigError;
use crate::config::DEFAULT_TOUCH_SLOP;

/// A single threshold or a `[start, end]` window on one axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OffsetRange {
    /// Negative values bound the start side, other values the end side.
    Single(f64),
    /// Explicit `[start, end]`, with `start <= 0 <= end`.
    Range(f64, f64),
}

impl OffsetRange {
    /// Whether the option counts as set when checking for legacy conflicts.
    ///
    /// A zero threshold does not conflict with anything.
    fn is_set(self) -> bool {
        match self {
            Self::Single(v) => is_set(Some(v)),
            Self::Range(..) => true,
        }
    }

    fn check(self, name: &'static str) -> Result<(), ConfigError> {
        match self {
            Self::Range(start, end) if start > 0.0 || end < 0.0 => {
                Err(ConfigError::InvalidOffsetRange { name, start, end })
            }
            _ => Ok(()),
        }
    }

    fn apply(self, start: &mut Option<f64>, end: &mut Option<f64>) {
        match self {
            Self::Range(s, e) => {
                *start = Some(s);
                *end = Some(e);
            }
            Self::Single(v) if v < 0.0 => *start = Some(v),
            Self::Single(v) => *end = Some(v),
        }
    }
}

fn is_set(value: Option<f64>) -> bool {
    value.is_some_and(|v| v != 0.0 && !v.is_nan())
}

/// Pan options as supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct PanProps {
    /// Horizontal translation that activates the pan.
    pub active_offset_x: Option<OffsetRange>,
    /// Vertical translation that activates the pan.
    pub active_offset_y: Option<OffsetRange>,
    /// Horizontal translation that fails the pan if crossed before activation.
    pub fail_offset_x: Option<OffsetRange>,
    /// Vertical translation that fails the pan if crossed before activation.
    pub fail_offset_y: Option<OffsetRange>,
    /// Deprecated: symmetric horizontal activation window.
    pub min_delta_x: Option<f64>,
    /// Deprecated: symmetric vertical activation window.
    pub min_delta_y: Option<f64>,
    /// Deprecated: symmetric horizontal fail window.
    pub max_delta_x: Option<f64>,
    /// Deprecated: symmetric vertical fail window.
    pub max_delta_y: Option<f64>,
    /// Deprecated: one-sided horizontal activation threshold.
    pub min_offset_x: Option<f64>,
    /// Deprecated: one-sided vertical activation threshold.
    pub min_offset_y: Option<f64>,
    /// Minimum travel distance before activating.
    ///
    /// Defaults to the touch slop unless other activation criteria are set.
    pub min_dist: Option<f64>,
    /// Velocity threshold applied to both axes.
    pub min_velocity: Option<f64>,
    /// Horizontal velocity threshold. Negative values require leftward motion.
    pub min_velocity_x: Option<f64>,
    /// Vertical velocity threshold. Negative values require upward motion.
    pub min_velocity_y: Option<f64>,
    /// Pointers required before the pan begins.
    pub min_pointers: usize,
    /// More pointers than this cancels (or fails) the pan.
    pub max_pointers: usize,
    /// When non-zero, activate after holding this long, and fail if the
    /// pointer moves beyond the touch slop first.
    pub activate_after_long_press_ms: u64,
}

impl Default for PanProps {
    fn default() -> Self {
        Self {
            active_offset_x: None,
            active_offset_y: None,
            fail_offset_x: None,
            fail_offset_y: None,
            min_delta_x: None,
            min_delta_y: None,
            max_delta_x: None,
            max_delta_y: None,
            min_offset_x: None,
            min_offset_y: None,
            min_dist: None,
            min_velocity: None,
            min_velocity_x: None,
            min_velocity_y: None,
            min_pointers: 1,
            max_pointers: 10,
            activate_after_long_press_ms: 0,
        }
    }
}

/// Normalized pan thresholds. `None` means "not configured".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanConfig {
    /// Activate when horizontal translation drops below this.
    pub active_offset_x_start: Option<f64>,
    /// Activate when horizontal translation exceeds this.
    pub active_offset_x_end: Option<f64>,
    /// Activate when vertical translation drops below this.
    pub active_offset_y_start: Option<f64>,
    /// Activate when vertical translation exceeds this.
    pub active_offset_y_end: Option<f64>,
    /// Fail when horizontal translation drops below this.
    pub fail_offset_x_start: Option<f64>,
    /// Fail when horizontal translation exceeds this.
    pub fail_offset_x_end: Option<f64>,
    /// Fail when vertical translation drops below this.
    pub fail_offset_y_start: Option<f64>,
    /// Fail when vertical translation exceeds this.
    pub fail_offset_y_end: Option<f64>,
    /// Activate when the squared translation reaches this.
    pub min_dist_sq: Option<f64>,
    /// Horizontal velocity threshold.
    pub min_velocity_x: Option<f64>,
    /// Vertical velocity threshold.
    pub min_velocity_y: Option<f64>,
    /// Pointers required before beginning.
    pub min_pointers: usize,
    /// Pointer limit.
    pub max_pointers: usize,
    /// Hold-to-activate delay; zero disables it.
    pub activate_after_long_press_ms: u64,
}

impl PanConfig {
    fn has_custom_activation(&self) -> bool {
        [
            self.active_offset_x_start,
            self.active_offset_x_end,
            self.fail_offset_x_start,
            self.fail_offset_x_end,
            self.active_offset_y_start,
            self.active_offset_y_end,
            self.fail_offset_y_start,
            self.fail_offset_y_end,
            self.min_velocity_x,
            self.min_velocity_y,
        ]
        .iter()
        .any(Option::is_some)
    }
}

impl PanProps {
    /// Validates the props and folds legacy options into [`PanConfig`].
    pub fn normalize(&self) -> Result<PanConfig, ConfigError> {
        self.validate()?;

        let mut c = PanConfig {
            min_pointers: self.min_pointers,
            max_pointers: self.max_pointers,
            activate_after_long_press_ms: self.activate_after_long_press_ms,
            ..PanConfig::default()
        };

        if let Some(d) = self.min_delta_x {
            c.active_offset_x_start = Some(-d);
            c.active_offset_x_end = Some(d);
        }
        if let Some(d) = self.max_delta_x {
            c.fail_offset_x_start = Some(-d);
            c.fail_offset_x_end = Some(d);
        }
        if let Some(v) = self.min_offset_x {
            OffsetRange::Single(v).apply(&mut c.active_offset_x_start, &mut c.active_offset_x_end);
        }
        if let Some(d) = self.min_delta_y {
            c.active_offset_y_start = Some(-d);
            c.active_offset_y_end = Some(d);
        }
        if let Some(d) = self.max_delta_y {
            c.fail_offset_y_start = Some(-d);
            c.fail_offset_y_end = Some(d);
        }
        if let Some(v) = self.min_offset_y {
            OffsetRange::Single(v).apply(&mut c.active_offset_y_start, &mut c.active_offset_y_end);
        }
        if let Some(r) = self.active_offset_x {
            r.apply(&mut c.active_offset_x_start, &mut c.active_offset_x_end);
        }
        if let Some(r) = self.active_offset_y {
            r.apply(&mut c.active_offset_y_start, &mut c.active_offset_y_end);
        }
        if let Some(r) = self.fail_offset_x {
            r.apply(&mut c.fail_offset_x_start, &mut c.fail_offset_x_end);
        }
        if let Some(r) = self.fail_offset_y {
            r.apply(&mut c.fail_offset_y_start, &mut c.fail_offset_y_end);
        }

        c.min_velocity_x = self.min_velocity_x.or(self.min_velocity);
        c.min_velocity_y = self.min_velocity_y.or(self.min_velocity);

        // Only explicitly per-axis velocity thresholds count as custom criteria.
        let custom = PanConfig {
            min_velocity_x: self.min_velocity_x,
            min_velocity_y: self.min_velocity_y,
            ..c.clone()
        }
        .has_custom_activation();
        c.min_dist_sq = match self.min_dist {
            Some(d) => Some(d * d),
            None if custom => None,
            None => Some(DEFAULT_TOUCH_SLOP * DEFAULT_TOUCH_SLOP),
        };

        Ok(c)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let conflicts = [
            (is_set(self.min_delta_x), self.active_offset_x, "min_delta_x", "active_offset_x"),
            (is_set(self.max_delta_x), self.fail_offset_x, "max_delta_x", "fail_offset_x"),
            (is_set(self.min_delta_y), self.active_offset_y, "min_delta_y", "active_offset_y"),
            (is_set(self.max_delta_y), self.fail_offset_y, "max_delta_y", "fail_offset_y"),
        ];
        for (legacy_set, modern, legacy, modern_name) in conflicts {
            if legacy_set && modern.is_some_and(OffsetRange::is_set) {
                return Err(ConfigError::LegacyOffsetConflict {
                    legacy,
                    modern: modern_name,
                });
            }
        }

        let ranges = [
            (self.active_offset_x, "active_offset_x"),
            (self.active_offset_y, "active_offset_y"),
            (self.fail_offset_x, "fail_offset_x"),
            (self.fail_offset_y, "fail_offset_y"),
        ];
        for (range, name) in ranges.into_iter().filter_map(|(r, n)| Some((r?, n))) {
            range.check(name)?;
        }

        if self.min_pointers == 0 {
            return Err(ConfigError::InvalidCount {
                name: "min_pointers",
                value: self.min_pointers,
            });
        }
        if self.max_pointers < self.min_pointers {
            return Err(ConfigError::InvalidCount {
                name: "max_pointers",
                value: self.max_pointers,
            });
        }
        Ok(())
    }
}
