// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attachment configuration.
//!
//! A [`GestureConfig`] pairs options shared by every handler ([`CommonConfig`])
//! with the options of one recognizer kind ([`KindConfig`]). Configurations are
//! validated once, when the handler is attached, and are immutable afterwards.
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_gesture::{GestureConfig, TapConfig};
//!
//! let double_tap = GestureConfig::tap(TapConfig {
//!     number_of_taps: 2,
//!     max_dist: Some(20.0),
//!     ..TapConfig::default()
//! })
//! .with_hit_area(Rect::new(0.0, 0.0, 100.0, 40.0));
//! assert!(double_tap.validate().is_ok());
//! ```

use alloc::vec::Vec;
use core::f64::consts::PI;

use kurbo::Rect;
use understory_pointer::VelocityConfig;

use crate::pan_props::PanProps;
use crate::{ConfigError, GestureKind, HandlerId};

/// Distance a pointer may travel before it is no longer considered stationary.
pub const DEFAULT_TOUCH_SLOP: f64 = 10.0;

bitflags::bitflags! {
    /// Mouse buttons a handler responds to.
    ///
    /// Touch and pen pointers are never filtered by button.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u8 {
        /// Primary (usually left) button.
        const PRIMARY   = 0b0000_0001;
        /// Secondary (usually right) button.
        const SECONDARY = 0b0000_0010;
        /// Auxiliary (usually middle) button.
        const AUXILIARY = 0b0000_0100;
        /// Fourth button (usually "back").
        const BUTTON_4  = 0b0000_1000;
        /// Fifth button (usually "forward").
        const BUTTON_5  = 0b0001_0000;
    }
}

impl Default for MouseButtons {
    fn default() -> Self {
        Self::PRIMARY
    }
}

bitflags::bitflags! {
    /// Fling directions. Combining two orthogonal directions also enables the
    /// diagonal between them.
    ///
    /// Screen coordinates: `UP` is towards negative y.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Directions: u8 {
        /// Towards positive x.
        const RIGHT = 1;
        /// Towards negative x.
        const LEFT  = 2;
        /// Towards negative y.
        const UP    = 4;
        /// Towards positive y.
        const DOWN  = 8;
    }
}

impl Default for Directions {
    fn default() -> Self {
        Self::RIGHT
    }
}

/// Relations declared directly on a handler.
///
/// Relations can also be generated from a [`Composition`](crate::Composition).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelationConfig {
    /// This handler may not begin or activate while any of these is live.
    pub wait_for: Vec<HandlerId>,
    /// These handlers may be active at the same time as this one.
    pub simultaneous_with: Vec<HandlerId>,
    /// These handlers may not begin or activate while this one is live.
    pub blocks: Vec<HandlerId>,
}

impl RelationConfig {
    fn targets(&self) -> impl Iterator<Item = HandlerId> + '_ {
        self.wait_for
            .iter()
            .chain(&self.simultaneous_with)
            .chain(&self.blocks)
            .copied()
    }
}

/// Options shared by every handler kind.
#[derive(Clone, Debug, PartialEq)]
pub struct CommonConfig {
    /// Disabled handlers never receive pointers.
    pub enabled: bool,
    /// Pointers must go down inside this area to be adopted.
    ///
    /// `None` accepts pointers anywhere. Relative coordinates in update
    /// payloads are measured from the area's origin.
    pub hit_area: Option<Rect>,
    /// Cancel (or fail, before activation) when a tracked pointer leaves `hit_area`.
    pub cancel_when_outside: bool,
    /// Mouse buttons this handler responds to.
    pub mouse_buttons: MouseButtons,
    /// Declared relations to already-attached handlers.
    pub relations: RelationConfig,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hit_area: None,
            cancel_when_outside: false,
            mouse_buttons: MouseButtons::default(),
            relations: RelationConfig::default(),
        }
    }
}

/// Tap recognizer options.
#[derive(Clone, Debug, PartialEq)]
pub struct TapConfig {
    /// Press/release cycles required.
    pub number_of_taps: usize,
    /// Longest a single press may last.
    pub max_duration_ms: u64,
    /// Longest pause allowed between two taps.
    pub max_delay_ms: u64,
    /// Largest horizontal drift from the first press.
    pub max_delta_x: Option<f64>,
    /// Largest vertical drift from the first press.
    pub max_delta_y: Option<f64>,
    /// Largest total drift from the first press.
    pub max_dist: Option<f64>,
    /// Simultaneous pointers that must be seen at least once during the taps.
    pub min_pointers: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            number_of_taps: 1,
            max_duration_ms: 500,
            max_delay_ms: 500,
            max_delta_x: None,
            max_delta_y: None,
            max_dist: None,
            min_pointers: 1,
        }
    }
}

/// Long-press recognizer options.
#[derive(Clone, Debug, PartialEq)]
pub struct LongPressConfig {
    /// Hold time before activation.
    pub min_duration_ms: u64,
    /// Largest drift from the press position.
    pub max_dist: f64,
    /// Pointers that must be down.
    pub number_of_pointers: usize,
}

impl Default for LongPressConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 500,
            max_dist: DEFAULT_TOUCH_SLOP,
            number_of_pointers: 1,
        }
    }
}

/// Pinch recognizer options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PinchConfig {
    /// Change in span required before activating.
    ///
    /// `None` activates on the first two-pointer movement.
    pub span_slop: Option<f64>,
}

/// Rotation recognizer options.
#[derive(Clone, Debug, PartialEq)]
pub struct RotationConfig {
    /// Accumulated rotation, in radians, required before activating.
    pub threshold: f64,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self { threshold: PI / 36.0 }
    }
}

/// Fling recognizer options.
#[derive(Clone, Debug, PartialEq)]
pub struct FlingConfig {
    /// Accepted directions.
    pub direction: Directions,
    /// Pointers that must be down together.
    pub number_of_pointers: usize,
    /// The swipe must reach its velocity within this window.
    pub max_duration_ms: u64,
    /// Minimum speed in units per second.
    pub min_velocity: f64,
}

impl Default for FlingConfig {
    fn default() -> Self {
        Self {
            direction: Directions::default(),
            number_of_pointers: 1,
            max_duration_ms: 800,
            min_velocity: 700.0,
        }
    }
}

/// Kind-specific options.
#[derive(Clone, Debug, PartialEq)]
pub enum KindConfig {
    /// See [`TapConfig`].
    Tap(TapConfig),
    /// See [`PanProps`].
    Pan(PanProps),
    /// See [`LongPressConfig`].
    LongPress(LongPressConfig),
    /// See [`PinchConfig`].
    Pinch(PinchConfig),
    /// See [`RotationConfig`].
    Rotation(RotationConfig),
    /// See [`FlingConfig`].
    Fling(FlingConfig),
}

impl KindConfig {
    /// The recognizer kind.
    pub fn kind(&self) -> GestureKind {
        match self {
            Self::Tap(_) => GestureKind::Tap,
            Self::Pan(_) => GestureKind::Pan,
            Self::LongPress(_) => GestureKind::LongPress,
            Self::Pinch(_) => GestureKind::Pinch,
            Self::Rotation(_) => GestureKind::Rotation,
            Self::Fling(_) => GestureKind::Fling,
        }
    }
}

/// Full configuration of one handler.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureConfig {
    /// Shared options.
    pub common: CommonConfig,
    /// Kind-specific options.
    pub kind: KindConfig,
}

impl GestureConfig {
    /// A handler of the given kind with default shared options.
    pub fn new(kind: KindConfig) -> Self {
        Self {
            common: CommonConfig::default(),
            kind,
        }
    }

    /// A tap handler.
    pub fn tap(config: TapConfig) -> Self {
        Self::new(KindConfig::Tap(config))
    }

    /// A pan handler.
    pub fn pan(props: PanProps) -> Self {
        Self::new(KindConfig::Pan(props))
    }

    /// A long-press handler.
    pub fn long_press(config: LongPressConfig) -> Self {
        Self::new(KindConfig::LongPress(config))
    }

    /// A pinch handler.
    pub fn pinch(config: PinchConfig) -> Self {
        Self::new(KindConfig::Pinch(config))
    }

    /// A rotation handler.
    pub fn rotation(config: RotationConfig) -> Self {
        Self::new(KindConfig::Rotation(config))
    }

    /// A fling handler.
    pub fn fling(config: FlingConfig) -> Self {
        Self::new(KindConfig::Fling(config))
    }

    /// Restricts the handler to pointers that go down inside `area`.
    pub fn with_hit_area(mut self, area: Rect) -> Self {
        self.common.hit_area = Some(area);
        self
    }

    /// Cancels the handler when its pointers leave the hit area.
    pub fn with_cancel_when_outside(mut self, cancel: bool) -> Self {
        self.common.cancel_when_outside = cancel;
        self
    }

    /// Enables or disables the handler.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.common.enabled = enabled;
        self
    }

    /// Sets the mouse buttons the handler responds to.
    pub fn with_mouse_buttons(mut self, buttons: MouseButtons) -> Self {
        self.common.mouse_buttons = buttons;
        self
    }

    /// Declares that this handler waits for `other`.
    pub fn wait_for(mut self, other: HandlerId) -> Self {
        self.common.relations.wait_for.push(other);
        self
    }

    /// Declares that this handler may be active together with `other`.
    pub fn simultaneous_with(mut self, other: HandlerId) -> Self {
        self.common.relations.simultaneous_with.push(other);
        self
    }

    /// Declares that `other` waits for this handler.
    pub fn blocks(mut self, other: HandlerId) -> Self {
        self.common.relations.blocks.push(other);
        self
    }

    /// Checks kind-specific options.
    ///
    /// Relation targets are checked by the engine when attaching, since only
    /// it knows which handlers exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.kind {
            KindConfig::Tap(tap) => {
                at_least_one("number_of_taps", tap.number_of_taps)?;
                at_least_one("min_pointers", tap.min_pointers)
            }
            KindConfig::Pan(props) => props.normalize().map(|_| ()),
            KindConfig::LongPress(long_press) => {
                at_least_one("number_of_pointers", long_press.number_of_pointers)
            }
            KindConfig::Pinch(_) | KindConfig::Rotation(_) => Ok(()),
            KindConfig::Fling(fling) => {
                if fling.direction.is_empty() {
                    return Err(ConfigError::EmptyDirections);
                }
                at_least_one("number_of_pointers", fling.number_of_pointers)
            }
        }
    }

    pub(crate) fn relation_targets(&self) -> impl Iterator<Item = HandlerId> + '_ {
        self.common.relations.targets()
    }
}

fn at_least_one(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        Err(ConfigError::InvalidCount { name, value })
    } else {
        Ok(())
    }
}

/// Engine-wide tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Samples kept per pointer.
    pub history_capacity: usize,
    /// Velocity estimation options.
    pub velocity: VelocityConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: understory_pointer::DEFAULT_HISTORY_CAPACITY,
            velocity: VelocityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let tap = TapConfig::default();
        assert_eq!(tap.number_of_taps, 1);
        assert_eq!(tap.max_duration_ms, 500);
        assert_eq!(tap.max_delay_ms, 500);
        assert!(tap.max_dist.is_none());

        let long_press = LongPressConfig::default();
        assert_eq!(long_press.min_duration_ms, 500);
        assert_eq!(long_press.max_dist, DEFAULT_TOUCH_SLOP);

        let fling = FlingConfig::default();
        assert_eq!(fling.direction, Directions::RIGHT);
        assert_eq!(fling.max_duration_ms, 800);

        assert!((RotationConfig::default().threshold - PI / 36.0).abs() < 1e-12);
        assert_eq!(MouseButtons::default(), MouseButtons::PRIMARY);
    }

    #[test]
    fn zero_counts_are_rejected() {
        let taps = GestureConfig::tap(TapConfig {
            number_of_taps: 0,
            ..TapConfig::default()
        });
        assert_eq!(
            taps.validate(),
            Err(ConfigError::InvalidCount {
                name: "number_of_taps",
                value: 0
            })
        );

        let press = GestureConfig::long_press(LongPressConfig {
            number_of_pointers: 0,
            ..LongPressConfig::default()
        });
        assert!(press.validate().is_err());
    }

    #[test]
    fn fling_needs_a_direction() {
        let fling = GestureConfig::fling(FlingConfig {
            direction: Directions::empty(),
            ..FlingConfig::default()
        });
        assert_eq!(fling.validate(), Err(ConfigError::EmptyDirections));
    }

    #[test]
    fn builders_fill_common_options() {
        let a = HandlerId(0);
        let b = HandlerId(1);
        let config = GestureConfig::pinch(PinchConfig::default())
            .with_hit_area(Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_cancel_when_outside(true)
            .simultaneous_with(a)
            .wait_for(b);
        assert!(config.common.cancel_when_outside);
        assert_eq!(config.common.relations.simultaneous_with, [a]);
        assert_eq!(config.common.relations.wait_for, [b]);
        let targets: Vec<_> = config.relation_targets().collect();
        assert_eq!(targets, [b, a]);
    }
}
