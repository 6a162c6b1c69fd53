// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind activation criteria.
//!
//! Every handler carries one [`Recognizer`]. The engine forwards pointer input
//! and fired timers to it and applies the requested [`Actions`] itself; no
//! recognizer knows about other handlers.

mod fling;
mod long_press;
mod pan;
mod pinch;
mod rotation;
mod tap;

use kurbo::Point;

use crate::handler::{Actions, Context, Input, Timer};
use crate::{ConfigError, GestureDetails, GestureKind, KindConfig};

use fling::FlingRecognizer;
use long_press::LongPressRecognizer;
use pan::PanRecognizer;
use pinch::PinchRecognizer;
use rotation::RotationRecognizer;
use tap::TapRecognizer;

#[derive(Clone, Debug)]
pub(crate) enum Recognizer {
    Tap(TapRecognizer),
    Pan(PanRecognizer),
    LongPress(LongPressRecognizer),
    Pinch(PinchRecognizer),
    Rotation(RotationRecognizer),
    Fling(FlingRecognizer),
}

impl Recognizer {
    /// Builds the recognizer for a validated configuration.
    pub(crate) fn new(config: &KindConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            KindConfig::Tap(c) => Self::Tap(TapRecognizer::new(c.clone())),
            KindConfig::Pan(props) => Self::Pan(PanRecognizer::new(props.normalize()?)),
            KindConfig::LongPress(c) => Self::LongPress(LongPressRecognizer::new(c.clone())),
            KindConfig::Pinch(c) => Self::Pinch(PinchRecognizer::new(c.clone())),
            KindConfig::Rotation(c) => Self::Rotation(RotationRecognizer::new(c.clone())),
            KindConfig::Fling(c) => Self::Fling(FlingRecognizer::new(c.clone())),
        })
    }

    pub(crate) fn kind(&self) -> GestureKind {
        match self {
            Self::Tap(_) => GestureKind::Tap,
            Self::Pan(_) => GestureKind::Pan,
            Self::LongPress(_) => GestureKind::LongPress,
            Self::Pinch(_) => GestureKind::Pinch,
            Self::Rotation(_) => GestureKind::Rotation,
            Self::Fling(_) => GestureKind::Fling,
        }
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        match self {
            Self::Tap(r) => r.on_input(cx, input, out),
            Self::Pan(r) => r.on_input(cx, input, out),
            Self::LongPress(r) => r.on_input(cx, input, out),
            Self::Pinch(r) => r.on_input(cx, input, out),
            Self::Rotation(r) => r.on_input(cx, input, out),
            Self::Fling(r) => r.on_input(cx, input, out),
        }
    }

    pub(crate) fn on_timer(&mut self, timer: Timer, out: &mut Actions) {
        match self {
            Self::Tap(r) => r.on_timer(timer, out),
            Self::Pan(r) => r.on_timer(timer, out),
            Self::LongPress(r) => r.on_timer(timer, out),
            Self::Fling(r) => r.on_timer(timer, out),
            Self::Pinch(_) | Self::Rotation(_) => {}
        }
    }

    /// Clears per-cycle progress once the handler is back to `UNDETERMINED`.
    pub(crate) fn reset(&mut self) {
        match self {
            Self::Tap(r) => r.reset(),
            Self::Pan(r) => r.reset(),
            Self::Pinch(r) => r.reset(),
            Self::Rotation(r) => r.reset(),
            Self::Fling(r) => r.reset(),
            Self::LongPress(_) => {}
        }
    }

    /// Kind-specific payload. `fallback` is used when a geometric value is
    /// not defined yet.
    pub(crate) fn details(&self, now: u64, fallback: Point) -> GestureDetails {
        match self {
            Self::Tap(_) => GestureDetails::Tap,
            Self::Pan(r) => GestureDetails::Pan {
                translation: r.translation(),
                velocity: r.velocity(),
            },
            Self::LongPress(r) => GestureDetails::LongPress {
                duration_ms: r.duration_ms(now),
            },
            Self::Pinch(r) => GestureDetails::Pinch {
                scale: r.scale(),
                focal: r.focal(),
                velocity: r.velocity(),
            },
            Self::Rotation(r) => GestureDetails::Rotation {
                rotation: r.rotation(),
                anchor: r.anchor().unwrap_or(fallback),
                velocity: r.velocity(),
            },
            Self::Fling(_) => GestureDetails::Fling,
        }
    }
}
