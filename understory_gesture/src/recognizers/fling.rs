// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::f64::consts::FRAC_1_SQRT_2;

use kurbo::Vec2;
use understory_pointer::PointerId;

use crate::HandlerState;
use crate::config::{Directions, FlingConfig};
use crate::handler::{Actions, Context, Input, InputKind, Timer};

/// `cos(15°)`: half of the 30° cone around an axis.
const AXIAL_DEVIATION_COSINE: f64 = 0.965_925_826_289_068_3;
/// `cos(30°)`: half of the 60° cone left around a diagonal.
const DIAGONAL_DEVIATION_COSINE: f64 = 0.866_025_403_784_438_7;

const AXES: [(Directions, Vec2); 4] = [
    (Directions::RIGHT, Vec2::new(1.0, 0.0)),
    (Directions::LEFT, Vec2::new(-1.0, 0.0)),
    (Directions::UP, Vec2::new(0.0, -1.0)),
    (Directions::DOWN, Vec2::new(0.0, 1.0)),
];

const DIAGONALS: [(Directions, Vec2); 4] = [
    (
        Directions::RIGHT.union(Directions::UP),
        Vec2::new(FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    ),
    (
        Directions::RIGHT.union(Directions::DOWN),
        Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    ),
    (
        Directions::LEFT.union(Directions::UP),
        Vec2::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2),
    ),
    (
        Directions::LEFT.union(Directions::DOWN),
        Vec2::new(-FRAC_1_SQRT_2, FRAC_1_SQRT_2),
    ),
];

/// Whether `velocity` points along one of the enabled directions.
pub(crate) fn is_aligned(velocity: Vec2, enabled: Directions) -> bool {
    let speed = velocity.hypot();
    if speed == 0.0 || !speed.is_finite() {
        return false;
    }
    let unit = velocity / speed;
    let within = |dirs: &[(Directions, Vec2)], cosine: f64| {
        dirs.iter()
            .any(|&(d, axis)| enabled.contains(d) && unit.dot(axis) > cosine)
    };
    within(&AXES, AXIAL_DEVIATION_COSINE) || within(&DIAGONALS, DIAGONAL_DEVIATION_COSINE)
}

/// Quick directional swipe, judged on the velocity of the latest pointer down.
#[derive(Clone, Debug)]
pub(crate) struct FlingRecognizer {
    config: FlingConfig,
    key: Option<PointerId>,
    max_pointers: usize,
}

impl FlingRecognizer {
    pub(crate) fn new(config: FlingConfig) -> Self {
        Self {
            config,
            key: None,
            max_pointers: 0,
        }
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        match input.kind {
            InputKind::Down => {
                self.key = Some(input.id);
                self.new_pointer(cx, out);
            }
            InputKind::Add => self.new_pointer(cx, out),
            InputKind::Move => {
                if out.state() == HandlerState::Began {
                    self.try_end(cx, out);
                }
            }
            InputKind::Remove | InputKind::Up => {
                if out.state() == HandlerState::Began && !self.try_end(cx, out) {
                    out.fail();
                }
                if input.kind == InputKind::Up {
                    self.key = None;
                }
            }
        }
    }

    pub(crate) fn on_timer(&mut self, timer: Timer, out: &mut Actions) {
        if timer == Timer::FlingExpire {
            out.fail();
        }
    }

    fn new_pointer(&mut self, cx: &Context<'_>, out: &mut Actions) {
        if out.state() == HandlerState::Undetermined {
            self.max_pointers = 1;
            out.begin();
            out.schedule(Timer::FlingExpire, self.config.max_duration_ms);
        }
        if out.state() != HandlerState::Began {
            return;
        }
        self.try_end(cx, out);
        self.max_pointers = self.max_pointers.max(cx.count());
    }

    fn try_end(&self, cx: &Context<'_>, out: &mut Actions) -> bool {
        let Some(velocity) = self.key.and_then(|id| cx.velocity_of(id)) else {
            return false;
        };
        let fast = velocity.hypot() > self.config.min_velocity;
        if self.max_pointers == self.config.number_of_pointers
            && fast
            && is_aligned(velocity, self.config.direction)
        {
            out.activate();
            out.end();
            true
        } else {
            false
        }
    }

    pub(crate) fn reset(&mut self) {
        self.max_pointers = 0;
    }
}
