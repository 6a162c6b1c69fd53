// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::{Point, Vec2};

use crate::HandlerState;
use crate::config::DEFAULT_TOUCH_SLOP;
use crate::handler::{Actions, Context, Input, InputKind, Timer};
use crate::pan_props::PanConfig;

/// Continuous drag.
///
/// Translation is `last - start + offset`: `start` is re-anchored whenever the
/// pointer set changes and the movement so far is folded into `offset`, so
/// adding or lifting a finger does not make the translation jump.
#[derive(Clone, Debug)]
pub(crate) struct PanRecognizer {
    config: PanConfig,
    start: Point,
    last: Point,
    offset: Vec2,
    velocity: Vec2,
}

fn below(bound: Option<f64>, value: f64) -> bool {
    bound.is_some_and(|b| value < b)
}

fn above(bound: Option<f64>, value: f64) -> bool {
    bound.is_some_and(|b| value > b)
}

/// Negative thresholds require motion towards negative coordinates.
fn fast_enough(threshold: Option<f64>, v: f64) -> bool {
    threshold.is_some_and(|t| if t < 0.0 { v <= t } else { t <= v })
}

impl PanRecognizer {
    pub(crate) fn new(config: PanConfig) -> Self {
        Self {
            config,
            start: Point::ZERO,
            last: Point::ZERO,
            offset: Vec2::ZERO,
            velocity: Vec2::ZERO,
        }
    }

    pub(crate) fn translation(&self) -> Vec2 {
        self.last - self.start + self.offset
    }

    pub(crate) fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        let centroid = cx.centroid().unwrap_or(input.position);
        match input.kind {
            InputKind::Down => {
                self.last = centroid;
                self.start = self.last;
                self.try_begin(cx, input, out);
                self.check_began(out);
            }
            InputKind::Add => {
                self.try_begin(cx, input, out);
                self.rebase(centroid);
                if cx.count() > self.config.max_pointers {
                    out.fail();
                } else {
                    self.check_began(out);
                }
            }
            InputKind::Move => {
                self.last = centroid;
                self.velocity = cx.velocity(input.id);
                self.check_began(out);
            }
            InputKind::Remove => {
                self.rebase(centroid);
                if !(out.state() == HandlerState::Active && cx.count() < self.config.min_pointers) {
                    self.check_began(out);
                }
            }
            InputKind::Up => {
                if out.state() == HandlerState::Active {
                    self.last = input.position;
                    out.end();
                } else {
                    self.reset_progress(out.state());
                    out.fail();
                }
            }
        }
    }

    pub(crate) fn on_timer(&mut self, timer: Timer, out: &mut Actions) {
        if timer == Timer::PanActivate && out.state() == HandlerState::Began {
            self.activate(out);
        }
    }

    fn rebase(&mut self, centroid: Point) {
        self.offset += self.last - self.start;
        self.last = centroid;
        self.start = self.last;
    }

    fn try_begin(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        if out.state() == HandlerState::Undetermined && cx.count() >= self.config.min_pointers {
            self.reset_progress(out.state());
            self.offset = Vec2::ZERO;
            self.velocity = Vec2::ZERO;
            out.begin();
            if self.config.activate_after_long_press_ms > 0 {
                out.schedule(Timer::PanActivate, self.config.activate_after_long_press_ms);
            }
        } else {
            self.velocity = cx.velocity(input.id);
        }
    }

    fn check_began(&mut self, out: &mut Actions) {
        if out.state() != HandlerState::Began {
            return;
        }
        if self.should_fail() {
            out.fail();
        } else if self.should_activate() {
            self.activate(out);
        }
    }

    fn activate(&mut self, out: &mut Actions) {
        self.reset_progress(out.state());
        out.activate();
    }

    fn reset_progress(&mut self, state: HandlerState) {
        if state != HandlerState::Active {
            self.start = self.last;
        }
    }

    fn should_activate(&self) -> bool {
        let c = &self.config;
        let d = self.translation();
        below(c.active_offset_x_start, d.x)
            || above(c.active_offset_x_end, d.x)
            || below(c.active_offset_y_start, d.y)
            || above(c.active_offset_y_end, d.y)
            || c.min_dist_sq.is_some_and(|m| d.hypot2() >= m)
            || fast_enough(c.min_velocity_x, self.velocity.x)
            || fast_enough(c.min_velocity_y, self.velocity.y)
    }

    fn should_fail(&self) -> bool {
        let c = &self.config;
        let d = self.translation();
        if c.activate_after_long_press_ms > 0 && d.hypot2() > DEFAULT_TOUCH_SLOP * DEFAULT_TOUCH_SLOP
        {
            return true;
        }
        below(c.fail_offset_x_start, d.x)
            || above(c.fail_offset_x_end, d.x)
            || below(c.fail_offset_y_start, d.y)
            || above(c.fail_offset_y_end, d.y)
    }

    pub(crate) fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        self.start = self.last;
    }
}
