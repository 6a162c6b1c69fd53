// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};

use crate::HandlerState;
use crate::config::TapConfig;
use crate::handler::{Actions, Context, Input, InputKind, Timer};

/// Counts press/release cycles.
///
/// Drift is measured from where the first press of the sequence went down,
/// so movement between taps counts towards `max_dist` as well.
#[derive(Clone, Debug)]
pub(crate) struct TapRecognizer {
    config: TapConfig,
    start: Point,
    last: Point,
    offset: Vec2,
    taps: usize,
    max_pointers: usize,
}

impl TapRecognizer {
    pub(crate) fn new(config: TapConfig) -> Self {
        Self {
            config,
            start: Point::ZERO,
            last: Point::ZERO,
            offset: Vec2::ZERO,
            taps: 0,
            max_pointers: 0,
        }
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        match input.kind {
            InputKind::Down => {
                if out.state() == HandlerState::Undetermined {
                    self.offset = Vec2::ZERO;
                    self.start = input.position;
                }
                self.last = input.position;
            }
            InputKind::Move => self.last = cx.centroid().unwrap_or(input.position),
            InputKind::Add | InputKind::Remove => {
                self.offset += self.last - self.start;
                self.last = cx.centroid().unwrap_or(input.position);
                self.start = self.last;
            }
            // The lifted pointer was the last one.
            InputKind::Up => self.last = input.position,
        }
        self.max_pointers = self.max_pointers.max(cx.count());

        if self.should_fail() {
            out.fail();
            return;
        }
        match (out.state(), input.kind) {
            (HandlerState::Undetermined, InputKind::Down) => {
                out.begin();
                self.start_tap(out);
            }
            (HandlerState::Began, InputKind::Down) => self.start_tap(out),
            (HandlerState::Began, InputKind::Up) => self.end_tap(out),
            _ => {}
        }
    }

    pub(crate) fn on_timer(&mut self, timer: Timer, out: &mut Actions) {
        if matches!(timer, Timer::TapDuration | Timer::TapDelay) {
            out.fail();
        }
    }

    fn start_tap(&self, out: &mut Actions) {
        out.clear_timers();
        out.schedule(Timer::TapDuration, self.config.max_duration_ms);
    }

    fn end_tap(&mut self, out: &mut Actions) {
        out.clear_timers();
        self.taps += 1;
        if self.taps == self.config.number_of_taps && self.max_pointers >= self.config.min_pointers
        {
            out.activate();
            out.end();
        } else {
            out.schedule(Timer::TapDelay, self.config.max_delay_ms);
        }
    }

    fn should_fail(&self) -> bool {
        let d = self.last - self.start + self.offset;
        let c = &self.config;
        c.max_delta_x.is_some_and(|m| d.x.abs() > m)
            || c.max_delta_y.is_some_and(|m| d.y.abs() > m)
            || c.max_dist.is_some_and(|m| d.hypot2() > m * m)
    }

    pub(crate) fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.taps = 0;
        self.max_pointers = 0;
    }
}
