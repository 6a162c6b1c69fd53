// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use kurbo::Point;

use crate::HandlerState;
use crate::config::LongPressConfig;
use crate::handler::{Actions, Context, Input, InputKind, Timer};

#[derive(Clone, Debug)]
pub(crate) struct LongPressRecognizer {
    config: LongPressConfig,
    start: Point,
    start_time: u64,
}

impl LongPressRecognizer {
    pub(crate) fn new(config: LongPressConfig) -> Self {
        Self {
            config,
            start: Point::ZERO,
            start_time: 0,
        }
    }

    pub(crate) fn duration_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.start_time)
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        match input.kind {
            InputKind::Down => {
                self.start = input.position;
                if out.state() == HandlerState::Undetermined {
                    self.start_time = input.time;
                    out.begin();
                }
                self.try_activate(cx, out);
            }
            InputKind::Add => {
                if cx.count() > self.config.number_of_pointers {
                    out.fail();
                    return;
                }
                self.start = cx.centroid().unwrap_or(input.position);
                self.try_activate(cx, out);
            }
            InputKind::Move => {
                let drift = cx.centroid().unwrap_or(input.position) - self.start;
                if drift.hypot2() > self.config.max_dist * self.config.max_dist {
                    out.fail();
                }
            }
            // Any lift ends the press, successfully once it is active.
            InputKind::Remove | InputKind::Up => out.end(),
        }
    }

    pub(crate) fn on_timer(&mut self, timer: Timer, out: &mut Actions) {
        if timer == Timer::LongPressActivate {
            out.activate();
        }
    }

    fn try_activate(&self, cx: &Context<'_>, out: &mut Actions) {
        if cx.count() != self.config.number_of_pointers {
            return;
        }
        if self.config.min_duration_ms > 0 {
            out.clear_timers();
            out.schedule(Timer::LongPressActivate, self.config.min_duration_ms);
        } else {
            out.activate();
        }
    }
}
