// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;

use crate::HandlerState;
use crate::config::PinchConfig;
use crate::detectors::ScaleDetector;
use crate::handler::{Actions, Context, Input, InputKind};

#[derive(Clone, Debug)]
pub(crate) struct PinchRecognizer {
    config: PinchConfig,
    detector: ScaleDetector,
    scale: f64,
    velocity: f64,
}

impl PinchRecognizer {
    pub(crate) fn new(config: PinchConfig) -> Self {
        Self {
            config,
            detector: ScaleDetector::new(),
            scale: 1.0,
            velocity: 0.0,
        }
    }

    pub(crate) fn scale(&self) -> f64 {
        self.scale
    }

    pub(crate) fn velocity(&self) -> f64 {
        self.velocity
    }

    pub(crate) fn focal(&self) -> Point {
        self.detector.focus()
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        match input.kind {
            InputKind::Down => {}
            InputKind::Add => {
                if out.state() == HandlerState::Undetermined && cx.count() >= 2 {
                    self.reset_progress(out.state());
                    out.begin();
                }
                self.detector.rebase(&cx.positions(), input.time);
            }
            InputKind::Move => {
                if cx.count() < 2 {
                    return;
                }
                self.detector.update(&cx.positions(), input.time);
                self.on_scale(out);
            }
            InputKind::Remove => {
                self.detector.rebase(&cx.positions(), input.time);
                if cx.count() < 2 {
                    out.end();
                }
            }
            InputKind::Up => {
                self.detector.finish();
                out.end();
            }
        }
    }

    fn on_scale(&mut self, out: &mut Actions) {
        self.scale *= self.detector.scale_factor();
        if let Some(velocity) = self.detector.span_velocity() {
            self.velocity = velocity;
        }
        let slop = self.config.span_slop.unwrap_or(0.0);
        if out.state() == HandlerState::Began
            && (self.detector.initial_span() - self.detector.span()).abs() >= slop
        {
            self.reset_progress(out.state());
            out.activate();
        }
    }

    fn reset_progress(&mut self, state: HandlerState) {
        if state != HandlerState::Active {
            self.scale = 1.0;
            self.velocity = 0.0;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.detector.reset();
        self.scale = 1.0;
        self.velocity = 0.0;
    }
}
