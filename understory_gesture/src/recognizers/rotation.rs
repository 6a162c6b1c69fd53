// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;
use understory_pointer::PointerId;

use crate::HandlerState;
use crate::config::RotationConfig;
use crate::detectors::RotationDetector;
use crate::handler::{Actions, Context, Input, InputKind};

/// Follows the first two pointers of the handler; further pointers are ignored.
#[derive(Clone, Debug)]
pub(crate) struct RotationRecognizer {
    config: RotationConfig,
    detector: RotationDetector,
    keys: Option<(PointerId, PointerId)>,
    rotation: f64,
    velocity: f64,
}

impl RotationRecognizer {
    pub(crate) fn new(config: RotationConfig) -> Self {
        Self {
            config,
            detector: RotationDetector::new(),
            keys: None,
            rotation: 0.0,
            velocity: 0.0,
        }
    }

    pub(crate) fn rotation(&self) -> f64 {
        self.rotation
    }

    pub(crate) fn velocity(&self) -> f64 {
        self.velocity
    }

    pub(crate) fn anchor(&self) -> Option<Point> {
        self.detector.anchor()
    }

    fn key_positions(&self, cx: &Context<'_>) -> Option<(Point, Point)> {
        let (a, b) = self.keys?;
        Some((cx.position(a)?, cx.position(b)?))
    }

    pub(crate) fn on_input(&mut self, cx: &Context<'_>, input: &Input, out: &mut Actions) {
        match input.kind {
            InputKind::Down => {}
            InputKind::Add => {
                out.begin();
                if self.keys.is_none()
                    && let [a, b, ..] = *cx.tracked
                {
                    self.keys = Some((a, b));
                    if let Some((first, second)) = self.key_positions(cx) {
                        self.detector.start(first, second, input.time);
                    }
                }
            }
            InputKind::Move => {
                if cx.count() < 2 {
                    return;
                }
                let Some((first, second)) = self.key_positions(cx) else {
                    return;
                };
                let previous = self.rotation;
                self.rotation += self.detector.update(first, second, input.time);
                let dt = self.detector.time_delta();
                if dt > 0 {
                    self.velocity = (self.rotation - previous) / dt as f64 * 1000.0;
                }
                if out.state() == HandlerState::Began && self.rotation.abs() >= self.config.threshold
                {
                    out.activate();
                }
            }
            InputKind::Remove | InputKind::Up => {
                let lifted_key = self.keys.is_some_and(|(a, b)| input.id == a || input.id == b);
                if lifted_key || input.kind == InputKind::Up {
                    self.detector.finish();
                    self.keys = None;
                    out.end();
                }
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        // `finish` keeps the cached anchor; the next `start` replaces it.
        self.detector.finish();
        self.keys = None;
        self.rotation = 0.0;
        self.velocity = 0.0;
    }
}
