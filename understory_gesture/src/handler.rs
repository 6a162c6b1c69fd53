// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plumbing between the engine and the recognizers.
//!
//! A recognizer never mutates engine state. It receives an [`Input`] together
//! with a read-only [`Context`] and answers with [`Actions`]: requested state
//! transitions and timer operations. The engine then runs those requests
//! through the arbiter.

use kurbo::{Point, Vec2};
use smallvec::SmallVec;
use understory_pointer::{PointerId, PointerTracker, VelocityEstimator};

use crate::config::CommonConfig;
use crate::recognizers::Recognizer;
use crate::{HandlerId, HandlerState};

/// One attached handler, as stored by the engine.
#[derive(Clone, Debug)]
pub(crate) struct Handler {
    pub(crate) id: HandlerId,
    pub(crate) common: CommonConfig,
    /// Committed state; what observers have been told.
    pub(crate) state: HandlerState,
    /// A transition the arbiter has not granted yet.
    pub(crate) deferred: Option<HandlerState>,
    pub(crate) tracked: SmallVec<[PointerId; 4]>,
    /// Every pointer adopted during the current cycle, lifted ones included.
    pub(crate) touched: SmallVec<[PointerId; 4]>,
    /// Last known centroid, reported once no pointer is tracked.
    pub(crate) focus: Point,
    /// Timers scheduled under an older epoch are stale.
    pub(crate) epoch: u64,
    pub(crate) activated_tick: Option<u64>,
    pub(crate) recognizer: Recognizer,
}

impl Handler {
    pub(crate) fn new(id: HandlerId, common: CommonConfig, recognizer: Recognizer) -> Self {
        Self {
            id,
            common,
            state: HandlerState::Undetermined,
            deferred: None,
            tracked: SmallVec::new(),
            touched: SmallVec::new(),
            focus: Point::ZERO,
            epoch: 0,
            activated_tick: None,
            recognizer,
        }
    }

    /// The state recognition continues from: a deferred intent counts as reached.
    pub(crate) fn logical(&self) -> HandlerState {
        self.deferred.unwrap_or(self.state)
    }

    /// Takes `pointer` for the current cycle.
    pub(crate) fn adopt(&mut self, pointer: PointerId) {
        if self.tracked.is_empty() && self.logical() == HandlerState::Undetermined {
            self.touched.clear();
        }
        self.tracked.push(pointer);
        if !self.touched.contains(&pointer) {
            self.touched.push(pointer);
        }
    }

    /// Whether both handlers saw a common pointer in their current cycles.
    pub(crate) fn shares_pointer_with(&self, other: &Self) -> bool {
        self.touched.iter().any(|p| other.touched.contains(p))
    }

    /// Drops the pointers and invalidates pending timers.
    pub(crate) fn release(&mut self) {
        self.tracked.clear();
        self.epoch += 1;
    }
}

/// What happened to a pointer, from one handler's point of view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum InputKind {
    /// First pointer of the handler went down.
    Down,
    /// Another pointer went down while the handler already tracks some.
    Add,
    /// A tracked pointer moved.
    Move,
    /// A tracked pointer lifted; others remain.
    Remove,
    /// The handler's last pointer lifted.
    Up,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Input {
    pub(crate) kind: InputKind,
    pub(crate) id: PointerId,
    pub(crate) position: Point,
    pub(crate) time: u64,
}

/// Timer tokens. A recognizer only ever sees its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Timer {
    TapDuration,
    TapDelay,
    LongPressActivate,
    PanActivate,
    FlingExpire,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Begin,
    Activate,
    End,
    Fail,
    Schedule { timer: Timer, delay_ms: u64 },
    ClearTimers,
}

/// Requests produced by one recognizer callback.
///
/// Tracks the state the recognizer will be in once every request is granted,
/// so a recognizer can request `Activate` right after `Begin`.
#[derive(Clone, Debug)]
pub(crate) struct Actions {
    state: HandlerState,
    list: SmallVec<[Action; 4]>,
}

impl Actions {
    pub(crate) fn new(state: HandlerState) -> Self {
        Self {
            state,
            list: SmallVec::new(),
        }
    }

    pub(crate) fn state(&self) -> HandlerState {
        self.state
    }

    pub(crate) fn begin(&mut self) {
        if self.state == HandlerState::Undetermined {
            self.state = HandlerState::Began;
            self.list.push(Action::Begin);
        }
    }

    pub(crate) fn activate(&mut self) {
        if self.state == HandlerState::Began {
            self.state = HandlerState::Active;
            self.list.push(Action::Activate);
        }
    }

    /// Ends an active handler; a handler that never activated fails instead.
    pub(crate) fn end(&mut self) {
        match self.state {
            HandlerState::Active => {
                self.state = HandlerState::End;
                self.list.push(Action::End);
            }
            HandlerState::Began => self.fail(),
            _ => {}
        }
    }

    /// Fails a began handler or cancels an active one.
    pub(crate) fn fail(&mut self) {
        self.state = match self.state {
            HandlerState::Began => HandlerState::Failed,
            HandlerState::Active => HandlerState::Cancelled,
            _ => return,
        };
        self.list.push(Action::Fail);
    }

    pub(crate) fn schedule(&mut self, timer: Timer, delay_ms: u64) {
        if !self.state.is_finished() {
            self.list.push(Action::Schedule { timer, delay_ms });
        }
    }

    pub(crate) fn clear_timers(&mut self) {
        self.list.push(Action::ClearTimers);
    }

    pub(crate) fn into_list(self) -> SmallVec<[Action; 4]> {
        self.list
    }
}

/// What a recognizer may look at.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Context<'a> {
    /// Pointers the handler tracks. During `Remove`/`Up` the lifted pointer is
    /// already gone from this list but still present in `tracker`.
    pub(crate) tracked: &'a [PointerId],
    pub(crate) tracker: &'a PointerTracker,
    pub(crate) estimator: &'a VelocityEstimator,
}

impl Context<'_> {
    pub(crate) fn count(&self) -> usize {
        self.tracked.len()
    }

    pub(crate) fn centroid(&self) -> Option<Point> {
        self.tracker.centroid(self.tracked)
    }

    pub(crate) fn position(&self, id: PointerId) -> Option<Point> {
        self.tracker.get(id).map(|p| p.position())
    }

    pub(crate) fn positions(&self) -> SmallVec<[Point; 4]> {
        self.tracked
            .iter()
            .filter_map(|&id| self.position(id))
            .collect()
    }

    pub(crate) fn velocity_of(&self, id: PointerId) -> Option<Vec2> {
        self.estimator.estimate(self.tracker.get(id)?)
    }

    /// Velocity of `id`, or zero when it cannot be estimated.
    pub(crate) fn velocity(&self, id: PointerId) -> Vec2 {
        self.velocity_of(id).unwrap_or(Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_follow_the_graph() {
        let mut out = Actions::new(HandlerState::Undetermined);
        out.activate();
        assert!(out.clone().into_list().is_empty());

        out.begin();
        out.begin();
        out.activate();
        out.end();
        out.fail();
        assert_eq!(out.state(), HandlerState::End);
        assert_eq!(
            out.into_list().as_slice(),
            [Action::Begin, Action::Activate, Action::End]
        );
    }

    #[test]
    fn ending_before_activation_fails() {
        let mut out = Actions::new(HandlerState::Began);
        out.end();
        out.schedule(Timer::TapDelay, 10);
        assert_eq!(out.state(), HandlerState::Failed);
        assert_eq!(out.into_list().as_slice(), [Action::Fail]);

        let mut out = Actions::new(HandlerState::Active);
        out.fail();
        assert_eq!(out.state(), HandlerState::Cancelled);
    }

    #[test]
    fn lifted_pointers_stay_shared_for_the_cycle() {
        let tap = || {
            let kind = crate::KindConfig::Tap(crate::TapConfig::default());
            Recognizer::new(&kind).unwrap()
        };
        let mut a = Handler::new(HandlerId(0), CommonConfig::default(), tap());
        let mut b = Handler::new(HandlerId(1), CommonConfig::default(), tap());
        a.adopt(PointerId(3));
        b.adopt(PointerId(3));
        a.tracked.clear();
        assert!(a.shares_pointer_with(&b));

        // A fresh cycle forgets the old pointers.
        a.adopt(PointerId(4));
        assert!(!a.shares_pointer_with(&b));
    }
}
