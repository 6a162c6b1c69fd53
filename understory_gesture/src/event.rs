// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events emitted by the engine and the sink that receives them.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Vec2};

use crate::{GestureKind, HandlerId, HandlerState};

/// Kind-specific payload.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureDetails {
    /// Taps carry no extra data.
    Tap,
    /// Drag progress.
    Pan {
        /// Translation since activation, preserved across pointer changes.
        translation: Vec2,
        /// Velocity of the most recently moved pointer, in units per second.
        velocity: Vec2,
    },
    /// Hold progress.
    LongPress {
        /// Milliseconds since the press began.
        duration_ms: u64,
    },
    /// Scale progress.
    Pinch {
        /// Accumulated scale factor since activation.
        scale: f64,
        /// Centroid of the pointers.
        focal: Point,
        /// Change in span, in units per second.
        velocity: f64,
    },
    /// Rotation progress.
    Rotation {
        /// Accumulated rotation in radians; positive is clockwise on screen.
        rotation: f64,
        /// Midpoint of the two key pointers, cached across pointer loss.
        anchor: Point,
        /// Radians per second.
        velocity: f64,
    },
    /// Flings carry no extra data.
    Fling,
}

/// Payload attached to every emitted event.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureData {
    /// Pointers the handler tracks.
    pub number_of_pointers: usize,
    /// Centroid relative to the hit area's origin (absolute without a hit area).
    pub position: Point,
    /// Centroid in input coordinates.
    pub absolute: Point,
    /// Kind-specific values.
    pub details: GestureDetails,
}

/// Something the engine reports to the view layer.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureEvent {
    /// A handler committed a state transition.
    StateChange {
        /// The handler.
        handler: HandlerId,
        /// Its recognizer kind.
        kind: GestureKind,
        /// State before the transition.
        old_state: HandlerState,
        /// State after the transition.
        state: HandlerState,
        /// Payload at the time of the transition.
        data: GestureData,
    },
    /// An active handler made progress.
    Update {
        /// The handler.
        handler: HandlerId,
        /// Its recognizer kind.
        kind: GestureKind,
        /// Current payload.
        data: GestureData,
    },
}

impl GestureEvent {
    /// The handler this event is about.
    pub fn handler(&self) -> HandlerId {
        match self {
            Self::StateChange { handler, .. } | Self::Update { handler, .. } => *handler,
        }
    }

    /// The handler's recognizer kind.
    pub fn kind(&self) -> GestureKind {
        match self {
            Self::StateChange { kind, .. } | Self::Update { kind, .. } => *kind,
        }
    }

    /// The payload.
    pub fn data(&self) -> &GestureData {
        match self {
            Self::StateChange { data, .. } | Self::Update { data, .. } => data,
        }
    }

    /// `(old, new)` for state changes.
    pub fn transition(&self) -> Option<(HandlerState, HandlerState)> {
        match self {
            Self::StateChange {
                old_state, state, ..
            } => Some((*old_state, *state)),
            Self::Update { .. } => None,
        }
    }
}

/// Receives engine output.
///
/// The engine calls [`emit`](Self::emit) synchronously, in order, while it
/// processes an input. Implementations must not call back into the engine.
pub trait EventSink {
    /// Delivers one event.
    fn emit(&mut self, event: GestureEvent);
}

impl EventSink for Vec<GestureEvent> {
    fn emit(&mut self, event: GestureEvent) {
        self.push(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn emit(&mut self, event: GestureEvent) {
        (**self).emit(event);
    }
}

/// Adapts a closure into an [`EventSink`].
///
/// ```rust
/// use understory_gesture::{FnSink, GestureEngine, GestureEvent};
///
/// let mut count = 0;
/// let engine = GestureEngine::new(FnSink(|_event: GestureEvent| count += 1));
/// drop(engine);
/// assert_eq!(count, 0);
/// ```
pub struct FnSink<F>(pub F);

impl<F: FnMut(GestureEvent)> EventSink for FnSink<F> {
    fn emit(&mut self, event: GestureEvent) {
        (self.0)(event);
    }
}

impl<F> fmt::Debug for FnSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> GestureData {
        GestureData {
            number_of_pointers: 1,
            position: Point::ZERO,
            absolute: Point::ZERO,
            details: GestureDetails::Tap,
        }
    }

    #[test]
    fn accessors() {
        let change = GestureEvent::StateChange {
            handler: HandlerId(3),
            kind: GestureKind::Tap,
            old_state: HandlerState::Undetermined,
            state: HandlerState::Began,
            data: data(),
        };
        assert_eq!(change.handler(), HandlerId(3));
        assert_eq!(
            change.transition(),
            Some((HandlerState::Undetermined, HandlerState::Began))
        );

        let update = GestureEvent::Update {
            handler: HandlerId(1),
            kind: GestureKind::Pan,
            data: data(),
        };
        assert_eq!(update.kind(), GestureKind::Pan);
        assert_eq!(update.transition(), None);
        assert_eq!(update.data().number_of_pointers, 1);
    }

    #[test]
    fn sinks_collect() {
        let mut events: Vec<GestureEvent> = Vec::new();
        events.emit(GestureEvent::Update {
            handler: HandlerId(0),
            kind: GestureKind::Fling,
            data: data(),
        });
        assert_eq!(events.len(), 1);

        let mut seen = Vec::new();
        let mut sink = FnSink(|e: GestureEvent| seen.push(e.handler()));
        sink.emit(events.remove(0));
        assert_eq!(seen, [HandlerId(0)]);
    }
}
