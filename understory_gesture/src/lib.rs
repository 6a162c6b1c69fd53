// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_gesture --heading-base-level=0

//! Understory Gesture: deterministic multi-touch gesture recognition.
//!
//! ## Overview
//!
//! A [`GestureEngine`] owns a set of attached *handlers*. Each handler runs one
//! recognizer (tap, pan, long press, pinch, rotation or fling) and moves through
//! a fixed lifecycle:
//!
//! ```text
//! UNDETERMINED -> BEGAN -> ACTIVE -> END
//!                   |         '----> CANCELLED
//!                   '--> FAILED
//! ```
//!
//! Finished handlers return to `UNDETERMINED` at the end of the tick in which
//! they finished. See [`HandlerState`].
//!
//! ## Input
//!
//! Feed normalized [`PointerEvent`](understory_pointer::PointerEvent)s from
//! `understory_pointer` to [`GestureEngine::handle_pointer`]. Time is virtual:
//! timers (tap windows, long-press holds, fling expiry) fire when the clock is
//! moved past them, either by a later pointer event or by
//! [`GestureEngine::advance_to`]. [`GestureEngine::next_deadline`] tells an
//! adapter when to wake the engine up.
//!
//! ## Arbitration
//!
//! Handlers that share a pointer exclude each other: whichever activates last
//! takes over and stops the others. This can be tuned with relations, declared
//! on the [`GestureConfig`] or generated from a [`Composition`] tree:
//!
//! - `simultaneous`: both may be active together.
//! - `wait_for` / `blocks`: one may not begin or activate while the other is live.
//! - `exclusive`: exclusion even without a shared pointer.
//!
//! ## Output
//!
//! Every committed transition, and every update of an active handler, is handed
//! to an [`EventSink`] as a [`GestureEvent`].
//!
//! ## Example
//!
//! A single tap that only fires once a double tap has failed:
//!
//! ```rust
//! use kurbo::Point;
//! use understory_gesture::{
//!     Composition, GestureConfig, GestureEngine, GestureEvent, HandlerId, HandlerState, TapConfig,
//! };
//! use understory_pointer::{PointerEvent, PointerId};
//!
//! let mut engine = GestureEngine::new(Vec::<GestureEvent>::new());
//! let single = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
//! let double = engine
//!     .attach(GestureConfig::tap(TapConfig {
//!         number_of_taps: 2,
//!         ..TapConfig::default()
//!     }))
//!     .unwrap();
//! engine.install(&Composition::sequence([double, single])).unwrap();
//!
//! let at = Point::new(20.0, 20.0);
//! for (id, t) in [(0, 0), (1, 150)] {
//!     engine.handle_pointer(&PointerEvent::down(PointerId(id), at, t));
//!     engine.handle_pointer(&PointerEvent::up(PointerId(id), at, t + 50));
//! }
//!
//! let reached = |handler: HandlerId, state: HandlerState| {
//!     engine.sink().iter().any(|event| {
//!         event.handler() == handler && event.transition().is_some_and(|(_, to)| to == state)
//!     })
//! };
//! assert!(reached(double, HandlerState::End));
//! assert!(!reached(single, HandlerState::Began));
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for `kurbo`.
//! - `libm`: enables `no_std` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod arbiter;
mod composition;
mod config;
mod detectors;
mod engine;
mod error;
mod event;
mod handler;
mod pan_props;
mod recognizers;
mod relations;
mod state;
mod timers;
mod types;

#[cfg(test)]
mod tests;

pub use composition::Composition;
pub use config::{
    CommonConfig, DEFAULT_TOUCH_SLOP, Directions, EngineConfig, FlingConfig, GestureConfig,
    KindConfig, LongPressConfig, MouseButtons, PinchConfig, RelationConfig, RotationConfig,
    TapConfig,
};
pub use detectors::{RotationDetector, ScaleDetector};
pub use engine::GestureEngine;
pub use error::{CompositionError, ConfigError};
pub use event::{EventSink, FnSink, GestureData, GestureDetails, GestureEvent};
pub use pan_props::{OffsetRange, PanConfig, PanProps};
pub use relations::{Relation, RelationKind, RelationSet};
pub use state::HandlerState;
pub use types::{GestureKind, HandlerId};
