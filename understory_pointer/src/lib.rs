// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_pointer --heading-base-level=0

//! Understory Pointer: pointer tracking and velocity estimation.
//!
//! This crate is the numeric foundation for gesture recognition. It provides:
//! - A normalized [`PointerEvent`] shape that platform adapters translate their
//!   native touch, mouse, or pen input into.
//! - A [`PointerTracker`] that owns the table of live pointers, each with a
//!   bounded history of timestamped [`Sample`]s.
//! - A [`VelocityEstimator`] that fits a weighted least-squares polynomial to a
//!   pointer's recent history (see [`lsq`]) and reports its velocity in
//!   pixels per second.
//!
//! Timestamps are in milliseconds. Positions are in whatever 2D coordinate space
//! the adapter chooses, as long as it is consistent for one pointer sequence.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_pointer::{PointerEvent, PointerId, PointerTracker, VelocityEstimator};
//!
//! let id = PointerId(1);
//! let mut tracker = PointerTracker::new();
//! tracker.add(&PointerEvent::down(id, Point::new(0.0, 0.0), 0));
//! for step in 1..=5_u32 {
//!     let t = u64::from(step) * 10;
//!     tracker.update(&PointerEvent::moved(id, Point::new(f64::from(step) * 5.0, 0.0), t));
//! }
//!
//! // 5px every 10ms is 500px/s.
//! let estimator = VelocityEstimator::default();
//! let velocity = estimator.estimate(tracker.get(id).unwrap()).unwrap();
//! assert!((velocity.x - 500.0).abs() < 1e-6);
//! assert!(velocity.y.abs() < 1e-6);
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

mod event;
pub mod lsq;
mod tracker;
mod velocity;

pub use event::{PointerEvent, PointerId, PointerKind, PointerPhase};
pub use lsq::{LeastSquaresSolver, PolynomialFit};
pub use tracker::{DEFAULT_HISTORY_CAPACITY, Pointer, PointerTracker, Sample};
pub use velocity::{VelocityConfig, VelocityEstimator, Weighting};
