// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multi-pointer geometry.
//!
//! Detectors are pure accumulators over pointer positions. They do not know
//! about handler states; the pinch and rotation recognizers feed them and decide
//! when their thresholds matter. Both must be restarted whenever the pointer
//! count drops below two.

mod rotation;
mod scale;

pub use rotation::RotationDetector;
pub use scale::ScaleDetector;
