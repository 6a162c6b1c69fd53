// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handler identifiers and kind tags.

use core::fmt;

/// Identifier of an attached handler.
///
/// Ids are handed out in attachment order and never reused by one engine, so
/// comparing two ids also compares their attachment order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u32);

impl HandlerId {
    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// The raw attachment index.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// The recognizer a handler runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// Discrete taps.
    Tap,
    /// Continuous drag.
    Pan,
    /// Press and hold.
    LongPress,
    /// Two-finger scale.
    Pinch,
    /// Two-finger rotation.
    Rotation,
    /// Quick directional swipe.
    Fling,
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tap => "tap",
            Self::Pan => "pan",
            Self::LongPress => "long-press",
            Self::Pinch => "pinch",
            Self::Rotation => "rotation",
            Self::Fling => "fling",
        })
    }
}
