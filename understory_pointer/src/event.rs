// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Normalized pointer input.

use core::fmt;

use kurbo::Point;

/// Identifier of one contact point for the lifetime of its press.
///
/// Adapters may reuse ids once the pointer has been lifted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointerId(pub u64);

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pointer#{}", self.0)
    }
}

/// The device class that produced a pointer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// A finger on a touch surface.
    #[default]
    Touch,
    /// A mouse or trackpad cursor.
    Mouse,
    /// A stylus.
    Pen,
}

/// Where an event sits in its pointer's lifecycle.
///
/// `Down` and `Up` describe the first pointer going down and the last pointer
/// going up of a whole multi-touch sequence; `AdditionalDown` and
/// `AdditionalUp` describe the pointers in between.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// First pointer of a sequence made contact.
    Down,
    /// Another pointer made contact while at least one was already down.
    AdditionalDown,
    /// A tracked pointer moved.
    Move,
    /// A pointer lifted while others remain down.
    AdditionalUp,
    /// The last pointer of a sequence lifted.
    Up,
    /// The platform took the pointer away (for example, a system gesture).
    Cancel,
}

impl PointerPhase {
    /// Returns `true` for `Down` and `AdditionalDown`.
    pub const fn is_down(self) -> bool {
        matches!(self, Self::Down | Self::AdditionalDown)
    }

    /// Returns `true` for `Up` and `AdditionalUp`.
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Up | Self::AdditionalUp)
    }
}

/// One normalized pointer event, as delivered by a platform adapter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Which contact this event belongs to.
    pub id: PointerId,
    /// Position in the adapter's coordinate space.
    pub position: Point,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Lifecycle phase.
    pub phase: PointerPhase,
    /// Device class.
    pub kind: PointerKind,
    /// Pressed mouse buttons as a bit set (bit 0 is the primary button), if known.
    pub buttons: Option<u8>,
}

impl PointerEvent {
    /// Creates a touch event with the given phase.
    pub const fn new(id: PointerId, phase: PointerPhase, position: Point, timestamp: u64) -> Self {
        Self {
            id,
            position,
            timestamp,
            phase,
            kind: PointerKind::Touch,
            buttons: None,
        }
    }

    /// A touch `Down` event.
    pub const fn down(id: PointerId, position: Point, timestamp: u64) -> Self {
        Self::new(id, PointerPhase::Down, position, timestamp)
    }

    /// A touch `AdditionalDown` event.
    pub const fn additional_down(id: PointerId, position: Point, timestamp: u64) -> Self {
        Self::new(id, PointerPhase::AdditionalDown, position, timestamp)
    }

    /// A touch `Move` event.
    pub const fn moved(id: PointerId, position: Point, timestamp: u64) -> Self {
        Self::new(id, PointerPhase::Move, position, timestamp)
    }

    /// A touch `AdditionalUp` event.
    pub const fn additional_up(id: PointerId, position: Point, timestamp: u64) -> Self {
        Self::new(id, PointerPhase::AdditionalUp, position, timestamp)
    }

    /// A touch `Up` event.
    pub const fn up(id: PointerId, position: Point, timestamp: u64) -> Self {
        Self::new(id, PointerPhase::Up, position, timestamp)
    }

    /// A `Cancel` event.
    pub const fn cancel(id: PointerId, position: Point, timestamp: u64) -> Self {
        Self::new(id, PointerPhase::Cancel, position, timestamp)
    }

    /// Returns the same event attributed to a different device class.
    pub const fn with_kind(mut self, kind: PointerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the same event carrying a mouse button set.
    pub const fn with_buttons(mut self, buttons: u8) -> Self {
        self.buttons = Some(buttons);
        self
    }
}
