// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The live pointer table.
//!
//! [`PointerTracker`] is the only owner of pointer state. Everything downstream
//! (detectors, recognizers, the velocity estimator) reads [`Pointer`] snapshots
//! through shared references and never mutates them.
//!
//! ## Rules
//!
//! 1. **Add** creates a pointer with a single-sample history. Adding an id that
//!    is already tracked is rejected.
//! 2. **Update** appends a sample. Samples whose timestamp is older than the
//!    pointer's newest sample are dropped so each history is monotonic.
//!    Equal timestamps are accepted.
//! 3. **Remove** forgets the pointer.
//! 4. Update and remove for unknown ids are silent no-ops: a consumer may have
//!    been reset mid-stream and still forward events for pointers it no longer owns.
//! 5. Histories are bounded; once full, the oldest sample is evicted.

use alloc::collections::VecDeque;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use smallvec::SmallVec;

use crate::{PointerEvent, PointerId, PointerKind};

/// Default number of samples kept per pointer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One timestamped position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sample {
    /// Position at `timestamp`.
    pub position: Point,
    /// Milliseconds.
    pub timestamp: u64,
}

/// A tracked contact point and its recent history.
#[derive(Clone, Debug)]
pub struct Pointer {
    id: PointerId,
    kind: PointerKind,
    buttons: Option<u8>,
    down: Sample,
    history: VecDeque<Sample>,
}

impl Pointer {
    fn new(event: &PointerEvent, capacity: usize) -> Self {
        let sample = Sample {
            position: event.position,
            timestamp: event.timestamp,
        };
        let mut history = VecDeque::with_capacity(capacity);
        history.push_back(sample);
        Self {
            id: event.id,
            kind: event.kind,
            buttons: event.buttons,
            down: sample,
            history,
        }
    }

    /// The pointer's id.
    pub fn id(&self) -> PointerId {
        self.id
    }

    /// The device class that produced this pointer.
    pub fn kind(&self) -> PointerKind {
        self.kind
    }

    /// Mouse buttons reported when the pointer went down.
    pub fn buttons(&self) -> Option<u8> {
        self.buttons
    }

    /// The sample recorded when the pointer went down.
    ///
    /// This survives history eviction.
    pub fn down(&self) -> Sample {
        self.down
    }

    /// The newest sample.
    pub fn latest(&self) -> Sample {
        // History is never empty: it starts with the down sample and eviction
        // only happens right before a push.
        self.history.back().copied().unwrap_or(self.down)
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.latest().position
    }

    /// Timestamp of the newest sample.
    pub fn timestamp(&self) -> u64 {
        self.latest().timestamp
    }

    /// Offset from the down position to the current position.
    pub fn displacement(&self) -> Vec2 {
        self.position() - self.down.position
    }

    /// Samples from oldest to newest.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.history.iter()
    }

    fn push(&mut self, sample: Sample, capacity: usize) -> bool {
        if sample.timestamp < self.timestamp() {
            log::trace!(
                "{}: dropping sample at {}ms, older than {}ms",
                self.id,
                sample.timestamp,
                self.timestamp()
            );
            return false;
        }
        while self.history.len() >= capacity.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(sample);
        true
    }
}

/// Table of live pointers keyed by id, in arrival order.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    pointers: HashMap<PointerId, Pointer>,
    order: SmallVec<[PointerId; 4]>,
    capacity: usize,
}

impl PointerTracker {
    /// Creates a tracker keeping [`DEFAULT_HISTORY_CAPACITY`] samples per pointer.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a tracker keeping `capacity` samples per pointer.
    ///
    /// A capacity of zero is treated as one; a pointer always knows where it is.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pointers: HashMap::new(),
            order: SmallVec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Samples kept per pointer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Starts tracking the pointer in `event`.
    ///
    /// Returns `false` (and changes nothing) if the id is already tracked.
    pub fn add(&mut self, event: &PointerEvent) -> bool {
        if self.pointers.contains_key(&event.id) {
            log::warn!("{} is already down; ignoring duplicate add", event.id);
            return false;
        }
        log::trace!(
            "{} down at ({}, {}) t={}",
            event.id,
            event.position.x,
            event.position.y,
            event.timestamp
        );
        self.pointers
            .insert(event.id, Pointer::new(event, self.capacity));
        self.order.push(event.id);
        true
    }

    /// Appends the event's position to its pointer's history.
    ///
    /// Returns `false` if the pointer is unknown or the sample was dropped for
    /// going back in time.
    pub fn update(&mut self, event: &PointerEvent) -> bool {
        let Some(pointer) = self.pointers.get_mut(&event.id) else {
            return false;
        };
        let sample = Sample {
            position: event.position,
            timestamp: event.timestamp,
        };
        pointer.push(sample, self.capacity)
    }

    /// Stops tracking a pointer, returning its final state.
    pub fn remove(&mut self, id: PointerId) -> Option<Pointer> {
        let pointer = self.pointers.remove(&id)?;
        self.order.retain(|other| *other != id);
        log::trace!("{id} removed");
        Some(pointer)
    }

    /// Looks up a pointer.
    pub fn get(&self, id: PointerId) -> Option<&Pointer> {
        self.pointers.get(&id)
    }

    /// Returns `true` if `id` is tracked.
    pub fn contains(&self, id: PointerId) -> bool {
        self.pointers.contains_key(&id)
    }

    /// Number of live pointers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when no pointer is down.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live pointer ids in the order they went down.
    pub fn ids(&self) -> impl ExactSizeIterator<Item = PointerId> + '_ {
        self.order.iter().copied()
    }

    /// Read-only view of all live pointers, in the order they went down.
    pub fn snapshot(&self) -> impl Iterator<Item = &Pointer> + '_ {
        self.order.iter().filter_map(|id| self.pointers.get(id))
    }

    /// Average current position of the given pointers.
    ///
    /// Unknown ids are skipped. Returns `None` if none of them are tracked.
    pub fn centroid(&self, ids: &[PointerId]) -> Option<Point> {
        let mut sum = Vec2::ZERO;
        let mut count = 0_u32;
        for pointer in ids.iter().filter_map(|id| self.pointers.get(id)) {
            sum += pointer.position().to_vec2();
            count += 1;
        }
        (count > 0).then(|| (sum / f64::from(count)).to_point())
    }

    /// Forgets every pointer.
    pub fn clear(&mut self) {
        self.pointers.clear();
        self.order.clear();
    }
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new()
    }
}
