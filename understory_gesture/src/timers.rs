// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual-time timer queue.
//!
//! Timers never run on their own. The engine pops due entries when it is
//! advanced, so a firing timer is linearized with pointer input. Cancelling
//! is lazy: every entry records the owner's epoch at scheduling time, and
//! entries whose epoch no longer matches are dropped when popped.

use alloc::collections::BinaryHeap;
use core::cmp::{Ordering, Reverse};

use crate::HandlerId;
use crate::handler::Timer;

#[derive(Copy, Clone, Debug)]
pub(crate) struct TimerEntry {
    pub(crate) deadline: u64,
    seq: u64,
    pub(crate) handler: HandlerId,
    pub(crate) epoch: u64,
    pub(crate) timer: Timer,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TimerQueue {
    heap: BinaryHeap<Reverse<TimerEntry>>,
    next_seq: u64,
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, deadline: u64, handler: HandlerId, epoch: u64, timer: Timer) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(TimerEntry {
            deadline,
            seq,
            handler,
            epoch,
            timer,
        }));
    }

    /// Earliest pending deadline, including entries that may turn out stale.
    pub(crate) fn next_deadline(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(e)| e.deadline)
    }

    /// Pops the earliest entry due at or before `now`. Ties fire in
    /// scheduling order.
    pub(crate) fn pop_due(&mut self, now: u64) -> Option<TimerEntry> {
        if self.next_deadline()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(e)| e)
    }

    /// Drops stale entries at the front so `next_deadline` stays useful.
    pub(crate) fn prune(&mut self, mut is_live: impl FnMut(&TimerEntry) -> bool) {
        while let Some(Reverse(front)) = self.heap.peek() {
            if is_live(front) {
                break;
            }
            self.heap.pop();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }
}
