// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decides whether a handler may enter `BEGAN` or `ACTIVE`.
//!
//! Two rules apply, in order:
//!
//! 1. A handler may not begin or activate while a handler it waits for (see
//!    [`RelationSet::must_wait_for`]) is `BEGAN` or `ACTIVE`.
//! 2. A handler entering `ACTIVE` takes over from every live handler it
//!    conflicts with: those get `CANCELLED` (if active) or `FAILED` (if they
//!    only began). Handlers whose intents are still deferred drop them. Two handlers conflict when they share a pointer or are
//!    related as `Exclusive`, unless they are related as `Simultaneous`.
//!    A pointer counts as shared for the rest of both cycles, even after it
//!    lifted: a tap activating on its up still stops every other tap that
//!    saw the same finger.
//!
//! When two conflicting handlers activate during the same tick, the one
//! attached first keeps priority: a later-attached handler cannot take over
//! from an earlier one that activated in this tick and fails instead.

use smallvec::SmallVec;

use crate::handler::Handler;
use crate::{HandlerId, HandlerState, RelationSet};

/// Outcome of an arbitration request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// Go ahead after stopping the listed handlers.
    Allow(SmallVec<[HandlerId; 4]>),
    /// Keep the request pending.
    Wait,
    /// A same-tick activation with priority wins; fail instead.
    Lose,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct Arbiter<'a> {
    pub(crate) handlers: &'a [Option<Handler>],
    pub(crate) relations: &'a RelationSet,
    pub(crate) tick: u64,
}

impl Arbiter<'_> {
    fn live(&self) -> impl Iterator<Item = &Handler> + '_ {
        self.handlers
            .iter()
            .flatten()
            .filter(|h| h.state.is_live())
    }

    /// Live handlers plus those holding a deferred intent.
    fn contenders(&self) -> impl Iterator<Item = &Handler> + '_ {
        self.handlers
            .iter()
            .flatten()
            .filter(|h| h.state.is_live() || h.deferred.is_some())
    }

    /// Whether `waiter` is held back by a live handler it waits for.
    pub(crate) fn is_waiting(&self, waiter: HandlerId) -> bool {
        self.live()
            .any(|other| other.id != waiter && self.relations.must_wait_for(waiter, other.id))
    }

    /// Whether activating `a` would stop `b`.
    pub(crate) fn conflicts(&self, a: &Handler, b: &Handler) -> bool {
        a.id != b.id
            && !self.relations.is_simultaneous(a.id, b.id)
            && (self.relations.is_exclusive(a.id, b.id)
                || a.shares_pointer_with(b))
    }

    pub(crate) fn decide(&self, id: HandlerId, to: HandlerState) -> Verdict {
        if self.is_waiting(id) {
            return Verdict::Wait;
        }
        let mut losers = SmallVec::new();
        if to != HandlerState::Active {
            return Verdict::Allow(losers);
        }
        let Some(me) = self.handlers.get(id.idx()).and_then(Option::as_ref) else {
            return Verdict::Allow(losers);
        };
        for other in self.contenders().filter(|other| self.conflicts(me, other)) {
            if other.state == HandlerState::Active
                && other.activated_tick == Some(self.tick)
                && other.id < id
            {
                return Verdict::Lose;
            }
            losers.push(other.id);
        }
        Verdict::Allow(losers)
    }
}
