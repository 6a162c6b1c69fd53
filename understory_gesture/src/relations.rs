// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The flat relation set consulted by the arbiter.

use hashbrown::HashSet;

use crate::HandlerId;

/// How two handlers interact.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Both may be active together. Symmetric.
    Simultaneous,
    /// `from` may not begin or activate while `to` is live.
    WaitFor,
    /// `to` may not begin or activate while `from` is live.
    Blocks,
    /// Activating one cancels the other, even without shared pointers. Symmetric.
    Exclusive,
}

/// A directed relation between two handlers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Relation {
    /// The declaring side.
    pub from: HandlerId,
    /// The relation.
    pub kind: RelationKind,
    /// The other side.
    pub to: HandlerId,
}

impl Relation {
    /// Creates a relation.
    pub const fn new(from: HandlerId, kind: RelationKind, to: HandlerId) -> Self {
        Self { from, kind, to }
    }
}

/// Every relation known to an engine.
#[derive(Clone, Debug, Default)]
pub struct RelationSet {
    relations: HashSet<Relation>,
}

impl RelationSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a relation. Returns `false` if it was already present.
    pub fn insert(&mut self, relation: Relation) -> bool {
        self.relations.insert(relation)
    }

    /// Whether the exact relation is present.
    pub fn contains(&self, relation: &Relation) -> bool {
        self.relations.contains(relation)
    }

    /// Number of stored relations.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Whether no relation is stored.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Iterates stored relations in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Relation> + '_ {
        self.relations.iter()
    }

    fn either_way(&self, a: HandlerId, kind: RelationKind, b: HandlerId) -> bool {
        self.contains(&Relation::new(a, kind, b)) || self.contains(&Relation::new(b, kind, a))
    }

    /// Whether `a` and `b` may be active together.
    pub fn is_simultaneous(&self, a: HandlerId, b: HandlerId) -> bool {
        self.either_way(a, RelationKind::Simultaneous, b)
    }

    /// Whether `a` and `b` exclude each other regardless of shared pointers.
    pub fn is_exclusive(&self, a: HandlerId, b: HandlerId) -> bool {
        self.either_way(a, RelationKind::Exclusive, b)
    }

    /// Whether `waiter` must wait while `other` is live.
    ///
    /// True for `waiter WaitFor other` and for `other Blocks waiter`.
    pub fn must_wait_for(&self, waiter: HandlerId, other: HandlerId) -> bool {
        self.contains(&Relation::new(waiter, RelationKind::WaitFor, other))
            || self.contains(&Relation::new(other, RelationKind::Blocks, waiter))
    }

    /// Handlers that `waiter` must wait for.
    pub fn awaited_by(&self, waiter: HandlerId) -> impl Iterator<Item = HandlerId> + '_ {
        self.relations.iter().filter_map(move |r| match r.kind {
            RelationKind::WaitFor if r.from == waiter => Some(r.to),
            RelationKind::Blocks if r.to == waiter => Some(r.from),
            _ => None,
        })
    }

    /// Drops every relation mentioning `id`.
    pub fn remove_handler(&mut self, id: HandlerId) {
        self.relations.retain(|r| r.from != id && r.to != id);
    }
}
