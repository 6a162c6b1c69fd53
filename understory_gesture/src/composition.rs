// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition trees.
//!
//! A [`Composition`] describes how a group of already-attached handlers relate
//! to each other. It compiles once into a flat list of [`Relation`]s that the
//! engine installs next to the relations declared in handler configs.
//!
//! Relations are generated between leaves of *different* children of a group,
//! so nesting works as expected: in `Simultaneous([Race([a, b]), c])`, `a` and
//! `b` exclude each other while both may run together with `c`.
//!
//! ```rust
//! use understory_gesture::{Composition, RelationKind};
//! # use understory_gesture::{GestureConfig, GestureEngine, GestureEvent, TapConfig};
//! # let mut engine = GestureEngine::new(Vec::<GestureEvent>::new());
//! # let single = engine.attach(GestureConfig::tap(TapConfig::default())).unwrap();
//! # let double = engine
//! #     .attach(GestureConfig::tap(TapConfig { number_of_taps: 2, ..TapConfig::default() }))
//! #     .unwrap();
//!
//! // The single tap only fires once the double tap has failed.
//! let tree = Composition::sequence([double, single]);
//! let relations = tree.compile().unwrap();
//! assert_eq!(relations.len(), 1);
//! assert_eq!(relations[0].from, single);
//! assert_eq!(relations[0].kind, RelationKind::WaitFor);
//! ```

use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::{CompositionError, HandlerId, Relation, RelationKind};

/// A tree of handlers and the way they combine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Composition {
    /// One attached handler.
    Single(HandlerId),
    /// The first child to activate cancels the others.
    Race(Vec<Self>),
    /// All children may be active at once.
    Simultaneous(Vec<Self>),
    /// A two-child [`Race`](Self::Race).
    Exclusive(Vec<Self>),
    /// Each child waits until every earlier child has finished.
    Sequence(Vec<Self>),
}

impl From<HandlerId> for Composition {
    fn from(id: HandlerId) -> Self {
        Self::Single(id)
    }
}

impl Composition {
    /// A [`Race`](Self::Race) group.
    pub fn race<C: Into<Self>>(children: impl IntoIterator<Item = C>) -> Self {
        Self::Race(children.into_iter().map(Into::into).collect())
    }

    /// A [`Simultaneous`](Self::Simultaneous) group.
    pub fn simultaneous<C: Into<Self>>(children: impl IntoIterator<Item = C>) -> Self {
        Self::Simultaneous(children.into_iter().map(Into::into).collect())
    }

    /// An [`Exclusive`](Self::Exclusive) pair.
    pub fn exclusive(a: impl Into<Self>, b: impl Into<Self>) -> Self {
        Self::Exclusive(vec![a.into(), b.into()])
    }

    /// A [`Sequence`](Self::Sequence) group.
    pub fn sequence<C: Into<Self>>(children: impl IntoIterator<Item = C>) -> Self {
        Self::Sequence(children.into_iter().map(Into::into).collect())
    }

    fn children(&self) -> &[Self] {
        match self {
            Self::Single(_) => &[],
            Self::Race(c) | Self::Simultaneous(c) | Self::Exclusive(c) | Self::Sequence(c) => c,
        }
    }

    /// Handlers in the tree, depth first.
    pub fn leaves(&self) -> Vec<HandlerId> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<HandlerId>) {
        match self {
            Self::Single(id) => out.push(*id),
            _ => {
                for child in self.children() {
                    child.collect_leaves(out);
                }
            }
        }
    }

    fn validate(&self) -> Result<(), CompositionError> {
        match self {
            Self::Single(_) => return Ok(()),
            Self::Exclusive(c) if c.len() != 2 => {
                return Err(CompositionError::ExclusiveArity(c.len()));
            }
            _ if self.children().is_empty() => return Err(CompositionError::EmptyGroup),
            _ => {}
        }
        self.children().iter().try_for_each(Self::validate)
    }

    /// Flattens the tree into relations.
    ///
    /// Fails on empty groups, an `Exclusive` without exactly two children, or
    /// a handler appearing twice.
    pub fn compile(&self) -> Result<Vec<Relation>, CompositionError> {
        self.validate()?;
        let mut seen = HashSet::new();
        for id in self.leaves() {
            if !seen.insert(id) {
                return Err(CompositionError::DuplicateHandler(id));
            }
        }
        let mut out = Vec::new();
        self.emit(&mut out);
        Ok(out)
    }

    fn emit(&self, out: &mut Vec<Relation>) {
        let relate: fn(HandlerId, HandlerId) -> Relation = match self {
            Self::Single(_) => return,
            Self::Race(_) | Self::Exclusive(_) => {
                |a, b| Relation::new(a, RelationKind::Exclusive, b)
            }
            Self::Simultaneous(_) => |a, b| Relation::new(a, RelationKind::Simultaneous, b),
            Self::Sequence(_) => |earlier, later| Relation::new(later, RelationKind::WaitFor, earlier),
        };
        let children = self.children();
        for child in children {
            child.emit(out);
        }
        let leaves: Vec<Vec<HandlerId>> = children.iter().map(Self::leaves).collect();
        for (i, earlier) in leaves.iter().enumerate() {
            for later in &leaves[i + 1..] {
                for &a in earlier {
                    out.extend(later.iter().map(|&b| relate(a, b)));
                }
            }
        }
    }
}
