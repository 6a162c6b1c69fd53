// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Attachment-time errors.

use thiserror::Error;

use crate::HandlerId;

/// A handler configuration was rejected when attaching it.
///
/// These never affect handlers that are already attached.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A deprecated option was combined with the option that replaced it.
    #[error("`{legacy}` cannot be used together with `{modern}`")]
    LegacyOffsetConflict {
        /// The deprecated option.
        legacy: &'static str,
        /// The option it conflicts with.
        modern: &'static str,
    },
    /// A `[start, end]` offset range was not negative-then-positive.
    #[error("`{name}` range must be [negative, positive], got [{start}, {end}]")]
    InvalidOffsetRange {
        /// The offending option.
        name: &'static str,
        /// First element.
        start: f64,
        /// Second element.
        end: f64,
    },
    /// A count option is out of range.
    #[error("`{name}` must be at least 1 and consistent with related counts, got {value}")]
    InvalidCount {
        /// The offending option.
        name: &'static str,
        /// The rejected value.
        value: usize,
    },
    /// A fling was configured without any direction.
    #[error("fling needs at least one direction")]
    EmptyDirections,
    /// A relation references a handler that is not attached.
    #[error("relation references unknown {0}")]
    UnknownHandler(HandlerId),
    /// A relation references the handler being attached.
    #[error("{0} cannot be related to itself")]
    SelfRelation(HandlerId),
}

/// A composition tree could not be compiled into relations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompositionError {
    /// A group node has no children.
    #[error("composition group has no children")]
    EmptyGroup,
    /// `Exclusive` takes exactly two children.
    #[error("exclusive composition takes exactly two children, got {0}")]
    ExclusiveArity(usize),
    /// The same handler appears in two leaves.
    #[error("{0} appears more than once in the composition")]
    DuplicateHandler(HandlerId),
    /// A leaf names a handler that is not attached.
    #[error("composition references unknown {0}")]
    UnknownHandler(HandlerId),
}
