// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-handler lifecycle.
//!
//! ```text
//! UNDETERMINED -> BEGAN
//! BEGAN        -> ACTIVE | FAILED
//! ACTIVE       -> END | CANCELLED
//! END | FAILED | CANCELLED -> UNDETERMINED
//! ```

use core::fmt;

/// Lifecycle state of a gesture handler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HandlerState {
    /// Waiting for a qualifying touch.
    #[default]
    Undetermined,
    /// Tracking pointers; activation criterion not yet met.
    Began,
    /// The gesture is recognized and reporting updates.
    Active,
    /// Interrupted after activation.
    Cancelled,
    /// Gave up before activation.
    Failed,
    /// Completed successfully.
    End,
}

impl HandlerState {
    /// Returns `true` if the edge `self -> to` is part of the lifecycle graph.
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Undetermined, Self::Began)
                | (Self::Began, Self::Active | Self::Failed)
                | (Self::Active, Self::End | Self::Cancelled)
                | (Self::End | Self::Failed | Self::Cancelled, Self::Undetermined)
        )
    }

    /// `BEGAN` or `ACTIVE`: the handler currently holds a claim on its pointers.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Began | Self::Active)
    }

    /// `END`, `FAILED` or `CANCELLED`: the cycle is over and awaits reset.
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::End | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Undetermined => "UNDETERMINED",
            Self::Began => "BEGAN",
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::End => "END",
        })
    }
}
