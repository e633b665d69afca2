// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Animation stages.

use core::fmt;

use crate::frame::FrameIndex;

/// The active stage of a [`StageMachine`](crate::machine::StageMachine).
///
/// Exactly one stage is active at a time. Stages only change inside the
/// machine; key-set updates mutate the frame store and let the machine react.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// At rest: `frame` is rendered in normal flow with no transform.
    Stale {
        /// The frame being rendered.
        frame: FrameIndex,
    },
    /// A new frame was pushed and is being painted off-screen so its
    /// geometry can be read.
    Measure {
        /// The frame whose arrival started this measurement.
        frame_to_measure: FrameIndex,
        /// Whether an animation was already in flight.
        while_animating: bool,
    },
    /// Measurement is complete; cells are pinned at their starting position
    /// with transitions disabled.
    Commit {
        /// Whether an animation was already in flight.
        while_animating: bool,
    },
    /// Cells are rendered at their target position with transitions enabled.
    Animate,
}

impl Stage {
    /// Returns the payload-free discriminant.
    #[must_use]
    pub const fn kind(self) -> StageKind {
        match self {
            Self::Stale { .. } => StageKind::Stale,
            Self::Measure { .. } => StageKind::Measure,
            Self::Commit { .. } => StageKind::Commit,
            Self::Animate => StageKind::Animate,
        }
    }

    /// Returns the `while_animating` flag, or `false` for stages that do not
    /// carry one.
    #[must_use]
    pub const fn while_animating(self) -> bool {
        match self {
            Self::Measure {
                while_animating, ..
            }
            | Self::Commit { while_animating } => while_animating,
            Self::Stale { .. } | Self::Animate => false,
        }
    }
}

/// Stage discriminant, as reported to hosts and trace sinks.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// See [`Stage::Stale`].
    Stale,
    /// See [`Stage::Measure`].
    Measure,
    /// See [`Stage::Commit`].
    Commit,
    /// See [`Stage::Animate`].
    Animate,
}

impl StageKind {
    /// Returns the upper-case stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stale => "STALE",
            Self::Measure => "MEASURE",
            Self::Commit => "COMMIT",
            Self::Animate => "ANIMATE",
        }
    }
}

impl fmt::Debug for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
