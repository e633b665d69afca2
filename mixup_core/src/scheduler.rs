// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred work requested by the stage machine.
//!
//! The machine never reads a global clock or registers a callback. It asks a
//! [`Scheduler`] to deliver a [`Task`] later and receives a [`TaskId`] it can
//! cancel. When the task comes due the host hands it back through
//! [`StageMachine::fire`](crate::machine::StageMachine::fire); ids the
//! machine no longer expects are ignored, so a late delivery after a cancel
//! is harmless.
//!
//! Browser hosts implement this with `setTimeout` and
//! `requestAnimationFrame`; tests use a virtual clock.

use core::fmt;

use crate::time::{Duration, HostTime};

/// Work the machine asks to have delivered later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Task {
    /// Leave the measure stage.
    FinishMeasure,
    /// Enable transitions after the commit has been painted.
    StartAnimation,
    /// The transition has run its course; come to rest.
    Settle,
}

impl Task {
    /// Returns a short name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FinishMeasure => "finish-measure",
            Self::StartAnimation => "start-animation",
            Self::Settle => "settle",
        }
    }
}

/// Handle for a scheduled [`Task`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

/// Host capability for deferred delivery of [`Task`]s.
///
/// Implementations must never deliver a task synchronously from inside one
/// of these calls, and must never deliver a task after it was cancelled if
/// they can avoid it.
pub trait Scheduler {
    /// Current time on the scheduler's monotonic clock.
    fn now(&self) -> HostTime;

    /// Delivers `task` once the host has painted the current output and a
    /// fresh rendering frame has begun.
    fn after_next_paint(&mut self, task: Task) -> TaskId;

    /// Delivers `task` after `delay` has elapsed. A zero delay still defers
    /// to a later turn of the event loop.
    fn after_delay(&mut self, delay: Duration, task: Task) -> TaskId;

    /// Cancels a pending task. Unknown or already-delivered ids are ignored.
    fn cancel(&mut self, id: TaskId);
}
