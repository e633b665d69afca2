// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the stage machine.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the [`StageMachine`](crate::machine::StageMachine) calls as it pushes
//! frames, measures them, schedules work and changes stage. All method bodies
//! default to no-ops, so implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::frame::FrameIndex;
use crate::scheduler::{Task, TaskId};
use crate::stage::StageKind;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened to a scheduled task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskAction {
    /// Handed to the scheduler.
    Scheduled,
    /// Delivered and acted upon.
    Fired,
    /// Withdrawn before delivery.
    Cancelled,
    /// Delivered but no longer expected.
    Ignored,
}

/// A host report the machine absorbed instead of acting on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransientKind {
    /// Geometry for a frame that is no longer retained.
    UnknownFrame,
    /// Geometry for a key that is not part of the frame.
    UnknownKey,
    /// Cell geometry reported for a container, or the reverse.
    MetricsMismatch,
    /// Geometry arrived outside the measure stage.
    OutOfStage,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a key change creates a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePushedEvent {
    /// Scheduler time.
    pub at: HostTime,
    /// The new frame.
    pub frame: FrameIndex,
    /// Number of keys in the new ordering.
    pub keys: u32,
    /// Whether the store was replaced instead of appended to.
    pub replaced: bool,
}

/// Emitted when older frames are dropped from the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramesPrunedEvent {
    /// Scheduler time.
    pub at: HostTime,
    /// Frames dropped.
    pub dropped: u32,
    /// Frames still retained.
    pub retained: u32,
}

/// Emitted on every stage transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageChangeEvent {
    /// Scheduler time.
    pub at: HostTime,
    /// Previous stage.
    pub from: StageKind,
    /// New stage.
    pub to: StageKind,
    /// The new stage's `while_animating` flag.
    pub while_animating: bool,
    /// Frames retained after the transition.
    pub frames: u32,
}

/// Emitted when a frame's first layout read is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeasureEvent {
    /// Scheduler time.
    pub at: HostTime,
    /// The measured frame.
    pub frame: FrameIndex,
    /// Whether every key and the container reported geometry.
    pub complete: bool,
}

/// Emitted for scheduler traffic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskEvent {
    /// Scheduler time.
    pub at: HostTime,
    /// Task handle.
    pub id: TaskId,
    /// Task kind.
    pub task: Task,
    /// Requested delay; `None` for paint-aligned tasks.
    pub delay: Option<Duration>,
    /// What happened.
    pub action: TaskAction,
}

/// Emitted when the machine absorbs host reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransientEvent {
    /// Scheduler time.
    pub at: HostTime,
    /// What was absorbed.
    pub kind: TransientKind,
    /// How many reports of this kind since the last paint.
    pub count: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the stage machine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a frame is created for a key change.
    fn on_frame_pushed(&mut self, e: &FramePushedEvent) {
        _ = e;
    }

    /// Called when frames are dropped.
    fn on_frames_pruned(&mut self, e: &FramesPrunedEvent) {
        _ = e;
    }

    /// Called on every stage transition.
    fn on_stage_change(&mut self, e: &StageChangeEvent) {
        _ = e;
    }

    /// Called when a frame is first measured.
    fn on_measure(&mut self, e: &MeasureEvent) {
        _ = e;
    }

    /// Called for scheduler traffic.
    fn on_task(&mut self, e: &TaskEvent) {
        _ = e;
    }

    /// Called when host reports were absorbed.
    fn on_transient(&mut self, e: &TransientEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`FramePushedEvent`].
    #[inline]
    pub fn frame_pushed(&mut self, e: &FramePushedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frame_pushed(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FramesPrunedEvent`].
    #[inline]
    pub fn frames_pruned(&mut self, e: &FramesPrunedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_frames_pruned(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`StageChangeEvent`].
    #[inline]
    pub fn stage_change(&mut self, e: &StageChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_stage_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`MeasureEvent`].
    #[inline]
    pub fn measure(&mut self, e: &MeasureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_measure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TaskEvent`].
    #[inline]
    pub fn task(&mut self, e: &TaskEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_task(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`TransientEvent`].
    #[inline]
    pub fn transient(&mut self, e: &TransientEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_transient(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
