// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] writes one line per event:
//!
//! ```text
//! [     16ms] stage    STALE -> MEASURE (2 frames)
//! [     16ms] measure  frame #1 complete
//! [     16ms] task     finish-measure #3 scheduled in 0ms
//! ```

use std::io::Write;

use mixup_core::trace::{
    FramePushedEvent, FramesPrunedEvent, MeasureEvent, StageChangeEvent, TaskAction, TaskEvent,
    TraceSink, TransientEvent,
};

/// A [`TraceSink`] that formats events as text.
///
/// Write errors are ignored; tracing never interrupts the animation.
pub struct PrettyPrintSink {
    out: Box<dyn Write>,
}

impl core::fmt::Debug for PrettyPrintSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink writing to `out`.
    #[must_use]
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    fn line(&mut self, at: u64, label: &str, body: core::fmt::Arguments<'_>) {
        let _ = writeln!(self.out, "[{at:>7}ms] {label:<8} {body}");
    }
}

impl TraceSink for PrettyPrintSink {
    fn on_frame_pushed(&mut self, e: &FramePushedEvent) {
        let how = if e.replaced { "replaced store" } else { "pushed" };
        self.line(
            e.at.millis(),
            "frame",
            format_args!("#{} {how} ({} keys)", e.frame.0, e.keys),
        );
    }

    fn on_frames_pruned(&mut self, e: &FramesPrunedEvent) {
        self.line(
            e.at.millis(),
            "prune",
            format_args!("dropped {}, {} retained", e.dropped, e.retained),
        );
    }

    fn on_stage_change(&mut self, e: &StageChangeEvent) {
        let overlap = if e.while_animating {
            ", while animating"
        } else {
            ""
        };
        self.line(
            e.at.millis(),
            "stage",
            format_args!(
                "{} -> {} ({} frames{overlap})",
                e.from.name(),
                e.to.name(),
                e.frames
            ),
        );
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        let state = if e.complete { "complete" } else { "incomplete" };
        self.line(
            e.at.millis(),
            "measure",
            format_args!("frame #{} {state}", e.frame.0),
        );
    }

    fn on_task(&mut self, e: &TaskEvent) {
        let action = match e.action {
            TaskAction::Scheduled => "scheduled",
            TaskAction::Fired => "fired",
            TaskAction::Cancelled => "cancelled",
            TaskAction::Ignored => "ignored",
        };
        match e.delay {
            Some(delay) => self.line(
                e.at.millis(),
                "task",
                format_args!(
                    "{} #{} {action} in {}ms",
                    e.task.name(),
                    e.id.0,
                    delay.millis()
                ),
            ),
            None => self.line(
                e.at.millis(),
                "task",
                format_args!("{} #{} {action}", e.task.name(), e.id.0),
            ),
        }
    }

    fn on_transient(&mut self, e: &TransientEvent) {
        self.line(
            e.at.millis(),
            "host",
            format_args!("absorbed {}x {:?}", e.count, e.kind),
        );
    }
}
