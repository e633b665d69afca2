// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace output on the browser console.

use alloc::format;
use alloc::string::String;

use mixup_core::trace::{
    FramePushedEvent, FramesPrunedEvent, MeasureEvent, StageChangeEvent, TaskAction, TaskEvent,
    TraceSink, TransientEvent,
};
use wasm_bindgen::JsValue;

/// A [`TraceSink`] that logs through `console.debug`.
///
/// Stage changes are always logged. Task traffic is noisy and only logged
/// when enabled with [`with_tasks`](Self::with_tasks).
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink {
    tasks: bool,
}

impl ConsoleSink {
    /// Creates a sink that skips task traffic.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: false }
    }

    /// Also logs scheduled, fired and cancelled tasks.
    #[must_use]
    pub const fn with_tasks(mut self, tasks: bool) -> Self {
        self.tasks = tasks;
        self
    }

    fn log(line: String) {
        web_sys::console::debug_1(&JsValue::from_str(&line));
    }
}

impl TraceSink for ConsoleSink {
    fn on_frame_pushed(&mut self, e: &FramePushedEvent) {
        Self::log(format!(
            "[mixup {}ms] frame #{} ({} keys{})",
            e.at.millis(),
            e.frame.0,
            e.keys,
            if e.replaced { ", replaced" } else { "" }
        ));
    }

    fn on_frames_pruned(&mut self, e: &FramesPrunedEvent) {
        Self::log(format!(
            "[mixup {}ms] pruned {} frames, {} retained",
            e.at.millis(),
            e.dropped,
            e.retained
        ));
    }

    fn on_stage_change(&mut self, e: &StageChangeEvent) {
        Self::log(format!(
            "[mixup {}ms] {} -> {}{}",
            e.at.millis(),
            e.from.name(),
            e.to.name(),
            if e.while_animating {
                " (while animating)"
            } else {
                ""
            }
        ));
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        if !e.complete {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "[mixup {}ms] frame #{} measured without full geometry",
                e.at.millis(),
                e.frame.0
            )));
        }
    }

    fn on_task(&mut self, e: &TaskEvent) {
        if !self.tasks {
            return;
        }
        let action = match e.action {
            TaskAction::Scheduled => "scheduled",
            TaskAction::Fired => "fired",
            TaskAction::Cancelled => "cancelled",
            TaskAction::Ignored => "ignored",
        };
        Self::log(format!(
            "[mixup {}ms] {} #{} {action}",
            e.at.millis(),
            e.task.name(),
            e.id.0
        ));
    }

    fn on_transient(&mut self, e: &TransientEvent) {
        Self::log(format!(
            "[mixup {}ms] absorbed {}x {:?}",
            e.at.millis(),
            e.count,
            e.kind
        ));
    }
}
