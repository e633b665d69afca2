// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted reorders that exercise the tracing and diagnostics pipeline.
//!
//! Drives a [`Driver`](mixup_harness::Driver) through a plain reorder, a
//! reorder that lands mid-flight, a removal and a debug-measure pause,
//! recording events to both a
//! [`PrettyPrintSink`](mixup_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](mixup_debug::recorder::RecorderSink), then exports a
//! Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use kurbo::Size;
use mixup_core::config::{DynamicDirection, Options};
use mixup_core::key::Key;
use mixup_core::time::Duration;
use mixup_core::trace::{
    FramePushedEvent, FramesPrunedEvent, MeasureEvent, StageChangeEvent, TaskEvent, TraceSink,
    TransientEvent,
};
use mixup_debug::pretty::PrettyPrintSink;
use mixup_debug::recorder::RecorderSink;
use mixup_harness::{Axis, Driver, GridHost};

const TRANSITION: Duration = Duration(400);
const MAX_STEPS: usize = 64;

/// Forwards every event to two sinks.
struct Tee<'a> {
    pretty: &'a mut PrettyPrintSink,
    recorder: &'a mut RecorderSink,
}

impl TraceSink for Tee<'_> {
    fn on_frame_pushed(&mut self, e: &FramePushedEvent) {
        self.pretty.on_frame_pushed(e);
        self.recorder.on_frame_pushed(e);
    }

    fn on_frames_pruned(&mut self, e: &FramesPrunedEvent) {
        self.pretty.on_frames_pruned(e);
        self.recorder.on_frames_pruned(e);
    }

    fn on_stage_change(&mut self, e: &StageChangeEvent) {
        self.pretty.on_stage_change(e);
        self.recorder.on_stage_change(e);
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        self.pretty.on_measure(e);
        self.recorder.on_measure(e);
    }

    fn on_task(&mut self, e: &TaskEvent) {
        self.pretty.on_task(e);
        self.recorder.on_task(e);
    }

    fn on_transient(&mut self, e: &TransientEvent) {
        self.pretty.on_transient(e);
        self.recorder.on_transient(e);
    }
}

fn keys(ns: &[i64]) -> Vec<Key> {
    ns.iter().copied().map(Key::from).collect()
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    {
        let mut tee = Tee {
            pretty: &mut pretty,
            recorder: &mut recorder,
        };

        // -- driver --------------------------------------------------------
        let host = GridHost::new(Axis::Row, Size::new(40.0, 40.0));
        let options = Options::new(DynamicDirection::Horizontal, TRANSITION);
        let mut driver = Driver::new(&keys(&[1, 2, 3, 4]), options, host)
            .expect("initial keys are unique")
            .with_sink(&mut tee);

        // 1. Plain reorder.
        driver
            .set_keys(&keys(&[4, 3, 2, 1]))
            .expect("reordered keys are unique");
        let settled = driver.run_until_idle(MAX_STEPS);
        println!("-- reorder settled at {}ms", settled.millis());

        // 2. A second reorder while the first is still animating.
        driver
            .set_keys(&keys(&[2, 4, 1, 3]))
            .expect("reordered keys are unique");
        driver.advance(Duration(200));
        driver
            .set_keys(&keys(&[3, 1, 4, 2]))
            .expect("reordered keys are unique");
        let settled = driver.run_until_idle(MAX_STEPS);
        println!("-- overlapping reorder settled at {}ms", settled.millis());

        // 3. A removal with the measure layer left visible for a while.
        driver
            .set_options(options.with_debug_measure(Some(Duration(250))))
            .expect("options are valid");
        driver
            .set_keys(&keys(&[3, 4, 2]))
            .expect("remaining keys are unique");
        let settled = driver.run_until_idle(MAX_STEPS);
        println!("-- removal settled at {}ms", settled.millis());

        println!(
            "-- stages: {}",
            driver
                .stage_trail()
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(" ")
        );
        driver.teardown();
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    mixup_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path}");
}
