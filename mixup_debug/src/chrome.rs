// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//! Stages become duration spans on thread 0; frame, measurement and task
//! traffic become instant events on thread 1.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use mixup_core::stage::StageKind;
use mixup_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

const STAGE_TID: u32 = 0;
const EVENT_TID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// A stage still open at the end of the recording is closed at the last
/// recorded timestamp.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut open: Option<StageKind> = None;
    let mut last = HostTime(0);

    for recorded in decode(bytes) {
        last = last.max(recorded.at());
        match recorded {
            RecordedEvent::StageChange(e) => {
                if let Some(stage) = open.take() {
                    events.push(span("E", stage, e.at));
                }
                let mut begin = span("B", e.to, e.at);
                begin["args"] = json!({
                    "while_animating": e.while_animating,
                    "frames": e.frames,
                });
                events.push(begin);
                open = Some(e.to);
            }
            RecordedEvent::FramePushed(e) => events.push(instant(
                "FramePushed",
                "Frames",
                e.at,
                json!({
                    "frame": e.frame.0,
                    "keys": e.keys,
                    "replaced": e.replaced,
                }),
            )),
            RecordedEvent::FramesPruned(e) => events.push(instant(
                "FramesPruned",
                "Frames",
                e.at,
                json!({
                    "dropped": e.dropped,
                    "retained": e.retained,
                }),
            )),
            RecordedEvent::Measure(e) => events.push(instant(
                "Measured",
                "Frames",
                e.at,
                json!({
                    "frame": e.frame.0,
                    "complete": e.complete,
                }),
            )),
            RecordedEvent::Task(e) => events.push(instant(
                e.task.name(),
                "Tasks",
                e.at,
                json!({
                    "id": e.id.0,
                    "action": format!("{:?}", e.action),
                    "delay_ms": e.delay.map(|d| d.millis()),
                }),
            )),
            RecordedEvent::Transient(e) => events.push(instant(
                "Transient",
                "Host",
                e.at,
                json!({
                    "kind": format!("{:?}", e.kind),
                    "count": e.count,
                }),
            )),
        }
    }
    if let Some(stage) = open {
        events.push(span("E", stage, last));
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn span(ph: &str, stage: StageKind, at: HostTime) -> Value {
    json!({
        "ph": ph,
        "name": stage.name(),
        "cat": "Stage",
        "ts": millis_to_us(at),
        "pid": 0,
        "tid": STAGE_TID,
    })
}

fn instant(name: &str, cat: &str, at: HostTime, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": millis_to_us(at),
        "pid": 0,
        "tid": EVENT_TID,
        "s": "t",
        "args": args,
    })
}

fn millis_to_us(at: HostTime) -> u64 {
    at.millis().saturating_mul(1000)
}
