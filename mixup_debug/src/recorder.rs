// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use mixup_core::frame::FrameIndex;
use mixup_core::scheduler::{Task, TaskId};
use mixup_core::stage::StageKind;
use mixup_core::time::{Duration, HostTime};
use mixup_core::trace::{
    FramePushedEvent, FramesPrunedEvent, MeasureEvent, StageChangeEvent, TaskAction, TaskEvent,
    TraceSink, TransientEvent, TransientKind,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_PUSHED: u8 = 1;
const TAG_FRAMES_PRUNED: u8 = 2;
const TAG_STAGE_CHANGE: u8 = 3;
const TAG_MEASURE: u8 = 4;
const TAG_TASK: u8 = 5;
const TAG_TRANSIENT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }

    fn write_stage(&mut self, s: StageKind) {
        self.write_u8(match s {
            StageKind::Stale => 0,
            StageKind::Measure => 1,
            StageKind::Commit => 2,
            StageKind::Animate => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_pushed(&mut self, e: &FramePushedEvent) {
        self.write_u8(TAG_FRAME_PUSHED);
        self.write_u64(e.at.millis());
        self.write_u64(e.frame.0);
        self.write_u32(e.keys);
        self.write_bool(e.replaced);
    }

    fn on_frames_pruned(&mut self, e: &FramesPrunedEvent) {
        self.write_u8(TAG_FRAMES_PRUNED);
        self.write_u64(e.at.millis());
        self.write_u32(e.dropped);
        self.write_u32(e.retained);
    }

    fn on_stage_change(&mut self, e: &StageChangeEvent) {
        self.write_u8(TAG_STAGE_CHANGE);
        self.write_u64(e.at.millis());
        self.write_stage(e.from);
        self.write_stage(e.to);
        self.write_bool(e.while_animating);
        self.write_u32(e.frames);
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        self.write_u8(TAG_MEASURE);
        self.write_u64(e.at.millis());
        self.write_u64(e.frame.0);
        self.write_bool(e.complete);
    }

    fn on_task(&mut self, e: &TaskEvent) {
        self.write_u8(TAG_TASK);
        self.write_u64(e.at.millis());
        self.write_u64(e.id.0);
        self.write_u8(match e.task {
            Task::FinishMeasure => 0,
            Task::StartAnimation => 1,
            Task::Settle => 2,
        });
        self.write_option_u64(e.delay.map(Duration::millis));
        self.write_u8(match e.action {
            TaskAction::Scheduled => 0,
            TaskAction::Fired => 1,
            TaskAction::Cancelled => 2,
            TaskAction::Ignored => 3,
        });
    }

    fn on_transient(&mut self, e: &TransientEvent) {
        self.write_u8(TAG_TRANSIENT);
        self.write_u64(e.at.millis());
        self.write_u8(match e.kind {
            TransientKind::UnknownFrame => 0,
            TransientKind::UnknownKey => 1,
            TransientKind::MetricsMismatch => 2,
            TransientKind::OutOfStage => 3,
        });
        self.write_u32(e.count);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`FramePushedEvent`].
    FramePushed(FramePushedEvent),
    /// A [`FramesPrunedEvent`].
    FramesPruned(FramesPrunedEvent),
    /// A [`StageChangeEvent`].
    StageChange(StageChangeEvent),
    /// A [`MeasureEvent`].
    Measure(MeasureEvent),
    /// A [`TaskEvent`].
    Task(TaskEvent),
    /// A [`TransientEvent`].
    Transient(TransientEvent),
}

impl RecordedEvent {
    /// Scheduler time the event was emitted at.
    #[must_use]
    pub fn at(&self) -> HostTime {
        match self {
            Self::FramePushed(e) => e.at,
            Self::FramesPruned(e) => e.at,
            Self::StageChange(e) => e.at,
            Self::Measure(e) => e.at,
            Self::Task(e) => e.at,
            Self::Transient(e) => e.at,
        }
    }
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_u8(&mut self) -> Option<u8> {
        if self.remaining() < 1 {
            return None;
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_u32(&mut self) -> Option<u32> {
        if self.remaining() < 4 {
            return None;
        }
        let v = u32::from_le_bytes(self.data[self.pos..self.pos + 4].try_into().ok()?);
        self.pos += 4;
        Some(v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        if self.remaining() < 8 {
            return None;
        }
        let v = u64::from_le_bytes(self.data[self.pos..self.pos + 8].try_into().ok()?);
        self.pos += 8;
        Some(v)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_stage(&mut self) -> Option<StageKind> {
        Some(match self.read_u8()? {
            0 => StageKind::Stale,
            1 => StageKind::Measure,
            2 => StageKind::Commit,
            _ => StageKind::Animate,
        })
    }

    fn decode_frame_pushed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FramePushed(FramePushedEvent {
            at: self.read_time()?,
            frame: FrameIndex(self.read_u64()?),
            keys: self.read_u32()?,
            replaced: self.read_bool()?,
        }))
    }

    fn decode_frames_pruned(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FramesPruned(FramesPrunedEvent {
            at: self.read_time()?,
            dropped: self.read_u32()?,
            retained: self.read_u32()?,
        }))
    }

    fn decode_stage_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StageChange(StageChangeEvent {
            at: self.read_time()?,
            from: self.read_stage()?,
            to: self.read_stage()?,
            while_animating: self.read_bool()?,
            frames: self.read_u32()?,
        }))
    }

    fn decode_measure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Measure(MeasureEvent {
            at: self.read_time()?,
            frame: FrameIndex(self.read_u64()?),
            complete: self.read_bool()?,
        }))
    }

    fn decode_task(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Task(TaskEvent {
            at: self.read_time()?,
            id: TaskId(self.read_u64()?),
            task: match self.read_u8()? {
                0 => Task::FinishMeasure,
                1 => Task::StartAnimation,
                _ => Task::Settle,
            },
            delay: self.read_option_u64()?.map(Duration),
            action: match self.read_u8()? {
                0 => TaskAction::Scheduled,
                1 => TaskAction::Fired,
                2 => TaskAction::Cancelled,
                _ => TaskAction::Ignored,
            },
        }))
    }

    fn decode_transient(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Transient(TransientEvent {
            at: self.read_time()?,
            kind: match self.read_u8()? {
                0 => TransientKind::UnknownFrame,
                1 => TransientKind::UnknownKey,
                2 => TransientKind::MetricsMismatch,
                _ => TransientKind::OutOfStage,
            },
            count: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_FRAME_PUSHED => self.decode_frame_pushed(),
            TAG_FRAMES_PRUNED => self.decode_frames_pruned(),
            TAG_STAGE_CHANGE => self.decode_stage_change(),
            TAG_MEASURE => self.decode_measure(),
            TAG_TASK => self.decode_task(),
            TAG_TRANSIENT => self.decode_transient(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;
    use mixup_core::config::{DynamicDirection, Options};
    use mixup_core::key::Key;
    use mixup_harness::{Axis, Driver, GridHost};

    fn keys(ns: &[i64]) -> Vec<Key> {
        ns.iter().copied().map(Key::from).collect()
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_measure(&MeasureEvent {
            at: HostTime(3),
            frame: FrameIndex(1),
            complete: true,
        });
        let bytes = rec.as_bytes();
        assert_eq!(decode(&bytes[..bytes.len() - 1]).count(), 0);
    }

    #[test]
    fn task_delay_survives_recording() {
        let mut rec = RecorderSink::new();
        let delayed = TaskEvent {
            at: HostTime(40),
            id: TaskId(9),
            task: Task::Settle,
            delay: Some(Duration(500)),
            action: TaskAction::Scheduled,
        };
        let paint = TaskEvent {
            delay: None,
            task: Task::StartAnimation,
            ..delayed
        };
        rec.on_task(&delayed);
        rec.on_task(&paint);
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![RecordedEvent::Task(delayed), RecordedEvent::Task(paint)]
        );
    }

    #[test]
    fn records_a_whole_cycle_in_order() {
        let mut rec = RecorderSink::new();
        {
            let opts = Options::new(DynamicDirection::Horizontal, Duration(200));
            let host = GridHost::new(Axis::Row, Size::new(10.0, 10.0));
            let mut driver = Driver::new(&keys(&[1, 2, 3]), opts, host)
                .unwrap()
                .with_sink(&mut rec);
            driver.set_keys(&keys(&[3, 1, 2])).unwrap();
            driver.run_until_idle(8);
        }

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        let stages: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::StageChange(s) => Some(s.to),
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                StageKind::Measure,
                StageKind::Commit,
                StageKind::Animate,
                StageKind::Stale
            ]
        );
        assert!(matches!(
            events[0],
            RecordedEvent::FramePushed(FramePushedEvent {
                keys: 3,
                replaced: false,
                ..
            })
        ));
        assert!(events.windows(2).all(|w| w[0].at() <= w[1].at()));
        assert!(events.iter().any(|e| matches!(
            e,
            RecordedEvent::FramesPruned(FramesPrunedEvent {
                dropped: 1,
                retained: 1,
                ..
            })
        )));
    }
}
