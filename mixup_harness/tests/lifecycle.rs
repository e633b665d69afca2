// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end stage cycles on a virtual clock.

use kurbo::{Point, Size, Vec2};
use mixup_core::config::{ConfigError, DynamicDirection, Options};
use mixup_core::frame::FrameIndex;
use mixup_core::key::Key;
use mixup_core::render::Layer;
use mixup_core::stage::{Stage, StageKind};
use mixup_core::style::{CellStyle, Placement, Transition};
use mixup_core::time::{Duration, HostTime};
use mixup_core::trace::{MeasureEvent, StageChangeEvent, TraceSink};
use mixup_harness::{Axis, Driver, GridHost};

const CELL: f64 = 10.0;

fn keys(ns: &[i64]) -> Vec<Key> {
    ns.iter().copied().map(Key::from).collect()
}

fn row() -> GridHost {
    GridHost::new(Axis::Row, Size::new(CELL, CELL))
}

fn horizontal(ms: u64) -> Options {
    Options::new(DynamicDirection::Horizontal, Duration(ms))
}

fn visible_keys(layer: &Layer) -> Vec<Key> {
    layer.keys().cloned().collect()
}

fn style_of(layer: &Layer, key: i64) -> CellStyle {
    layer
        .cell(&Key::from(key))
        .map(|c| c.style)
        .unwrap_or_else(|| panic!("key {key} not painted"))
}

fn translate_of(layer: &Layer, key: i64) -> Vec2 {
    style_of(layer, key)
        .transform
        .map(|t| t.translate)
        .unwrap_or_else(|| panic!("key {key} untransformed"))
}

fn scale_of(layer: &Layer, key: i64) -> f64 {
    style_of(layer, key)
        .transform
        .map(|t| t.scale)
        .unwrap_or_else(|| panic!("key {key} untransformed"))
}

#[test]
fn reorder_runs_every_stage_once() {
    let mut d = Driver::new(&keys(&[1, 2, 3]), horizontal(1000), row()).unwrap();
    assert!(d.set_keys(&keys(&[3, 2, 1])).unwrap());

    let measure = d.last_scene();
    assert_eq!(measure.stage, StageKind::Measure);
    assert_eq!(measure.measure.len(), 2);
    assert_eq!(visible_keys(&measure.measure[1]), keys(&[3, 2, 1]));
    assert_eq!(measure.visible.stage, StageKind::Stale);
    assert_eq!(visible_keys(&measure.visible), keys(&[1, 2, 3]));

    assert_eq!(d.advance(Duration::ZERO), 1);
    assert_eq!(
        d.stage(),
        Stage::Commit {
            while_animating: false
        }
    );
    let commit = &d.last_scene().visible;
    assert_eq!(commit.wrapper.width, Some(3.0 * CELL));
    assert_eq!(
        style_of(commit, 3).placement,
        Placement::Absolute {
            origin: Point::new(2.0 * CELL, 0.0)
        }
    );
    assert_eq!(translate_of(commit, 3), Vec2::ZERO);
    assert_eq!(style_of(commit, 3).transition, Transition::Disabled);

    assert_eq!(d.advance_to(HostTime(16)), 1);
    assert_eq!(d.stage(), Stage::Animate);
    let animate = &d.last_scene().visible;
    assert_eq!(translate_of(animate, 3), Vec2::new(-2.0 * CELL, 0.0));
    assert_eq!(translate_of(animate, 1), Vec2::new(2.0 * CELL, 0.0));
    assert_eq!(translate_of(animate, 2), Vec2::ZERO);
    assert_eq!(
        style_of(animate, 1).transition,
        Transition::Transform {
            duration: Duration(1000)
        }
    );

    assert_eq!(d.advance_to(HostTime(1015)), 0);
    assert_eq!(d.stage(), Stage::Animate);
    assert_eq!(d.advance_to(HostTime(1016)), 1);
    assert!(matches!(d.stage(), Stage::Stale { .. }));

    assert_eq!(
        d.stage_trail(),
        vec![
            StageKind::Stale,
            StageKind::Measure,
            StageKind::Commit,
            StageKind::Animate,
            StageKind::Stale
        ]
    );
    assert_eq!(d.machine().frames().len(), 1);
    let rest = &d.last_scene().visible;
    assert_eq!(visible_keys(rest), keys(&[3, 2, 1]));
    assert!(rest.cells.iter().all(|c| c.style == CellStyle::STALE));
    assert_eq!(d.host().mounts(), 3);
    assert_eq!(d.host().unmounts(), 0);
}

#[test]
fn unchanged_keys_do_not_render() {
    let mut d = Driver::new(&keys(&[1, 2, 3]), horizontal(300), row()).unwrap();
    for _ in 0..3 {
        assert!(!d.set_keys(&keys(&[1, 2, 3])).unwrap());
    }
    assert_eq!(d.history().len(), 1);
    assert_eq!(d.scheduler().pending_len(), 0);
}

#[test]
fn keys_are_type_tagged() {
    let mut d = Driver::new(&keys(&[1]), horizontal(300), row()).unwrap();
    assert!(d.set_keys(&[Key::from("1")]).unwrap());
    assert_eq!(d.last_scene().stage, StageKind::Measure);
}

#[test]
fn duplicate_keys_are_rejected() {
    let err = Driver::new(&keys(&[1, 2, 1]), horizontal(300), row()).unwrap_err();
    assert_eq!(err, ConfigError::DuplicateKey(Key::from(1)));

    let mut d = Driver::new(&keys(&[1, 2]), horizontal(300), row()).unwrap();
    let err = d.set_keys(&keys(&[2, 2])).unwrap_err();
    assert_eq!(err.to_string(), "Invalid keys: every key must be unique");
    assert_eq!(d.history().len(), 1);
    assert!(matches!(d.stage(), Stage::Stale { .. }));
}

#[test]
fn axis_off_skips_commit() {
    let opts = Options::new(DynamicDirection::Off, Duration(300));
    let mut d = Driver::new(&keys(&[1, 2]), opts, row()).unwrap();
    d.set_keys(&keys(&[2, 1])).unwrap();
    d.advance(Duration::ZERO);
    let animate = &d.last_scene().visible;
    assert_eq!(animate.stage, StageKind::Animate);
    assert_eq!((animate.wrapper.width, animate.wrapper.height), (None, None));
    d.run_until_idle(8);
    assert_eq!(
        d.stage_trail(),
        vec![
            StageKind::Stale,
            StageKind::Measure,
            StageKind::Animate,
            StageKind::Stale
        ]
    );
}

#[test]
fn vertical_list_pins_height() {
    let opts = Options::new(DynamicDirection::Vertical, Duration(200));
    let host = GridHost::new(Axis::Column, Size::new(CELL, CELL));
    let mut d = Driver::new(&keys(&[1, 2]), opts, host).unwrap();
    d.set_keys(&keys(&[1, 2, 3])).unwrap();

    d.advance(Duration::ZERO);
    let commit = &d.last_scene().visible;
    assert_eq!(commit.wrapper.height, Some(2.0 * CELL));
    assert_eq!(commit.wrapper.width, None);
    assert_eq!(scale_of(commit, 3), 0.0);

    d.advance_to(HostTime(16));
    let animate = &d.last_scene().visible;
    assert_eq!(animate.wrapper.height, Some(3.0 * CELL));
    assert_eq!(scale_of(animate, 3), 1.0);
    assert_eq!(translate_of(animate, 3), Vec2::ZERO);
}

#[test]
fn removed_key_shrinks_in_place() {
    let mut d = Driver::new(&keys(&[1, 2, 3]), horizontal(400), row()).unwrap();
    d.set_keys(&keys(&[1, 3])).unwrap();

    d.advance(Duration::ZERO);
    let commit = &d.last_scene().visible;
    assert_eq!(visible_keys(commit), keys(&[1, 2, 3]));
    assert_eq!(scale_of(commit, 2), 1.0);

    d.advance_to(HostTime(16));
    let animate = &d.last_scene().visible;
    assert_eq!(scale_of(animate, 2), 0.0);
    assert_eq!(translate_of(animate, 2), Vec2::ZERO);
    assert_eq!(translate_of(animate, 3), Vec2::new(-CELL, 0.0));

    d.run_until_idle(8);
    assert_eq!(visible_keys(&d.last_scene().visible), keys(&[1, 3]));
    assert_eq!(d.host().unmounts(), 1);
}

#[test]
fn disabled_transition_renders_directly() {
    let opts = horizontal(1000).with_disable_transition(true);
    let mut d = Driver::new(&keys(&[1, 2, 3]), opts, row()).unwrap();
    assert!(d.set_keys(&keys(&[3, 1])).unwrap());
    assert_eq!(d.stage_trail(), vec![StageKind::Stale, StageKind::Stale]);
    assert_eq!(visible_keys(&d.last_scene().visible), keys(&[3, 1]));
    assert_eq!(d.scheduler().pending_len(), 0);
    assert_eq!(d.machine().frames().len(), 1);
}

#[test]
fn zero_duration_renders_directly() {
    let mut d = Driver::new(&keys(&[1, 2]), horizontal(0), row()).unwrap();
    d.set_keys(&keys(&[2, 1])).unwrap();
    assert!(matches!(d.stage(), Stage::Stale { .. }));
    assert_eq!(d.scheduler().pending_len(), 0);
}

#[test]
fn disabling_mid_flight_collapses_to_latest() {
    let mut d = Driver::new(&keys(&[1, 2, 3]), horizontal(1000), row()).unwrap();
    d.set_keys(&keys(&[3, 2, 1])).unwrap();
    d.advance_to(HostTime(16));
    assert_eq!(d.stage(), Stage::Animate);

    assert!(d.set_options(horizontal(1000).with_disable_transition(true)).unwrap());
    assert!(matches!(d.stage(), Stage::Stale { .. }));
    assert_eq!(d.scheduler().pending_len(), 0);
    assert_eq!(d.machine().frames().len(), 1);
    assert_eq!(visible_keys(&d.last_scene().visible), keys(&[3, 2, 1]));
}

#[test]
fn debug_measure_returning_to_start_skips_animation() {
    let opts = horizontal(500).with_debug_measure(Some(Duration(250)));
    let mut d = Driver::new(&keys(&[1, 2, 3]), opts, row()).unwrap();
    d.set_keys(&keys(&[3, 2, 1])).unwrap();
    assert!(d.last_scene().measure.iter().all(|l| !l.wrapper.hidden));
    assert_eq!(
        d.scheduler().due_of(mixup_core::scheduler::Task::FinishMeasure),
        Some(HostTime(250))
    );

    d.advance_to(HostTime(100));
    d.set_keys(&keys(&[1, 2, 3])).unwrap();
    assert_eq!(d.scheduler().pending_len(), 1);
    assert_eq!(d.advance_to(HostTime(349)), 0);
    assert_eq!(d.advance_to(HostTime(350)), 1);

    assert_eq!(d.stage(), Stage::Stale { frame: FrameIndex(0) });
    assert_eq!(d.machine().frames().len(), 1);
    assert!(!d.stage_trail().contains(&StageKind::Commit));
}

#[test]
fn debug_measure_to_new_order_still_animates() {
    let opts = horizontal(500).with_debug_measure(Some(Duration(250)));
    let mut d = Driver::new(&keys(&[1, 2, 3]), opts, row()).unwrap();
    d.set_keys(&keys(&[3, 2, 1])).unwrap();
    d.advance_to(HostTime(250));
    assert_eq!(
        d.stage(),
        Stage::Commit {
            while_animating: false
        }
    );
}

#[test]
fn missing_geometry_falls_back_to_origin() {
    let host = row().without_geometry_for(Key::from(3));
    let mut d = Driver::new(&keys(&[1, 2, 3]), horizontal(100), host).unwrap();
    d.set_keys(&keys(&[3, 2, 1])).unwrap();
    let frames = d.machine().frames();
    assert!(frames.iter().all(|f| f.has_been_measured()));
    assert!(frames.iter().all(|f| !f.is_complete()));

    d.advance_to(HostTime(16));
    let animate = &d.last_scene().visible;
    assert_eq!(
        style_of(animate, 3).placement,
        Placement::Absolute {
            origin: Point::ZERO
        }
    );
    assert_eq!(translate_of(animate, 3), Vec2::ZERO);
    d.run_until_idle(8);
    assert!(matches!(d.stage(), Stage::Stale { .. }));
}

#[test]
fn teardown_stops_everything() {
    let mut d = Driver::new(&keys(&[1, 2]), horizontal(100), row()).unwrap();
    d.set_keys(&keys(&[2, 1])).unwrap();
    d.teardown();
    assert_eq!(d.scheduler().pending_len(), 0);
    assert!(!d.set_keys(&keys(&[1])).unwrap());
    assert_eq!(d.advance(Duration(1000)), 0);
    assert!(d.machine().is_torn_down());
}

#[derive(Default)]
struct Recording {
    stages: Vec<(StageKind, StageKind)>,
    measured: Vec<bool>,
}

impl TraceSink for Recording {
    fn on_stage_change(&mut self, e: &StageChangeEvent) {
        self.stages.push((e.from, e.to));
    }

    fn on_measure(&mut self, e: &MeasureEvent) {
        self.measured.push(e.complete);
    }
}

#[test]
fn trace_follows_the_cycle() {
    let mut sink = Recording::default();
    {
        let mut d = Driver::new(&keys(&[1, 2]), horizontal(100), row())
            .unwrap()
            .with_sink(&mut sink);
        d.set_keys(&keys(&[2, 1])).unwrap();
        d.run_until_idle(8);
    }
    assert_eq!(
        sink.stages,
        vec![
            (StageKind::Stale, StageKind::Measure),
            (StageKind::Measure, StageKind::Commit),
            (StageKind::Commit, StageKind::Animate),
            (StageKind::Animate, StageKind::Stale),
        ]
    );
    assert_eq!(sink.measured, vec![true, true]);
}
