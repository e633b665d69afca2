// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage machine.
//!
//! [`StageMachine`] owns one list's [`FrameStore`] and current [`Stage`]. It
//! is driven by three inputs and produces one output:
//!
//! - [`update`](StageMachine::update): the caller's key list, on every
//!   render.
//! - [`painted`](StageMachine::painted): the host finished painting the
//!   last [`scene`](StageMachine::scene) and reported geometry.
//! - [`fire`](StageMachine::fire): a task requested from the
//!   [`Scheduler`] came due.
//! - [`scene`](StageMachine::scene): what to paint now.
//!
//! ```text
//!           keys changed                painted + FinishMeasure
//!   STALE ───────────────► MEASURE ──────────────────────────► COMMIT
//!     ▲                     ▲  │                                 │
//!     │                     │  │ axis off                        │ painted +
//!     │        keys changed │  ▼                                 │ StartAnimation
//!     └──────────────────── ANIMATE ◄────────────────────────────┘
//!            Settle
//! ```
//!
//! A key change during ANIMATE does not stop the running transition: the
//! machine re-enters MEASURE with `while_animating` set, keeps painting the
//! in-flight transition as the visible layer, and only drops the finished
//! transition's source frames when its settle timer fires.

use alloc::vec::Vec;

use crate::config::{ConfigError, DynamicDirection, Options, validate_keys};
use crate::frame::{Frame, FrameIndex, FrameStore};
use crate::key::{Key, KeyHash};
use crate::motion::{self, Phase};
use crate::render::{AttachPoint, Cell, Layer, MeasureSink, Metrics, Scene, Slot};
use crate::scheduler::{Scheduler, Task, TaskId};
use crate::stage::{Stage, StageKind};
use crate::style::{CellStyle, WrapperStyle};
use crate::time::{Duration, HostTime};
use crate::trace::{
    FramePushedEvent, FramesPrunedEvent, MeasureEvent, StageChangeEvent, TaskAction, TaskEvent,
    Tracer, TransientEvent, TransientKind,
};

/// A task the machine is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pending {
    id: TaskId,
    task: Task,
}

const TRANSIENT_KINDS: [TransientKind; 4] = [
    TransientKind::UnknownFrame,
    TransientKind::UnknownKey,
    TransientKind::MetricsMismatch,
    TransientKind::OutOfStage,
];

const fn transient_slot(kind: TransientKind) -> usize {
    match kind {
        TransientKind::UnknownFrame => 0,
        TransientKind::UnknownKey => 1,
        TransientKind::MetricsMismatch => 2,
        TransientKind::OutOfStage => 3,
    }
}

/// Drives one animated list through its stages.
#[derive(Debug)]
pub struct StageMachine {
    store: FrameStore,
    stage: Stage,
    options: Options,
    /// Pending `FinishMeasure` or `StartAnimation`.
    advance: Option<Pending>,
    /// Pending `Settle`; survives key changes.
    settle: Option<TaskId>,
    /// Target frame of the transition currently running in the host.
    animating_to: Option<FrameIndex>,
    transients: [u32; 4],
    torn_down: bool,
}

impl StageMachine {
    /// Creates a machine at rest on `keys`.
    pub fn new(keys: &[Key], options: Options) -> Result<Self, ConfigError> {
        options.validate()?;
        validate_keys(keys)?;
        let store = FrameStore::new(keys.to_vec());
        let frame = store.first().index();
        Ok(Self {
            store,
            stage: Stage::Stale { frame },
            options,
            advance: None,
            settle: None,
            animating_to: None,
            transients: [0; 4],
            torn_down: false,
        })
    }

    /// Returns the current stage.
    #[inline]
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the options of the last successful update.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the retained frames, oldest first.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        self.store.frames()
    }

    /// Returns `true` while a task of kind `task` is expected.
    #[must_use]
    pub fn is_pending(&self, task: Task) -> bool {
        match task {
            Task::Settle => self.settle.is_some(),
            _ => self.advance.is_some_and(|p| p.task == task),
        }
    }

    /// Returns `true` after [`teardown`](Self::teardown).
    #[inline]
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // -- Inputs ------------------------------------------------------------

    /// Applies the caller's current key list and options.
    ///
    /// Both are validated first; on error nothing changes. Returns `true` if
    /// the scene changed and should be painted.
    pub fn update(
        &mut self,
        keys: &[Key],
        options: Options,
        sched: &mut dyn Scheduler,
        tracer: &mut Tracer<'_>,
    ) -> Result<bool, ConfigError> {
        if self.torn_down {
            return Ok(false);
        }
        options.validate()?;
        validate_keys(keys)?;
        self.options = options;

        let mut changed = false;
        if !options.transitions_enabled() && !matches!(self.stage, Stage::Stale { .. }) {
            self.collapse(sched, tracer);
            changed = true;
        }

        if &KeyHash::of(keys) == self.store.latest().hash() {
            return Ok(changed);
        }

        let frame = self.store.create(keys.to_vec());
        let index = frame.index();
        let key_count = u32::try_from(keys.len()).unwrap_or(u32::MAX);
        let at = sched.now();

        if !options.transitions_enabled() {
            self.cancel_all(sched, tracer);
            let dropped = self.store.replace_with(frame);
            self.animating_to = None;
            tracer.frame_pushed(&FramePushedEvent {
                at,
                frame: index,
                keys: key_count,
                replaced: true,
            });
            self.trace_pruned(at, dropped, tracer);
            self.set_stage(Stage::Stale { frame: index }, at, tracer);
            return Ok(true);
        }

        let while_animating = match self.stage {
            Stage::Animate => true,
            Stage::Measure {
                while_animating, ..
            }
            | Stage::Commit { while_animating } => while_animating,
            Stage::Stale { .. } => false,
        };
        self.store.push(frame);
        tracer.frame_pushed(&FramePushedEvent {
            at,
            frame: index,
            keys: key_count,
            replaced: false,
        });
        self.cancel_advance(sched, tracer);
        self.set_stage(
            Stage::Measure {
                frame_to_measure: index,
                while_animating,
            },
            at,
            tracer,
        );
        Ok(true)
    }

    /// Tells the machine the host finished painting the last scene and has
    /// reported all geometry it could read.
    ///
    /// In the measure stage this accepts the layout read for every frame in
    /// the measurement set and (re)schedules the end of measuring. In the
    /// commit stage it schedules the start of the transition for the next
    /// rendering frame.
    pub fn painted(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        if self.torn_down {
            return;
        }
        let at = sched.now();
        self.flush_transients(at, tracer);

        match self.stage {
            Stage::Measure { .. } => {
                for index in self.measure_set() {
                    let Some(frame) = self.store.get_mut(index) else {
                        continue;
                    };
                    if frame.mark_measured() {
                        tracer.measure(&MeasureEvent {
                            at,
                            frame: index,
                            complete: frame.is_complete(),
                        });
                    }
                }
                let delay = self.options.debug_measure.unwrap_or(Duration::ZERO);
                self.schedule_after_delay(delay, Task::FinishMeasure, sched, tracer);
            }
            Stage::Commit { .. } => {
                self.schedule_after_next_paint(Task::StartAnimation, sched, tracer);
            }
            Stage::Stale { .. } | Stage::Animate => {}
        }
    }

    /// Delivers a scheduled task.
    ///
    /// Returns `true` if the scene changed and should be painted. Tasks that
    /// were cancelled or superseded are ignored.
    ///
    /// # Panics
    ///
    /// Panics if an expected task arrives in a stage that cannot have
    /// scheduled it, which indicates a bookkeeping defect.
    pub fn fire(
        &mut self,
        id: TaskId,
        task: Task,
        sched: &mut dyn Scheduler,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if self.torn_down {
            return false;
        }
        let at = sched.now();
        let expected = match task {
            Task::Settle => self.settle == Some(id),
            Task::FinishMeasure | Task::StartAnimation => self.advance == Some(Pending { id, task }),
        };
        if !expected {
            trace_task(tracer, at, id, task, None, TaskAction::Ignored);
            return false;
        }
        match task {
            Task::Settle => self.settle = None,
            Task::FinishMeasure | Task::StartAnimation => self.advance = None,
        }
        trace_task(tracer, at, id, task, None, TaskAction::Fired);

        match (task, self.stage) {
            (
                Task::FinishMeasure,
                Stage::Measure {
                    while_animating, ..
                },
            ) => self.finish_measure(while_animating, sched, tracer),
            (Task::StartAnimation, Stage::Commit { .. }) => self.enter_animate(sched, tracer),
            (Task::Settle, Stage::Animate) => {
                let dropped = self.store.truncate_to_latest();
                self.animating_to = None;
                self.trace_pruned(at, dropped, tracer);
                let frame = self.store.latest().index();
                self.set_stage(Stage::Stale { frame }, at, tracer);
            }
            (
                Task::Settle,
                Stage::Measure {
                    frame_to_measure,
                    while_animating: true,
                },
            ) => {
                self.settle_overlap(at, tracer);
                self.set_stage(
                    Stage::Measure {
                        frame_to_measure,
                        while_animating: false,
                    },
                    at,
                    tracer,
                );
            }
            (
                Task::Settle,
                Stage::Commit {
                    while_animating: true,
                },
            ) => {
                self.settle_overlap(at, tracer);
                self.set_stage(
                    Stage::Commit {
                        while_animating: false,
                    },
                    at,
                    tracer,
                );
            }
            (task, stage) => unreachable!("{task:?} was pending in stage {stage:?}"),
        }
        true
    }

    /// Cancels all pending tasks. Every later call is a no-op.
    pub fn teardown(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        if self.torn_down {
            return;
        }
        self.cancel_all(sched, tracer);
        self.torn_down = true;
    }

    // -- Output ------------------------------------------------------------

    /// Builds the scene for the current stage.
    ///
    /// # Panics
    ///
    /// Panics if the stage refers to a frame the store no longer holds,
    /// which indicates a bookkeeping defect.
    #[must_use]
    pub fn scene(&self) -> Scene {
        let frames = self.store.frames();
        match self.stage {
            Stage::Stale { frame } => Scene {
                stage: StageKind::Stale,
                measure: Vec::new(),
                visible: stale_layer(self.frame(frame)),
            },
            Stage::Measure {
                frame_to_measure,
                while_animating,
            } => {
                let inspect = self.options.debug_measure.is_some();
                let measure = self
                    .measure_set()
                    .into_iter()
                    .map(|index| measure_layer(self.frame(index), inspect))
                    .collect();
                // The running transition is re-aimed at the newest frame
                // that was already retained before this measure began.
                let visible = if while_animating {
                    let end = self.slot(frame_to_measure);
                    self.animated_layer(&frames[..end], Phase::Animate, false)
                } else {
                    stale_layer(self.store.first())
                };
                Scene {
                    stage: StageKind::Measure,
                    measure,
                    visible,
                }
            }
            Stage::Commit { while_animating } => Scene {
                stage: StageKind::Commit,
                measure: Vec::new(),
                visible: self.animated_layer(frames, Phase::Commit, while_animating),
            },
            Stage::Animate => Scene {
                stage: StageKind::Animate,
                measure: Vec::new(),
                visible: self.animated_layer(frames, Phase::Animate, false),
            },
        }
    }

    /// Frames painted off-screen in the measure stage: every frame when
    /// re-measuring everything, otherwise every unmeasured frame plus the
    /// newest `measure_window`.
    #[must_use]
    pub fn measure_set(&self) -> Vec<FrameIndex> {
        let frames = self.store.frames();
        let window_start = if self.options.remeasure_all_frames {
            0
        } else {
            frames.len().saturating_sub(self.options.measure_window)
        };
        frames
            .iter()
            .enumerate()
            .filter(|(slot, f)| *slot >= window_start || !f.has_been_measured())
            .map(|(_, f)| f.index())
            .collect()
    }

    // -- Transitions -------------------------------------------------------

    fn finish_measure(
        &mut self,
        while_animating: bool,
        sched: &mut dyn Scheduler,
        tracer: &mut Tracer<'_>,
    ) {
        let at = sched.now();
        let returned_to_first = self.options.debug_measure.is_some()
            && !while_animating
            && self.store.frames().len() > 1
            && self.store.latest().hash() == self.store.first().hash();
        if returned_to_first {
            let first = self.store.first().index();
            let dropped = self.store.retain_only(first);
            self.trace_pruned(at, dropped, tracer);
            self.set_stage(Stage::Stale { frame: first }, at, tracer);
            return;
        }
        match self.options.dynamic_direction {
            DynamicDirection::Off => self.enter_animate(sched, tracer),
            DynamicDirection::Horizontal | DynamicDirection::Vertical => {
                self.set_stage(Stage::Commit { while_animating }, at, tracer);
            }
        }
    }

    fn enter_animate(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        self.cancel_settle(sched, tracer);
        let duration = self.options.transition_duration;
        let id = sched.after_delay(duration, Task::Settle);
        let at = sched.now();
        trace_task(tracer, at, id, Task::Settle, Some(duration), TaskAction::Scheduled);
        self.settle = Some(id);
        self.animating_to = Some(self.store.latest().index());
        self.set_stage(Stage::Animate, at, tracer);
    }

    /// The previous transition finished while a newer one is being
    /// prepared: its source frames are no longer needed.
    fn settle_overlap(&mut self, at: HostTime, tracer: &mut Tracer<'_>) {
        let target = self.expect_animating_to();
        let dropped = self.store.prune_before(target);
        self.animating_to = None;
        self.trace_pruned(at, dropped, tracer);
    }

    fn collapse(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        let at = sched.now();
        self.cancel_all(sched, tracer);
        let dropped = self.store.truncate_to_latest();
        self.animating_to = None;
        self.trace_pruned(at, dropped, tracer);
        let frame = self.store.latest().index();
        self.set_stage(Stage::Stale { frame }, at, tracer);
    }

    fn set_stage(&mut self, stage: Stage, at: HostTime, tracer: &mut Tracer<'_>) {
        let from = self.stage.kind();
        self.stage = stage;
        tracer.stage_change(&StageChangeEvent {
            at,
            from,
            to: stage.kind(),
            while_animating: stage.while_animating(),
            frames: count(self.store.frames().len()),
        });
    }

    // -- Scheduling --------------------------------------------------------

    fn schedule_after_delay(
        &mut self,
        delay: Duration,
        task: Task,
        sched: &mut dyn Scheduler,
        tracer: &mut Tracer<'_>,
    ) {
        self.cancel_advance(sched, tracer);
        let id = sched.after_delay(delay, task);
        trace_task(tracer, sched.now(), id, task, Some(delay), TaskAction::Scheduled);
        self.advance = Some(Pending { id, task });
    }

    fn schedule_after_next_paint(
        &mut self,
        task: Task,
        sched: &mut dyn Scheduler,
        tracer: &mut Tracer<'_>,
    ) {
        self.cancel_advance(sched, tracer);
        let id = sched.after_next_paint(task);
        trace_task(tracer, sched.now(), id, task, None, TaskAction::Scheduled);
        self.advance = Some(Pending { id, task });
    }

    fn cancel_advance(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        if let Some(p) = self.advance.take() {
            sched.cancel(p.id);
            trace_task(tracer, sched.now(), p.id, p.task, None, TaskAction::Cancelled);
        }
    }

    fn cancel_settle(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        if let Some(id) = self.settle.take() {
            sched.cancel(id);
            trace_task(tracer, sched.now(), id, Task::Settle, None, TaskAction::Cancelled);
        }
    }

    fn cancel_all(&mut self, sched: &mut dyn Scheduler, tracer: &mut Tracer<'_>) {
        self.cancel_advance(sched, tracer);
        self.cancel_settle(sched, tracer);
    }

    // -- Helpers -----------------------------------------------------------

    fn frame(&self, index: FrameIndex) -> &Frame {
        match self.store.get(index) {
            Some(frame) => frame,
            None => panic!("stale FrameIndex: {index:?} referenced by {:?}", self.stage),
        }
    }

    fn slot(&self, index: FrameIndex) -> usize {
        match self.store.position(index) {
            Some(slot) => slot,
            None => panic!("stale FrameIndex: {index:?} referenced by {:?}", self.stage),
        }
    }

    fn expect_animating_to(&self) -> FrameIndex {
        match self.animating_to {
            Some(index) => index,
            None => panic!("{:?} is animating without a target frame", self.stage),
        }
    }

    fn animated_layer(&self, window: &[Frame], phase: Phase, while_animating: bool) -> Layer {
        let target = window[window.len() - 1].index();
        let duration = self.options.transition_duration;
        let cells = motion::render_order(window)
            .into_iter()
            .map(|key| Cell {
                style: motion::cell_style(window, &key, phase, while_animating, duration),
                attach: AttachPoint {
                    frame: target,
                    slot: Slot::Cell(key.clone()),
                    measure: false,
                },
                key,
            })
            .collect();
        Layer {
            stage: match phase {
                Phase::Commit => StageKind::Commit,
                Phase::Animate => StageKind::Animate,
            },
            frame: target,
            active: true,
            wrapper: motion::wrapper_style(window, phase, self.options.dynamic_direction),
            wrapper_attach: AttachPoint {
                frame: target,
                slot: Slot::Wrapper,
                measure: false,
            },
            cells,
        }
    }

    fn note(&mut self, kind: TransientKind) {
        let slot = &mut self.transients[transient_slot(kind)];
        *slot = slot.saturating_add(1);
    }

    fn flush_transients(&mut self, at: HostTime, tracer: &mut Tracer<'_>) {
        for kind in TRANSIENT_KINDS {
            let slot = &mut self.transients[transient_slot(kind)];
            let count = core::mem::take(slot);
            if count > 0 {
                tracer.transient(&TransientEvent { at, kind, count });
            }
        }
    }

    fn trace_pruned(&self, at: HostTime, dropped: usize, tracer: &mut Tracer<'_>) {
        if dropped == 0 {
            return;
        }
        tracer.frames_pruned(&FramesPrunedEvent {
            at,
            dropped: count(dropped),
            retained: count(self.store.frames().len()),
        });
    }
}

impl MeasureSink for StageMachine {
    fn on_measured(&mut self, attach: &AttachPoint, metrics: Metrics) {
        if self.torn_down || !attach.measure {
            return;
        }
        if !matches!(self.stage, Stage::Measure { .. }) {
            self.note(TransientKind::OutOfStage);
            return;
        }
        let Some(frame) = self.store.get_mut(attach.frame) else {
            self.note(TransientKind::UnknownFrame);
            return;
        };
        match (&attach.slot, metrics) {
            (Slot::Cell(key), Metrics::Offset(position)) => {
                if !frame.record_position(key, position) {
                    self.note(TransientKind::UnknownKey);
                }
            }
            (Slot::Wrapper, Metrics::Size(size)) => frame.record_container_size(size),
            _ => self.note(TransientKind::MetricsMismatch),
        }
    }
}

fn stale_layer(frame: &Frame) -> Layer {
    plain_layer(frame, StageKind::Stale, true, WrapperStyle::STALE)
}

fn measure_layer(frame: &Frame, inspect: bool) -> Layer {
    plain_layer(frame, StageKind::Measure, false, WrapperStyle::measure(inspect))
}

/// A layer painting `frame`'s keys in order, untransformed.
fn plain_layer(frame: &Frame, stage: StageKind, active: bool, wrapper: WrapperStyle) -> Layer {
    let index = frame.index();
    let measure = !active;
    Layer {
        stage,
        frame: index,
        active,
        wrapper,
        wrapper_attach: AttachPoint {
            frame: index,
            slot: Slot::Wrapper,
            measure,
        },
        cells: frame
            .keys()
            .iter()
            .map(|key| Cell {
                key: key.clone(),
                style: CellStyle::STALE,
                attach: AttachPoint {
                    frame: index,
                    slot: Slot::Cell(key.clone()),
                    measure,
                },
            })
            .collect(),
    }
}

fn trace_task(
    tracer: &mut Tracer<'_>,
    at: HostTime,
    id: TaskId,
    task: Task,
    delay: Option<Duration>,
    action: TaskAction,
) {
    tracer.task(&TaskEvent {
        at,
        id,
        task,
        delay,
        action,
    });
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Placement, Transition};
    use kurbo::{Point, Size};

    const CELL: f64 = 10.0;

    /// Records requests; tasks are delivered by hand.
    #[derive(Default)]
    struct FakeScheduler {
        now: u64,
        next_id: u64,
        pending: Vec<(TaskId, Task, Option<Duration>)>,
        cancelled: Vec<TaskId>,
    }

    impl FakeScheduler {
        fn take(&mut self, task: Task) -> TaskId {
            let pos = self
                .pending
                .iter()
                .position(|(_, t, _)| *t == task)
                .unwrap_or_else(|| panic!("{task:?} is not pending"));
            self.pending.remove(pos).0
        }

        fn delay_of(&self, task: Task) -> Option<Duration> {
            self.pending.iter().find(|(_, t, _)| *t == task).and_then(|p| p.2)
        }
    }

    impl Scheduler for FakeScheduler {
        fn now(&self) -> HostTime {
            HostTime(self.now)
        }

        fn after_next_paint(&mut self, task: Task) -> TaskId {
            self.next_id += 1;
            let id = TaskId(self.next_id);
            self.pending.push((id, task, None));
            id
        }

        fn after_delay(&mut self, delay: Duration, task: Task) -> TaskId {
            self.next_id += 1;
            let id = TaskId(self.next_id);
            self.pending.push((id, task, Some(delay)));
            id
        }

        fn cancel(&mut self, id: TaskId) {
            self.pending.retain(|(p, _, _)| *p != id);
            self.cancelled.push(id);
        }
    }

    fn keys(ns: &[i64]) -> Vec<Key> {
        ns.iter().copied().map(Key::from).collect()
    }

    fn options() -> Options {
        Options::new(DynamicDirection::Horizontal, Duration(1000))
    }

    /// Paints `scene` like a horizontal strip of `CELL`-wide cells.
    fn paint(machine: &mut StageMachine, sched: &mut FakeScheduler) -> Scene {
        let scene = machine.scene();
        for layer in &scene.measure {
            for (i, cell) in layer.cells.iter().enumerate() {
                let offset = Point::new(i as f64 * CELL, 0.0);
                machine.on_measured(&cell.attach, Metrics::Offset(offset));
            }
            let size = Size::new(layer.cells.len() as f64 * CELL, CELL);
            machine.on_measured(&layer.wrapper_attach, Metrics::Size(size));
        }
        machine.painted(sched, &mut Tracer::none());
        scene
    }

    fn fire(machine: &mut StageMachine, sched: &mut FakeScheduler, task: Task) -> bool {
        let id = sched.take(task);
        machine.fire(id, task, sched, &mut Tracer::none())
    }

    fn set_keys(machine: &mut StageMachine, sched: &mut FakeScheduler, ks: &[i64]) -> bool {
        let opts = *machine.options();
        machine
            .update(&keys(ks), opts, sched, &mut Tracer::none())
            .unwrap()
    }

    #[test]
    fn starts_stale() {
        let machine = StageMachine::new(&keys(&[1, 2, 3]), options()).unwrap();
        assert!(matches!(machine.stage(), Stage::Stale { .. }));
        let scene = machine.scene();
        assert!(scene.measure.is_empty());
        assert_eq!(scene.visible.keys().cloned().collect::<Vec<_>>(), keys(&[1, 2, 3]));
        assert!(scene.visible.cells.iter().all(|c| c.style == CellStyle::STALE));
        assert_eq!(scene.visible.wrapper, WrapperStyle::STALE);
    }

    #[test]
    fn construction_rejects_duplicates() {
        let err = StageMachine::new(&keys(&[1, 1]), options()).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKey(Key::from(1)));
    }

    #[test]
    fn unchanged_keys_stay_stale() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        for _ in 0..3 {
            assert!(!set_keys(&mut machine, &mut sched, &[1, 2]));
        }
        assert_eq!(machine.frames().len(), 1);
        assert!(matches!(machine.stage(), Stage::Stale { .. }));
        assert!(sched.pending.is_empty());
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        let err = machine
            .update(&keys(&[2, 2]), options(), &mut sched, &mut Tracer::none())
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateKey(Key::from(2)));
        assert_eq!(machine.frames().len(), 1);
        let bad = options().with_measure_window(0);
        assert!(machine.update(&keys(&[3]), bad, &mut sched, &mut Tracer::none()).is_err());
        assert_eq!(machine.options(), &options());
    }

    #[test]
    fn measure_scene_layers() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2, 3]), options()).unwrap();
        assert!(set_keys(&mut machine, &mut sched, &[3, 2, 1]));
        assert!(matches!(
            machine.stage(),
            Stage::Measure {
                while_animating: false,
                ..
            }
        ));
        let scene = machine.scene();
        assert_eq!(scene.measure.len(), 2);
        assert_eq!(scene.measure[0].keys().cloned().collect::<Vec<_>>(), keys(&[1, 2, 3]));
        assert_eq!(scene.measure[1].keys().cloned().collect::<Vec<_>>(), keys(&[3, 2, 1]));
        assert!(scene.measure.iter().all(|l| l.wrapper.hidden && !l.active));
        assert_eq!(scene.visible.stage, StageKind::Stale);
        assert_eq!(scene.visible.frame, machine.frames()[0].index());
    }

    #[test]
    fn painted_measure_schedules_finish() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        assert!(machine.frames().iter().all(Frame::has_been_measured));
        assert!(machine.frames().iter().all(Frame::is_complete));
        assert_eq!(sched.delay_of(Task::FinishMeasure), Some(Duration::ZERO));
        assert!(machine.is_pending(Task::FinishMeasure));
    }

    #[test]
    fn geometry_outside_measure_layers_is_ignored() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        let scene = machine.scene();
        let visible = &scene.visible.cells[0].attach;
        machine.on_measured(visible, Metrics::Offset(Point::new(99.0, 0.0)));
        let foreign = AttachPoint {
            frame: FrameIndex(77),
            slot: Slot::Wrapper,
            measure: true,
        };
        machine.on_measured(&foreign, Metrics::Size(Size::new(1.0, 1.0)));
        assert!(machine.frames().iter().all(|f| f.position(&Key::from(1)).is_none()));
    }

    #[test]
    fn full_cycle() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2, 3]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[3, 2, 1]);
        paint(&mut machine, &mut sched);

        assert!(fire(&mut machine, &mut sched, Task::FinishMeasure));
        assert_eq!(machine.stage(), Stage::Commit { while_animating: false });
        let commit = paint(&mut machine, &mut sched);
        assert_eq!(commit.visible.wrapper.width, Some(3.0 * CELL));
        let one = commit.visible.cell(&Key::from(1)).unwrap();
        assert_eq!(one.style.transform.map(|t| t.translate), Some(kurbo::Vec2::ZERO));
        assert!(machine.is_pending(Task::StartAnimation));

        assert!(fire(&mut machine, &mut sched, Task::StartAnimation));
        assert_eq!(machine.stage(), Stage::Animate);
        assert_eq!(sched.delay_of(Task::Settle), Some(Duration(1000)));
        let animate = paint(&mut machine, &mut sched);
        let one = animate.visible.cell(&Key::from(1)).unwrap();
        assert_eq!(
            one.style.transform.map(|t| t.translate),
            Some(kurbo::Vec2::new(2.0 * CELL, 0.0))
        );
        assert_eq!(
            one.style.transition,
            Transition::Transform {
                duration: Duration(1000)
            }
        );

        assert!(fire(&mut machine, &mut sched, Task::Settle));
        assert!(matches!(machine.stage(), Stage::Stale { .. }));
        assert_eq!(machine.frames().len(), 1);
        let rest = machine.scene();
        assert_eq!(rest.visible.keys().cloned().collect::<Vec<_>>(), keys(&[3, 2, 1]));
        assert!(rest.visible.cells.iter().all(|c| c.style.transform.is_none()));
    }

    #[test]
    fn axis_off_skips_commit() {
        let mut sched = FakeScheduler::default();
        let opts = Options::new(DynamicDirection::Off, Duration(300));
        let mut machine = StageMachine::new(&keys(&[1, 2]), opts).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        assert!(fire(&mut machine, &mut sched, Task::FinishMeasure));
        assert_eq!(machine.stage(), Stage::Animate);
        let scene = machine.scene();
        assert_eq!(scene.visible.wrapper.width, None);
        assert_eq!(scene.visible.wrapper.height, None);
    }

    #[test]
    fn disabled_transition_applies_immediately() {
        let mut sched = FakeScheduler::default();
        let opts = options().with_disable_transition(true);
        let mut machine = StageMachine::new(&keys(&[1, 2]), opts).unwrap();
        assert!(set_keys(&mut machine, &mut sched, &[2, 1]));
        assert!(matches!(machine.stage(), Stage::Stale { .. }));
        assert_eq!(machine.frames().len(), 1);
        assert_eq!(machine.frames()[0].keys(), &keys(&[2, 1])[..]);
        assert!(sched.pending.is_empty());
    }

    #[test]
    fn disabling_mid_animation_collapses() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::FinishMeasure);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::StartAnimation);
        assert!(machine.is_pending(Task::Settle));

        let off = options().with_disable_transition(true);
        let changed = machine
            .update(&keys(&[2, 1]), off, &mut sched, &mut Tracer::none())
            .unwrap();
        assert!(changed);
        assert!(matches!(machine.stage(), Stage::Stale { .. }));
        assert_eq!(machine.frames().len(), 1);
        assert!(!machine.is_pending(Task::Settle));
        assert!(sched.pending.is_empty());
    }

    #[test]
    fn overlap_keeps_settle_timer() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2, 3]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[3, 2, 1]);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::FinishMeasure);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::StartAnimation);
        paint(&mut machine, &mut sched);
        let settle = machine.settle;

        set_keys(&mut machine, &mut sched, &[2, 1, 3]);
        assert!(machine.stage().while_animating());
        assert_eq!(machine.settle, settle);
        let scene = paint(&mut machine, &mut sched);
        assert_eq!(scene.visible.stage, StageKind::Animate);
        assert_eq!(scene.visible.frame, machine.frames()[1].index());
        assert_eq!(scene.visible.keys().cloned().collect::<Vec<_>>(), keys(&[1, 2, 3]));
        // The first frame is already measured; only the newest two are painted.
        assert_eq!(scene.measure.len(), 2);
    }

    #[test]
    fn settle_during_overlap_prunes_sources() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2, 3]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[3, 2, 1]);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::FinishMeasure);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::StartAnimation);
        paint(&mut machine, &mut sched);
        let target = machine.frames()[1].index();

        set_keys(&mut machine, &mut sched, &[2, 1, 3]);
        paint(&mut machine, &mut sched);
        assert!(fire(&mut machine, &mut sched, Task::Settle));
        assert_eq!(machine.frames()[0].index(), target);
        assert_eq!(machine.frames().len(), 2);
        assert!(!machine.stage().while_animating());
        let scene = machine.scene();
        assert_eq!(scene.visible.stage, StageKind::Stale);
        assert_eq!(scene.visible.frame, target);
    }

    #[test]
    fn stale_task_ids_are_ignored() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        let old = sched.pending[0].0;
        set_keys(&mut machine, &mut sched, &[1, 2, 3]);
        assert!(sched.cancelled.contains(&old));
        assert!(!machine.fire(old, Task::FinishMeasure, &mut sched, &mut Tracer::none()));
        assert!(matches!(machine.stage(), Stage::Measure { .. }));
    }

    #[test]
    fn debug_measure_delays_and_short_circuits() {
        let mut sched = FakeScheduler::default();
        let opts = options().with_debug_measure(Some(Duration(250)));
        let mut machine = StageMachine::new(&keys(&[1, 2, 3]), opts).unwrap();
        let first = machine.frames()[0].index();
        set_keys(&mut machine, &mut sched, &[3, 2, 1]);
        let scene = paint(&mut machine, &mut sched);
        assert!(scene.measure.iter().all(|l| !l.wrapper.hidden));
        assert_eq!(sched.delay_of(Task::FinishMeasure), Some(Duration(250)));

        set_keys(&mut machine, &mut sched, &[1, 2, 3]);
        paint(&mut machine, &mut sched);
        assert_eq!(sched.pending.len(), 1, "the delay restarts instead of stacking");
        assert!(fire(&mut machine, &mut sched, Task::FinishMeasure));
        assert_eq!(machine.stage(), Stage::Stale { frame: first });
        assert_eq!(machine.frames().len(), 1);
    }

    #[test]
    fn measure_window_limits_remeasuring() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[1, 2]);
        paint(&mut machine, &mut sched);
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        set_keys(&mut machine, &mut sched, &[2]);
        let newest_two: Vec<_> = machine.frames()[2..].iter().map(Frame::index).collect();
        assert_eq!(machine.measure_set(), newest_two);

        let all = options().with_remeasure_all_frames(true);
        machine.update(&keys(&[2]), all, &mut sched, &mut Tracer::none()).unwrap();
        assert_eq!(machine.measure_set().len(), 4);
    }

    #[test]
    fn commit_places_cells_at_source() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        fire(&mut machine, &mut sched, Task::FinishMeasure);
        let scene = machine.scene();
        let two = scene.visible.cell(&Key::from(2)).unwrap();
        assert_eq!(
            two.style.placement,
            Placement::Absolute {
                origin: Point::new(CELL, 0.0)
            }
        );
        assert_eq!(two.style.transition, Transition::Disabled);
    }

    #[test]
    fn teardown_cancels_and_silences() {
        let mut sched = FakeScheduler::default();
        let mut machine = StageMachine::new(&keys(&[1, 2]), options()).unwrap();
        set_keys(&mut machine, &mut sched, &[2, 1]);
        paint(&mut machine, &mut sched);
        let id = sched.pending[0].0;
        machine.teardown(&mut sched, &mut Tracer::none());
        assert!(machine.is_torn_down());
        assert!(sched.pending.is_empty());
        assert!(!machine.fire(id, Task::FinishMeasure, &mut sched, &mut Tracer::none()));
        assert!(!set_keys(&mut machine, &mut sched, &[1]));
        assert!(sched.pending.is_empty());
    }
}
