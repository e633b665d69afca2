// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use mixup_core::config::{ConfigError, Options};
use mixup_core::key::Key;
use mixup_core::machine::StageMachine;
use mixup_core::render::{Painter, Scene};
use mixup_core::scheduler::Scheduler;
use mixup_core::stage::{Stage, StageKind};
use mixup_core::time::{Duration, HostTime};
use mixup_core::trace::{TraceSink, Tracer};

use crate::host::GridHost;
use crate::scheduler::ManualScheduler;

/// Runs a [`StageMachine`] against a [`GridHost`] on a [`ManualScheduler`].
///
/// Every key or option change renders synchronously, like a component
/// re-rendering on new props. Tasks only fire from [`advance`](Self::advance)
/// and [`advance_to`](Self::advance_to).
pub struct Driver<'a> {
    machine: StageMachine,
    scheduler: ManualScheduler,
    host: GridHost,
    keys: Vec<Key>,
    options: Options,
    history: Vec<Scene>,
    sink: Option<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Driver<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Driver")
            .field("stage", &self.machine.stage())
            .field("now", &self.scheduler.now())
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

fn tracer<'s>(sink: &'s mut Option<&mut dyn TraceSink>) -> Tracer<'s> {
    match sink {
        Some(sink) => Tracer::new(&mut **sink),
        None => Tracer::none(),
    }
}

impl<'a> Driver<'a> {
    /// Creates the machine on `keys` and paints it once at time zero.
    pub fn new(keys: &[Key], options: Options, host: GridHost) -> Result<Self, ConfigError> {
        let machine = StageMachine::new(keys, options)?;
        let mut driver = Self {
            machine,
            scheduler: ManualScheduler::default(),
            host,
            keys: keys.to_vec(),
            options,
            history: Vec::new(),
            sink: None,
        };
        driver.render();
        Ok(driver)
    }

    /// Routes trace events to `sink` from now on.
    #[must_use]
    pub fn with_sink(mut self, sink: &'a mut dyn TraceSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets new keys, rendering if the machine asks for it.
    pub fn set_keys(&mut self, keys: &[Key]) -> Result<bool, ConfigError> {
        let changed = self.machine.update(
            keys,
            self.options,
            &mut self.scheduler,
            &mut tracer(&mut self.sink),
        )?;
        self.keys = keys.to_vec();
        if changed {
            self.render();
        }
        Ok(changed)
    }

    /// Sets new options with the current keys.
    pub fn set_options(&mut self, options: Options) -> Result<bool, ConfigError> {
        let changed = self.machine.update(
            &self.keys,
            options,
            &mut self.scheduler,
            &mut tracer(&mut self.sink),
        )?;
        self.options = options;
        if changed {
            self.render();
        }
        Ok(changed)
    }

    /// Advances the clock by `delta`, firing every task that comes due.
    pub fn advance(&mut self, delta: Duration) -> usize {
        let target = self.scheduler.now() + delta;
        self.advance_to(target)
    }

    /// Advances the clock to `t`, firing due tasks in order and rendering
    /// after each one that changes the scene. Returns the number of tasks
    /// delivered.
    pub fn advance_to(&mut self, t: HostTime) -> usize {
        let mut delivered = 0;
        while let Some((id, task)) = self.scheduler.pop_due(t) {
            delivered += 1;
            let changed =
                self.machine
                    .fire(id, task, &mut self.scheduler, &mut tracer(&mut self.sink));
            if changed {
                self.render();
            }
        }
        self.scheduler.set_now(t);
        delivered
    }

    /// Advances until nothing is pending. Returns the time it stopped at.
    ///
    /// # Panics
    ///
    /// Panics if tasks keep rescheduling each other for more than
    /// `max_steps` deliveries.
    pub fn run_until_idle(&mut self, max_steps: usize) -> HostTime {
        for _ in 0..max_steps {
            match self.scheduler.next_due() {
                Some(due) => {
                    self.advance_to(due);
                }
                None => return self.scheduler.now(),
            }
        }
        panic!("still busy after {max_steps} steps in {:?}", self.machine.stage());
    }

    /// Tears the machine down.
    pub fn teardown(&mut self) {
        self.machine
            .teardown(&mut self.scheduler, &mut tracer(&mut self.sink));
    }

    fn render(&mut self) {
        let scene = self.machine.scene();
        self.host.paint(&scene, &mut self.machine);
        self.machine
            .painted(&mut self.scheduler, &mut tracer(&mut self.sink));
        self.history.push(scene);
    }

    // -- Inspection --------------------------------------------------------

    /// The machine.
    #[must_use]
    pub fn machine(&self) -> &StageMachine {
        &self.machine
    }

    /// The machine's current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.machine.stage()
    }

    /// The scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &ManualScheduler {
        &self.scheduler
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &GridHost {
        &self.host
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.scheduler.now()
    }

    /// Every scene painted so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Scene] {
        &self.history
    }

    /// The most recently painted scene.
    #[must_use]
    pub fn last_scene(&self) -> &Scene {
        match self.history.last() {
            Some(scene) => scene,
            None => unreachable!("the driver paints on construction"),
        }
    }

    /// Stage of every painted scene, oldest first.
    #[must_use]
    pub fn stage_trail(&self) -> Vec<StageKind> {
        self.history.iter().map(|s| s.stage).collect()
    }
}
