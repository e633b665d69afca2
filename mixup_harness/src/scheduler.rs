// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use mixup_core::scheduler::{Scheduler, Task, TaskId};
use mixup_core::time::{Duration, HostTime};

/// Spacing of simulated rendering frames (≈60 Hz).
pub const PAINT_INTERVAL: Duration = Duration(16);

#[derive(Clone, Copy, Debug)]
struct Entry {
    id: TaskId,
    task: Task,
    due: HostTime,
}

/// A [`Scheduler`] on a virtual clock. Nothing fires until the owner pops it.
#[derive(Debug)]
pub struct ManualScheduler {
    now: HostTime,
    next_id: u64,
    queue: Vec<Entry>,
    cancelled: u32,
}

impl ManualScheduler {
    /// Creates a scheduler whose clock reads `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            now: start,
            next_id: 0,
            queue: Vec::new(),
            cancelled: 0,
        }
    }

    /// First paint boundary strictly after the current time.
    #[must_use]
    pub fn next_paint(&self) -> HostTime {
        let interval = PAINT_INTERVAL.millis();
        HostTime((self.now.millis() / interval + 1) * interval)
    }

    /// Moves the clock forward.
    ///
    /// # Panics
    ///
    /// Panics if `t` is earlier than the current time.
    pub fn set_now(&mut self, t: HostTime) {
        assert!(
            t >= self.now,
            "clock moved backwards: {:?} -> {t:?}",
            self.now
        );
        self.now = t;
    }

    /// Due time of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<HostTime> {
        self.queue.iter().map(|e| e.due).min()
    }

    /// Removes the earliest task due at or before `limit`, moving the clock
    /// to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, limit: HostTime) -> Option<(TaskId, Task)> {
        let (slot, entry) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= limit)
            .min_by_key(|(_, e)| (e.due, e.id))?;
        let entry = *entry;
        self.queue.remove(slot);
        if entry.due > self.now {
            self.now = entry.due;
        }
        Some((entry.id, entry.task))
    }

    /// Returns `true` if a task of kind `task` is queued.
    #[must_use]
    pub fn is_pending(&self, task: Task) -> bool {
        self.queue.iter().any(|e| e.task == task)
    }

    /// Due time of the queued task of kind `task`, if any.
    #[must_use]
    pub fn due_of(&self, task: Task) -> Option<HostTime> {
        self.queue.iter().find(|e| e.task == task).map(|e| e.due)
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Number of successful cancellations so far.
    #[must_use]
    pub fn cancelled(&self) -> u32 {
        self.cancelled
    }

    fn enqueue(&mut self, task: Task, due: HostTime) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.queue.push(Entry { id, task, due });
        id
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(HostTime(0))
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> HostTime {
        self.now
    }

    fn after_next_paint(&mut self, task: Task) -> TaskId {
        let due = self.next_paint();
        self.enqueue(task, due)
    }

    fn after_delay(&mut self, delay: Duration, task: Task) -> TaskId {
        let due = self.now + delay;
        self.enqueue(task, due)
    }

    fn cancel(&mut self, id: TaskId) {
        let before = self.queue.len();
        self.queue.retain(|e| e.id != id);
        if self.queue.len() < before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_tasks_wait_for_the_next_boundary() {
        let mut sched = ManualScheduler::new(HostTime(16));
        sched.after_next_paint(Task::StartAnimation);
        assert_eq!(sched.due_of(Task::StartAnimation), Some(HostTime(32)));
        assert!(sched.pop_due(HostTime(31)).is_none());
        assert_eq!(
            sched.pop_due(HostTime(32)).map(|(_, t)| t),
            Some(Task::StartAnimation)
        );
        assert_eq!(sched.now(), HostTime(32));
    }

    #[test]
    fn zero_delay_is_due_now_but_not_delivered() {
        let mut sched = ManualScheduler::new(HostTime(5));
        sched.after_delay(Duration::ZERO, Task::FinishMeasure);
        assert_eq!(sched.pending_len(), 1);
        assert_eq!(sched.next_due(), Some(HostTime(5)));
    }

    #[test]
    fn pops_in_due_then_id_order() {
        let mut sched = ManualScheduler::default();
        let late = sched.after_delay(Duration(50), Task::Settle);
        let a = sched.after_delay(Duration(10), Task::FinishMeasure);
        let b = sched.after_delay(Duration(10), Task::StartAnimation);
        assert_eq!(sched.pop_due(HostTime(100)).map(|p| p.0), Some(a));
        assert_eq!(sched.pop_due(HostTime(100)).map(|p| p.0), Some(b));
        assert_eq!(sched.pop_due(HostTime(100)).map(|p| p.0), Some(late));
        assert_eq!(sched.now(), HostTime(50));
    }

    #[test]
    fn cancel_removes_once() {
        let mut sched = ManualScheduler::default();
        let id = sched.after_delay(Duration(10), Task::Settle);
        sched.cancel(id);
        sched.cancel(id);
        assert_eq!(sched.cancelled(), 1);
        assert!(!sched.is_pending(Task::Settle));
    }

    #[test]
    #[should_panic(expected = "clock moved backwards")]
    fn clock_is_monotonic() {
        let mut sched = ManualScheduler::new(HostTime(10));
        sched.set_now(HostTime(9));
    }
}
