// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` / `requestAnimationFrame` task delivery.
//!
//! [`WebScheduler`] implements the core [`Scheduler`] on top of the browser
//! event loop:
//!
//! - [`after_delay`](Scheduler::after_delay) is a plain `setTimeout`.
//! - [`after_next_paint`](Scheduler::after_next_paint) is a zero-delay
//!   `setTimeout` followed by a `requestAnimationFrame`, so the current
//!   output is painted before the task runs and the task lands at the start
//!   of a fresh rendering frame.
//!
//! Due tasks are handed to the callback installed with
//! [`set_on_fire`](WebScheduler::set_on_fire). The JS closures only hold a
//! weak reference to the scheduler state, so a dropped scheduler never
//! delivers again.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use mixup_core::scheduler::{Scheduler, Task, TaskId};
use mixup_core::time::{Duration, HostTime};

// Direct global bindings instead of `web_sys::Window` methods; no Window
// handle has to be fetched per call.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay: f64) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

type Callback = Closure<dyn FnMut()>;
type OnFire = Box<dyn FnMut(TaskId, Task)>;

struct Entry {
    task: Task,
    timeout: Option<i32>,
    frame: Option<i32>,
    /// The timeout closure, followed by the frame closure for paint tasks.
    closures: Vec<Callback>,
}

impl Entry {
    fn clear_handles(&mut self) {
        if let Some(handle) = self.timeout.take() {
            clear_timeout(handle);
        }
        if let Some(handle) = self.frame.take() {
            cancel_animation_frame(handle);
        }
    }
}

struct Inner {
    next_id: Cell<u64>,
    pending: RefCell<BTreeMap<u64, Entry>>,
    on_fire: RefCell<Option<OnFire>>,
    alive: Cell<bool>,
}

impl Inner {
    fn allocate(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Second half of a paint task: the zero-delay timeout has run, now wait
    /// for the next animation frame.
    fn request_frame(&self, id: u64) {
        if !self.alive.get() {
            return;
        }
        let mut pending = self.pending.borrow_mut();
        let Some(entry) = pending.get_mut(&id) else {
            return;
        };
        entry.timeout = None;
        if let Some(frame) = entry.closures.last() {
            entry.frame = Some(request_animation_frame(frame.as_ref().unchecked_ref()));
        }
    }

    fn fire(&self, id: u64) {
        if !self.alive.get() {
            return;
        }
        // Bind before matching so the borrow ends before the callback runs.
        let removed = self.pending.borrow_mut().remove(&id);
        let Some(entry) = removed else {
            return;
        };
        let callback = self.on_fire.borrow_mut().take();
        if let Some(mut callback) = callback {
            callback(TaskId(id), entry.task);
            let mut slot = self.on_fire.borrow_mut();
            if slot.is_none() && self.alive.get() {
                *slot = Some(callback);
            }
        }
        // wasm-bindgen defers freeing a closure that is still running, so
        // the entry's own closures may be dropped here.
        drop(entry);
    }
}

fn wrap(inner: &Rc<Inner>, run: fn(&Inner, u64), id: u64) -> Callback {
    let weak: Weak<Inner> = Rc::downgrade(inner);
    Closure::wrap(Box::new(move || {
        if let Some(inner) = weak.upgrade() {
            run(&inner, id);
        }
    }) as Box<dyn FnMut()>)
}

/// A [`Scheduler`] backed by browser timers.
///
/// Dropping the scheduler cancels every outstanding timer and frame request.
pub struct WebScheduler {
    inner: Rc<Inner>,
}

impl WebScheduler {
    /// Creates a scheduler with no fire callback installed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                next_id: Cell::new(1),
                pending: RefCell::new(BTreeMap::new()),
                on_fire: RefCell::new(None),
                alive: Cell::new(true),
            }),
        }
    }

    /// Installs the callback that receives due tasks.
    ///
    /// The callback usually forwards to
    /// [`StageMachine::fire`](mixup_core::machine::StageMachine::fire). It
    /// must not own the scheduler, or neither will ever be freed.
    pub fn set_on_fire(&self, on_fire: impl FnMut(TaskId, Task) + 'static) {
        *self.inner.on_fire.borrow_mut() = Some(Box::new(on_fire));
    }

    /// Returns the number of tasks not yet delivered or cancelled.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    fn insert(&self, id: u64, entry: Entry) -> TaskId {
        self.inner.pending.borrow_mut().insert(id, entry);
        TaskId(id)
    }
}

impl Default for WebScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for WebScheduler {
    fn now(&self) -> HostTime {
        crate::now()
    }

    fn after_next_paint(&mut self, task: Task) -> TaskId {
        let id = self.inner.allocate();
        let timeout = wrap(&self.inner, Inner::request_frame, id);
        let frame = wrap(&self.inner, Inner::fire, id);
        let handle = set_timeout(timeout.as_ref().unchecked_ref(), 0.0);
        self.insert(
            id,
            Entry {
                task,
                timeout: Some(handle),
                frame: None,
                closures: alloc::vec![timeout, frame],
            },
        )
    }

    fn after_delay(&mut self, delay: Duration, task: Task) -> TaskId {
        let id = self.inner.allocate();
        let timeout = wrap(&self.inner, Inner::fire, id);
        let handle = set_timeout(timeout.as_ref().unchecked_ref(), delay.millis() as f64);
        self.insert(
            id,
            Entry {
                task,
                timeout: Some(handle),
                frame: None,
                closures: alloc::vec![timeout],
            },
        )
    }

    fn cancel(&mut self, id: TaskId) {
        let removed = self.inner.pending.borrow_mut().remove(&id.0);
        if let Some(mut entry) = removed {
            entry.clear_handles();
        }
    }
}

impl Drop for WebScheduler {
    fn drop(&mut self) {
        self.inner.alive.set(false);
        let pending = core::mem::take(&mut *self.inner.pending.borrow_mut());
        for (_, mut entry) in pending {
            entry.clear_handles();
        }
        self.inner.on_fire.borrow_mut().take();
    }
}

impl core::fmt::Debug for WebScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebScheduler")
            .field("pending", &self.pending_len())
            .field("alive", &self.inner.alive.get())
            .finish_non_exhaustive()
    }
}
