// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for mixup.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebScheduler`]: `setTimeout` / `requestAnimationFrame` task delivery
//! - [`DomPainter`]: keyed DOM cells with `offset*` measurement
//! - [`css`]: serialization of core styles into CSS declarations
//! - [`ConsoleSink`]: trace events on the browser console
//! - [`AnimatedList`]: the `#[wasm_bindgen]` component for JavaScript callers

#![no_std]

extern crate alloc;

pub mod css;

mod console;
mod list;
mod painter;
mod scheduler;

pub use console::ConsoleSink;
pub use list::AnimatedList;
pub use mixup_core::render::Painter;
pub use painter::{CellRenderer, DomPainter, PlainRenderer, RenderContext};
pub use scheduler::WebScheduler;

use mixup_core::time::{Duration, HostTime};

/// Returns the current host time from `performance.now()`, in whole
/// milliseconds.
#[must_use]
pub fn now() -> HostTime {
    host_time(scheduler::performance_now())
}

fn host_time(ms: f64) -> HostTime {
    HostTime::default().saturating_add(Duration::try_from_millis(ms).unwrap_or_default())
}
