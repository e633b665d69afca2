// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic tooling for running a [`StageMachine`] without a browser.
//!
//! - [`ManualScheduler`] keeps a virtual millisecond clock. Delayed tasks
//!   come due at `now + delay`; paint-aligned tasks come due at the next
//!   [`PAINT_INTERVAL`] boundary.
//! - [`GridHost`] is a [`Painter`](mixup_core::render::Painter) that lays
//!   cells out on a single row or column of equal cells and reports their
//!   geometry, and tracks which visible cells it had to create.
//! - [`Driver`] wires the three together the way an application render loop
//!   does and keeps every painted [`Scene`](mixup_core::render::Scene).
//!
//! [`StageMachine`]: mixup_core::machine::StageMachine

#![no_std]

extern crate alloc;

mod driver;
mod host;
mod scheduler;

pub use driver::Driver;
pub use host::{Axis, GridHost};
pub use scheduler::{ManualScheduler, PAINT_INTERVAL};
