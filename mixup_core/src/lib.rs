// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame store, stage machine and style calculator for animated list
//! reordering.
//!
//! `mixup_core` decides *when* a list of keyed cells is measured, when the
//! pre-transition baseline is committed and when the host's own transition
//! engine is allowed to animate. It never touches a DOM or a window: geometry
//! flows in through a [`MeasureSink`](render::MeasureSink), time flows in
//! through a [`Scheduler`](scheduler::Scheduler), and what to draw flows out
//! as a [`Scene`](render::Scene). It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   keys ──► StageMachine::update() ──► FrameStore::push()
//!                   │
//!                   ▼
//!   StageMachine::scene() ──► Painter::paint() ──► MeasureSink::on_measured()
//!                                                        │
//!                   ┌────────────────────────────────────┘
//!                   ▼
//!   StageMachine::painted() ──► Scheduler::after_delay / after_next_paint
//!                                                        │
//!                   ┌────────────────────────────────────┘
//!                   ▼
//!   StageMachine::fire(task) ──► next Stage ──► scene() again
//! ```
//!
//! **[`key`]**: keys and the type-tagged [`KeyHash`](key::KeyHash) used to
//! detect whether a requested ordering actually changed.
//!
//! **[`frame`]**: one requested ordering plus its measured geometry, and the
//! [`FrameStore`](frame::FrameStore) that keeps frames alive while they are
//! still needed by an animation.
//!
//! **[`stage`]**: the closed set of animation stages.
//!
//! **[`motion`]**: pure position and style calculations over a frame window.
//!
//! **[`style`]**: the per-cell and per-container style overrides those
//! calculations produce, as plain data.
//!
//! **[`render`]**: the [`Scene`](render::Scene) handed to hosts, and the
//! [`Painter`](render::Painter) / [`MeasureSink`](render::MeasureSink) pair
//! that forms the host boundary.
//!
//! **[`machine`]**: the [`StageMachine`](machine::StageMachine) that owns the
//! frame store and drives every stage transition.
//!
//! **[`scheduler`]**: the capability trait through which the machine asks for
//! deferred work.
//!
//! **[`time`]**: [`HostTime`](time::HostTime) and
//! [`Duration`](time::Duration) in whole milliseconds.
//!
//! **[`config`]**: [`Options`](config::Options) and
//! [`ConfigError`](config::ConfigError).
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! a zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod frame;
pub mod key;
pub mod machine;
pub mod motion;
pub mod render;
pub mod scheduler;
pub mod stage;
pub mod style;
pub mod time;
pub mod trace;
