// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host boundary: what to paint, and how geometry comes back.
//!
//! The machine describes each render as a [`Scene`]: zero or more hidden
//! measurement [`Layer`]s plus exactly one visible layer. A host implements
//! [`Painter`] to turn layers into real elements (DOM nodes, widgets, test
//! doubles) and reports the geometry of measurement elements back through a
//! [`MeasureSink`], keyed by the [`AttachPoint`] each element was painted
//! with. The core never reads an element itself.
//!
//! # Crate boundaries
//!
//! `mixup_core` owns the scene and all decisions. Backend crates depend on it
//! and provide a [`Painter`] and a [`Scheduler`](crate::scheduler::Scheduler).
//! Application code wires them together in a render loop.
//!
//! # Render loop pseudocode
//!
//! ```rust,ignore
//! fn render(machine: &mut StageMachine) {
//!     let scene = machine.scene();
//!     painter.paint(&scene, machine);          // machine is the MeasureSink
//!     machine.painted(&mut scheduler, &mut tracer);
//! }
//!
//! fn on_keys(keys: &[Key]) {
//!     if machine.update(keys, options, &mut scheduler, &mut tracer)? {
//!         render(machine);
//!     }
//! }
//!
//! fn on_task(id: TaskId, task: Task) {
//!     if machine.fire(id, task, &mut scheduler, &mut tracer) {
//!         render(machine);
//!     }
//! }
//! ```

use alloc::vec::Vec;

use kurbo::{Point, Size};

use crate::frame::FrameIndex;
use crate::key::Key;
use crate::stage::StageKind;
use crate::style::{CellStyle, WrapperStyle};

/// Which element of a layer an [`AttachPoint`] identifies.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The container.
    Wrapper,
    /// The cell for a key.
    Cell(Key),
}

/// Identifies one painted element so its geometry can be routed back.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttachPoint {
    /// Frame the element was painted for.
    pub frame: FrameIndex,
    /// Element within the layer.
    pub slot: Slot,
    /// Whether the element belongs to a measurement layer.
    pub measure: bool,
}

/// Geometry read from a laid-out element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Metrics {
    /// A cell's offset within its container.
    Offset(Point),
    /// A container's size.
    Size(Size),
}

/// One cell to paint.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    /// Item key.
    pub key: Key,
    /// Style overrides.
    pub style: CellStyle,
    /// Where to report geometry.
    pub attach: AttachPoint,
}

/// One container of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    /// The stage this layer is rendered as. The visible layer of a measure
    /// stage is rendered either at rest or still animating.
    pub stage: StageKind,
    /// The frame this layer represents.
    pub frame: FrameIndex,
    /// `true` for the visible layer, `false` for measurement layers.
    pub active: bool,
    /// Container style.
    pub wrapper: WrapperStyle,
    /// Where to report the container's size.
    pub wrapper_attach: AttachPoint,
    /// Cells in paint order.
    pub cells: Vec<Cell>,
}

impl Layer {
    /// Returns the keys of this layer in paint order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.cells.iter().map(|c| &c.key)
    }

    /// Returns the cell for `key`, if painted.
    #[must_use]
    pub fn cell(&self, key: &Key) -> Option<&Cell> {
        self.cells.iter().find(|c| &c.key == key)
    }
}

/// Everything to paint for one render.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// The machine's stage when the scene was built.
    pub stage: StageKind,
    /// Hidden measurement layers, oldest frame first.
    pub measure: Vec<Layer>,
    /// The visible layer.
    pub visible: Layer,
}

/// Receives geometry for painted elements.
pub trait MeasureSink {
    /// Called once per element and paint, after the element has been laid
    /// out. Reports for unknown frames or keys are ignored.
    fn on_measured(&mut self, attach: &AttachPoint, metrics: Metrics);
}

/// Paints scenes into a host.
///
/// # Paint contract
///
/// Measurement layers must be laid out before [`MeasureSink::on_measured`]
/// is called for their elements, must not affect the visible layout, and
/// must not receive pointer input. Cells of the visible layer that keep
/// their key between paints must keep their element so a running transition
/// is not interrupted.
pub trait Painter {
    /// Paints hidden measurement layers, replacing any painted before.
    /// An empty slice removes them.
    fn paint_measure(&mut self, layers: &[Layer], sink: &mut dyn MeasureSink);

    /// Paints the visible layer.
    fn paint_visible(&mut self, layer: &Layer, sink: &mut dyn MeasureSink);

    /// Paints a whole scene.
    fn paint(&mut self, scene: &Scene, sink: &mut dyn MeasureSink) {
        self.paint_measure(&scene.measure, sink);
        self.paint_visible(&scene.visible, sink);
    }
}
