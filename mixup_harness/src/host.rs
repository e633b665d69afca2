// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::BTreeSet;

use kurbo::{Point, Size};
use mixup_core::key::Key;
use mixup_core::render::{Layer, MeasureSink, Metrics, Painter};

/// Direction cells are laid out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Left to right.
    Row,
    /// Top to bottom.
    Column,
}

/// A [`Painter`] that lays every layer out as a single line of equal cells.
///
/// Measurement layers report the offset of each cell and the size of the
/// container. The visible layer is tracked like a keyed element list: a cell
/// whose key was already painted keeps its element, anything else counts as
/// a mount.
#[derive(Debug)]
pub struct GridHost {
    axis: Axis,
    cell: Size,
    silent: BTreeSet<Key>,
    mounted: BTreeSet<Key>,
    mounts: u32,
    unmounts: u32,
    measure_paints: u32,
    visible: Option<Layer>,
}

impl GridHost {
    /// Creates a host laying cells of size `cell` along `axis`.
    #[must_use]
    pub fn new(axis: Axis, cell: Size) -> Self {
        Self {
            axis,
            cell,
            silent: BTreeSet::new(),
            mounted: BTreeSet::new(),
            mounts: 0,
            unmounts: 0,
            measure_paints: 0,
            visible: None,
        }
    }

    /// Never reports geometry for `key`, as if its element failed to mount.
    #[must_use]
    pub fn without_geometry_for(mut self, key: Key) -> Self {
        self.silent.insert(key);
        self
    }

    /// Where the cell in `slot` lands.
    #[must_use]
    pub fn offset_of(&self, slot: usize) -> Point {
        let n = slot as f64;
        match self.axis {
            Axis::Row => Point::new(n * self.cell.width, 0.0),
            Axis::Column => Point::new(0.0, n * self.cell.height),
        }
    }

    /// Container size for `count` cells.
    #[must_use]
    pub fn extent_of(&self, count: usize) -> Size {
        let end = self.offset_of(count);
        match self.axis {
            Axis::Row => Size::new(end.x, self.cell.height),
            Axis::Column => Size::new(self.cell.width, end.y),
        }
    }

    /// Visible cells created so far.
    #[must_use]
    pub fn mounts(&self) -> u32 {
        self.mounts
    }

    /// Visible cells removed so far.
    #[must_use]
    pub fn unmounts(&self) -> u32 {
        self.unmounts
    }

    /// Measurement layers painted so far.
    #[must_use]
    pub fn measure_paints(&self) -> u32 {
        self.measure_paints
    }

    /// The last visible layer painted.
    #[must_use]
    pub fn visible(&self) -> Option<&Layer> {
        self.visible.as_ref()
    }
}

impl Painter for GridHost {
    fn paint_measure(&mut self, layers: &[Layer], sink: &mut dyn MeasureSink) {
        for layer in layers {
            self.measure_paints += 1;
            for (slot, cell) in layer.cells.iter().enumerate() {
                if self.silent.contains(&cell.key) {
                    continue;
                }
                sink.on_measured(&cell.attach, Metrics::Offset(self.offset_of(slot)));
            }
            let size = self.extent_of(layer.cells.len());
            sink.on_measured(&layer.wrapper_attach, Metrics::Size(size));
        }
    }

    fn paint_visible(&mut self, layer: &Layer, _sink: &mut dyn MeasureSink) {
        let next: BTreeSet<Key> = layer.keys().cloned().collect();
        let added = next.difference(&self.mounted).count();
        let gone = self.mounted.difference(&next).count();
        self.mounts += u32::try_from(added).unwrap_or(u32::MAX);
        self.unmounts += u32::try_from(gone).unwrap_or(u32::MAX);
        self.mounted = next;
        self.visible = Some(layer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_and_column_layouts() {
        let cell = Size::new(10.0, 4.0);
        let row = GridHost::new(Axis::Row, cell);
        assert_eq!(row.offset_of(2), Point::new(20.0, 0.0));
        assert_eq!(row.extent_of(3), Size::new(30.0, 4.0));

        let column = GridHost::new(Axis::Column, cell);
        assert_eq!(column.offset_of(2), Point::new(0.0, 8.0));
        assert_eq!(column.extent_of(3), Size::new(10.0, 12.0));
    }
}
