// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-cell and per-container style overrides, as plain data.
//!
//! Hosts translate these into whatever their style engine understands (the
//! web backend serializes them to CSS). A default value means "no override".

use kurbo::{Point, Vec2};

use crate::time::Duration;

/// How a cell is placed inside its container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Placement {
    /// Normal layout flow.
    #[default]
    Flow,
    /// Taken out of flow and pinned at `origin` (relative to the container),
    /// with margins cleared.
    Absolute {
        /// Top-left corner of the cell.
        origin: Point,
    },
}

/// A translation followed by a uniform scale about the cell's centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellTransform {
    /// Offset from the cell's placement.
    pub translate: Vec2,
    /// Uniform scale; `0.0` is fully collapsed.
    pub scale: f64,
}

impl CellTransform {
    /// No offset, full size.
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };
}

/// Whether style changes are interpolated by the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Transition {
    /// Changes apply instantly.
    #[default]
    Disabled,
    /// Transform changes are interpolated over `duration`.
    Transform {
        /// Interpolation length.
        duration: Duration,
    },
}

/// Style overrides for one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CellStyle {
    /// Cell placement.
    pub placement: Placement,
    /// Transform override; `None` renders untransformed.
    pub transform: Option<CellTransform>,
    /// Transition behaviour.
    pub transition: Transition,
}

impl CellStyle {
    /// Style of a cell at rest.
    pub const STALE: Self = Self {
        placement: Placement::Flow,
        transform: None,
        transition: Transition::Disabled,
    };
}

/// Positioning scheme of a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Positioning {
    /// No override.
    #[default]
    Static,
    /// Establishes a containing block for absolutely placed cells.
    Relative,
    /// Taken out of flow so it does not disturb the visible layout.
    Absolute,
}

/// Style overrides for a container.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WrapperStyle {
    /// Positioning scheme.
    pub position: Positioning,
    /// Invisible and stacked behind everything else.
    pub hidden: bool,
    /// Pinned width.
    pub width: Option<f64>,
    /// Pinned height.
    pub height: Option<f64>,
}

impl WrapperStyle {
    /// Container at rest.
    pub const STALE: Self = Self {
        position: Positioning::Static,
        hidden: false,
        width: None,
        height: None,
    };

    /// Off-screen measurement container. With `inspect`, it stays visible.
    #[must_use]
    pub const fn measure(inspect: bool) -> Self {
        Self {
            position: Positioning::Absolute,
            hidden: !inspect,
            width: None,
            height: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_no_override() {
        assert_eq!(CellStyle::default(), CellStyle::STALE);
        assert_eq!(WrapperStyle::default(), WrapperStyle::STALE);
    }

    #[test]
    fn measure_wrapper_hides_unless_inspecting() {
        assert!(WrapperStyle::measure(false).hidden);
        assert!(!WrapperStyle::measure(true).hidden);
        assert_eq!(WrapperStyle::measure(true).position, Positioning::Absolute);
    }
}
