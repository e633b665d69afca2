// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Position and style calculations over a frame window.
//!
//! Everything here is a pure function of an ordered frame slice (oldest
//! first), the last element being the frame cells are heading towards. The
//! stage machine picks the window; this module only turns it into styles.
//!
//! For each key, the *participating* frames are those whose ordering
//! contains it. The cell starts from its position in the oldest
//! participating frame and ends at its position in the newest one:
//!
//! ```text
//!   frames:   F0 [1 2 3]   F1 [3 2 1]   F2 [3 1 4]
//!   key 2:    ●            ●                         → source F0, target F1, leaving
//!   key 4:                              ●            → source F2, target F2, arriving
//! ```

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use kurbo::Point;

use crate::config::DynamicDirection;
use crate::frame::Frame;
use crate::key::Key;
use crate::style::{CellStyle, CellTransform, Placement, Positioning, Transition, WrapperStyle};
use crate::time::Duration;

/// Which animated rendering is being computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Baseline before the transition is enabled.
    Commit,
    /// Target rendering with the transition enabled.
    Animate,
}

/// Where a key appears in a frame window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Participation {
    /// Slot of the newest frame containing the key.
    pub newest: usize,
    /// Slot of the oldest frame containing the key.
    pub oldest: usize,
    /// Number of frames containing the key.
    pub count: usize,
}

/// Finds the frames of `frames` that contain `key`, scanning newest to oldest.
///
/// # Panics
///
/// Panics if no frame contains `key`. Callers only ask about keys taken from
/// the same window, so this indicates a bookkeeping defect.
#[must_use]
pub fn participation(frames: &[Frame], key: &Key) -> Participation {
    let mut found: Option<Participation> = None;
    for (slot, frame) in frames.iter().enumerate().rev() {
        if !frame.contains(key) {
            continue;
        }
        found = Some(match found {
            None => Participation {
                newest: slot,
                oldest: slot,
                count: 1,
            },
            Some(p) => Participation {
                oldest: slot,
                count: p.count + 1,
                ..p
            },
        });
    }
    match found {
        Some(p) => p,
        None => panic!("key {key:?} does not participate in any frame of the window"),
    }
}

/// Union of all keys in the window, first seen wins, oldest frame first.
///
/// Keeping this order stable across stages means no cell is ever remounted
/// mid-transition.
#[must_use]
pub fn render_order(frames: &[Frame]) -> Vec<Key> {
    let mut seen = BTreeSet::new();
    let mut order = Vec::new();
    for frame in frames {
        for key in frame.keys() {
            if seen.insert(key) {
                order.push(key.clone());
            }
        }
    }
    order
}

/// Computes the style of `key`'s cell for one animated rendering.
///
/// The cell is placed at its source position. In [`Phase::Commit`] without
/// an overlapping animation it stays there; otherwise it is translated by
/// the source-to-target delta. Missing measurements count as the origin.
///
/// # Panics
///
/// Panics if `key` does not participate in `frames`; see [`participation`].
#[must_use]
pub fn cell_style(
    frames: &[Frame],
    key: &Key,
    phase: Phase,
    while_animating: bool,
    duration: Duration,
) -> CellStyle {
    let p = participation(frames, key);
    let source = frames[p.oldest].position(key).unwrap_or(Point::ZERO);
    let target = frames[p.newest].position(key).unwrap_or(Point::ZERO);
    let in_target = p.newest == frames.len() - 1;
    let arriving = in_target && p.count == 1 && frames.len() > 1;

    let scale = match phase {
        Phase::Commit if arriving => 0.0,
        Phase::Commit => 1.0,
        Phase::Animate if in_target => 1.0,
        Phase::Animate => 0.0,
    };
    let translate = if phase == Phase::Commit && !while_animating {
        kurbo::Vec2::ZERO
    } else {
        target - source
    };
    let transition = match phase {
        Phase::Commit => Transition::Disabled,
        Phase::Animate => Transition::Transform { duration },
    };

    CellStyle {
        placement: Placement::Absolute { origin: source },
        transform: Some(CellTransform { translate, scale }),
        transition,
    }
}

/// Returns the container extent along the growth axis.
///
/// The commit rendering pins the container to the frame before the target so
/// the resize has a defined start; the animate rendering pins it to the
/// target. `None` if the axis is off or the frame has no measured size.
#[must_use]
pub fn wrapper_extent(frames: &[Frame], phase: Phase, direction: DynamicDirection) -> Option<f64> {
    let slot = match phase {
        Phase::Commit => frames.len().saturating_sub(2),
        Phase::Animate => frames.len() - 1,
    };
    let size = frames[slot].container_size()?;
    match direction {
        DynamicDirection::Horizontal => Some(size.width),
        DynamicDirection::Vertical => Some(size.height),
        DynamicDirection::Off => None,
    }
}

/// Computes the container style for one animated rendering.
#[must_use]
pub fn wrapper_style(frames: &[Frame], phase: Phase, direction: DynamicDirection) -> WrapperStyle {
    let extent = wrapper_extent(frames, phase, direction);
    WrapperStyle {
        position: Positioning::Relative,
        hidden: false,
        width: extent.filter(|_| direction == DynamicDirection::Horizontal),
        height: extent.filter(|_| direction == DynamicDirection::Vertical),
    }
}
