// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CSS serialization of core styles.
//!
//! Every function here is pure, so the exact strings the browser sees can be
//! checked without a DOM. A style is serialized as a list of
//! `(property, value)` declarations. Properties listed in
//! [`CELL_PROPERTIES`] / [`WRAPPER_PROPERTIES`] but missing from a
//! declaration list are owned by the painter and must be removed from the
//! element, so a cell leaving the animation returns to its stylesheet
//! layout.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Point;
use mixup_core::style::{CellStyle, CellTransform, Placement, Positioning, Transition, WrapperStyle};

/// Inline properties a cell's style may set.
pub const CELL_PROPERTIES: [&str; 6] = [
    "position",
    "left",
    "top",
    "margin",
    "transform",
    "transition",
];

/// Inline properties a wrapper's style may set.
pub const WRAPPER_PROPERTIES: [&str; 5] = ["position", "visibility", "z-index", "width", "height"];

/// One inline declaration.
pub type Declaration = (&'static str, String);

/// Formats a length in CSS pixels.
#[must_use]
pub fn px(v: f64) -> String {
    format!("{v}px")
}

/// Serializes a cell transform; `None` is `none`.
#[must_use]
pub fn transform_value(transform: Option<CellTransform>) -> String {
    match transform {
        None => String::from("none"),
        Some(t) => format!(
            "translate3d({},{},0px) scale({})",
            px(t.translate.x),
            px(t.translate.y),
            t.scale
        ),
    }
}

/// Serializes a transition.
#[must_use]
pub fn transition_value(transition: Transition) -> String {
    match transition {
        Transition::Disabled => String::from("0s 0s all ease"),
        Transition::Transform { duration } => {
            format!("transform {}ms ease", duration.millis())
        }
    }
}

/// Declarations for a cell.
#[must_use]
pub fn cell_declarations(style: &CellStyle) -> Vec<Declaration> {
    let mut out = Vec::with_capacity(CELL_PROPERTIES.len());
    if let Placement::Absolute { origin } = style.placement {
        push_origin(&mut out, origin);
    }
    out.push(("transform", transform_value(style.transform)));
    out.push(("transition", transition_value(style.transition)));
    out
}

fn push_origin(out: &mut Vec<Declaration>, origin: Point) {
    out.push(("position", String::from("absolute")));
    out.push(("left", px(origin.x)));
    out.push(("top", px(origin.y)));
    out.push(("margin", px(0.0)));
}

/// Declarations for a wrapper. A wrapper at rest has none.
#[must_use]
pub fn wrapper_declarations(style: &WrapperStyle) -> Vec<Declaration> {
    let mut out = Vec::new();
    match style.position {
        Positioning::Static => {}
        Positioning::Relative => out.push(("position", String::from("relative"))),
        Positioning::Absolute => out.push(("position", String::from("absolute"))),
    }
    if style.hidden {
        out.push(("visibility", String::from("hidden")));
        out.push(("z-index", String::from("-1")));
    }
    if let Some(w) = style.width {
        out.push(("width", px(w)));
    }
    if let Some(h) = style.height {
        out.push(("height", px(h)));
    }
    out
}
