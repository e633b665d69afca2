// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM painting.
//!
//! [`DomPainter`] owns two children of a caller-supplied root element:
//!
//! ```text
//!   root (position: relative)
//!   ├── measure host   ← hidden measurement wrappers, rebuilt every paint
//!   └── wrapper        ← the visible layer, cells kept per key
//! ```
//!
//! Cell content is delegated to a [`CellRenderer`]; the painter only owns
//! the inline properties listed in [`css`](crate::css) and a few `data-*`
//! attributes.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::ToString;
use alloc::vec::Vec;

use kurbo::{Point, Size};
use mixup_core::frame::FrameIndex;
use mixup_core::key::Key;
use mixup_core::render::{Layer, MeasureSink, Metrics, Painter};
use mixup_core::stage::StageKind;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, HtmlElement, Node};

use crate::css::{self, CELL_PROPERTIES, Declaration, WRAPPER_PROPERTIES};

/// What a rendered element belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderContext {
    /// Stage the layer is rendered as.
    pub stage: StageKind,
    /// Frame the layer represents.
    pub frame: FrameIndex,
    /// `true` for the visible layer.
    pub active: bool,
}

/// Fills painter-owned elements with content.
///
/// Called on every paint, for measurement and visible layers alike. A
/// renderer must not change the inline properties the painter manages.
pub trait CellRenderer {
    /// Renders the content of the cell for `key`.
    fn render_cell(&mut self, key: &Key, element: &HtmlElement, cx: &RenderContext);

    /// Decorates a layer's wrapper. The default leaves it a plain `div`.
    fn render_wrapper(&mut self, element: &HtmlElement, cx: &RenderContext) {
        _ = (element, cx);
    }
}

/// Renders each key as text.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainRenderer;

impl CellRenderer for PlainRenderer {
    fn render_cell(&mut self, key: &Key, element: &HtmlElement, _cx: &RenderContext) {
        element.set_text_content(Some(&key.to_string()));
    }
}

/// A [`Painter`] that renders layers as `<div>` elements.
pub struct DomPainter<R> {
    document: Document,
    root: HtmlElement,
    measure_host: HtmlElement,
    wrapper: HtmlElement,
    cells: BTreeMap<Key, HtmlElement>,
    renderer: R,
}

impl<R> core::fmt::Debug for DomPainter<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomPainter")
            .field("root", &"HtmlElement")
            .field("cells", &self.cells.len())
            .finish_non_exhaustive()
    }
}

impl<R: CellRenderer> DomPainter<R> {
    /// Creates a painter inside `root`.
    ///
    /// `root` must belong to a document. Its existing children are kept; the
    /// painter appends its own after them.
    pub fn new(root: HtmlElement, renderer: R) -> Result<Self, JsValue> {
        let document = root
            .owner_document()
            .ok_or_else(|| JsValue::from_str("root element has no owner document"))?;
        let measure_host = create_div(&document)?;
        let wrapper = create_div(&document)?;
        let _ = root.style().set_property("position", "relative");
        root.append_child(&measure_host)?;
        root.append_child(&wrapper)?;
        Ok(Self {
            document,
            root,
            measure_host,
            wrapper,
            cells: BTreeMap::new(),
            renderer,
        })
    }

    /// Returns the root element.
    #[must_use]
    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    /// Returns the visible cell for `key`, if mounted.
    #[must_use]
    pub fn cell(&self, key: &Key) -> Option<&HtmlElement> {
        self.cells.get(key)
    }

    /// Returns the renderer.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Removes everything the painter added to the root.
    pub fn clear(&mut self) {
        self.measure_host.remove();
        self.wrapper.remove();
        self.cells.clear();
    }

    fn build_measure_layer(
        &mut self,
        layer: &Layer,
    ) -> Result<(HtmlElement, Vec<HtmlElement>), JsValue> {
        let cx = context(layer);
        let wrapper = create_div(&self.document)?;
        apply(
            &wrapper,
            &WRAPPER_PROPERTIES,
            &css::wrapper_declarations(&layer.wrapper),
        );
        tag_wrapper(&wrapper, &cx);
        self.renderer.render_wrapper(&wrapper, &cx);

        let mut cells = Vec::with_capacity(layer.cells.len());
        for cell in &layer.cells {
            let el = create_div(&self.document)?;
            apply(&el, &CELL_PROPERTIES, &css::cell_declarations(&cell.style));
            tag_cell(&el, &cell.key, &cx);
            self.renderer.render_cell(&cell.key, &el, &cx);
            wrapper.append_child(&el)?;
            cells.push(el);
        }
        self.measure_host.append_child(&wrapper)?;
        Ok((wrapper, cells))
    }

    fn mount(&mut self, key: &Key) -> Option<HtmlElement> {
        if let Some(el) = self.cells.get(key) {
            return Some(el.clone());
        }
        let el = create_div(&self.document).ok()?;
        self.cells.insert(key.clone(), el.clone());
        Some(el)
    }
}

impl<R: CellRenderer> Painter for DomPainter<R> {
    fn paint_measure(&mut self, layers: &[Layer], sink: &mut dyn MeasureSink) {
        self.measure_host.set_text_content(None);

        let mut built = Vec::with_capacity(layers.len());
        for layer in layers {
            if let Ok(elements) = self.build_measure_layer(layer) {
                built.push((layer, elements));
            }
        }

        // All layers are attached before the first read, so layout runs once.
        for (layer, (wrapper, cells)) in built {
            let size = Size::new(
                f64::from(wrapper.offset_width()),
                f64::from(wrapper.offset_height()),
            );
            sink.on_measured(&layer.wrapper_attach, Metrics::Size(size));
            for (cell, el) in layer.cells.iter().zip(&cells) {
                let offset = Point::new(f64::from(el.offset_left()), f64::from(el.offset_top()));
                sink.on_measured(&cell.attach, Metrics::Offset(offset));
            }
        }
    }

    fn paint_visible(&mut self, layer: &Layer, _sink: &mut dyn MeasureSink) {
        let cx = context(layer);
        apply(
            &self.wrapper,
            &WRAPPER_PROPERTIES,
            &css::wrapper_declarations(&layer.wrapper),
        );
        tag_wrapper(&self.wrapper, &cx);
        self.renderer.render_wrapper(&self.wrapper, &cx);

        let wanted: BTreeSet<&Key> = layer.keys().collect();
        self.cells.retain(|key, el| {
            let keep = wanted.contains(key);
            if !keep {
                el.remove();
            }
            keep
        });

        // Only out-of-place cells are moved; a moved node restarts its
        // transitions.
        let mut anchor: Option<Node> = self.wrapper.first_child();
        for cell in &layer.cells {
            let Some(el) = self.mount(&cell.key) else {
                continue;
            };
            apply(&el, &CELL_PROPERTIES, &css::cell_declarations(&cell.style));
            tag_cell(&el, &cell.key, &cx);
            self.renderer.render_cell(&cell.key, &el, &cx);

            let node: &Node = el.as_ref();
            if anchor.as_ref().is_some_and(|a| a.is_same_node(Some(node))) {
                anchor = node.next_sibling();
            } else {
                let _ = self.wrapper.insert_before(node, anchor.as_ref());
            }
        }
    }
}

fn context(layer: &Layer) -> RenderContext {
    RenderContext {
        stage: layer.stage,
        frame: layer.frame,
        active: layer.active,
    }
}

fn create_div(document: &Document) -> Result<HtmlElement, JsValue> {
    Ok(document.create_element("div")?.unchecked_into())
}

/// Sets the declared properties and removes the other managed ones.
fn apply(el: &HtmlElement, managed: &[&str], declarations: &[Declaration]) {
    let style = el.style();
    for &property in managed {
        match declarations.iter().find(|(p, _)| *p == property) {
            Some((_, value)) => {
                let _ = style.set_property(property, value);
            }
            None => {
                let _ = style.remove_property(property);
            }
        }
    }
}

fn tag_wrapper(el: &HtmlElement, cx: &RenderContext) {
    let _ = el.set_attribute("data-stage", cx.stage.name());
    let _ = el.set_attribute("data-frame-index", &cx.frame.0.to_string());
    let _ = el.set_attribute("data-active", if cx.active { "true" } else { "false" });
}

fn tag_cell(el: &HtmlElement, key: &Key, cx: &RenderContext) {
    tag_wrapper(el, cx);
    let _ = el.set_attribute("data-key", &key.to_string());
}
