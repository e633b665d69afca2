// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web example: a row of tiles that animates between orderings.
//!
//! Wires a [`StageMachine`] to a [`WebScheduler`] and a [`DomPainter`] by
//! hand, the same way [`AnimatedList`] does for JavaScript callers. Three
//! buttons shuffle the row, append a tile and drop a random tile; clicking
//! quickly starts new reorders while the previous one is still animating.
//!
//! Build with: `wasm-pack build --target web demos/web_shuffle`
//!
//! Then serve `demos/web_shuffle/` and open `index.html` in a browser.
//!
//! [`AnimatedList`]: mixup_backend_web::AnimatedList

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::RefCell;

use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use mixup_backend_web::{
    CellRenderer, ConsoleSink, DomPainter, Painter as _, RenderContext, WebScheduler,
};
use mixup_core::config::{DynamicDirection, Options};
use mixup_core::key::Key;
use mixup_core::machine::StageMachine;
use mixup_core::stage::StageKind;
use mixup_core::time::Duration;
use mixup_core::trace::Tracer;

const INITIAL_TILES: i64 = 8;
const TILE_PX: u32 = 56;
const TRANSITION: Duration = Duration(600);

/// Hue per key, so a tile keeps its colour while it moves.
fn hue(key: &Key) -> i64 {
    match key {
        Key::Number(n) => n.wrapping_mul(47).rem_euclid(360),
        Key::String(s) => i64::try_from(s.len() * 47 % 360).unwrap_or(0),
    }
}

struct Tiles;

impl CellRenderer for Tiles {
    fn render_cell(&mut self, key: &Key, element: &HtmlElement, cx: &RenderContext) {
        element.set_text_content(Some(&key.to_string()));
        let s = element.style();
        let _ = s.set_property("width", &format!("{TILE_PX}px"));
        let _ = s.set_property("height", &format!("{TILE_PX}px"));
        let _ = s.set_property("line-height", &format!("{TILE_PX}px"));
        let _ = s.set_property("text-align", "center");
        let _ = s.set_property("border-radius", "8px");
        let _ = s.set_property("background", &format!("hsl({}, 60%, 45%)", hue(key)));
        let outline = if cx.stage == StageKind::Commit {
            "2px solid #fff8"
        } else {
            "none"
        };
        let _ = s.set_property("outline", outline);
    }

    fn render_wrapper(&mut self, element: &HtmlElement, _cx: &RenderContext) {
        let s = element.style();
        let _ = s.set_property("display", "flex");
        let _ = s.set_property("flex-wrap", "nowrap");
        let _ = s.set_property("gap", "8px");
    }
}

struct Demo {
    machine: StageMachine,
    scheduler: WebScheduler,
    painter: DomPainter<Tiles>,
    console: ConsoleSink,
    keys: Vec<Key>,
    next_key: i64,
    options: Options,
}

impl Demo {
    fn render(&mut self) {
        let scene = self.machine.scene();
        self.painter.paint(&scene, &mut self.machine);
        self.machine
            .painted(&mut self.scheduler, &mut Tracer::new(&mut self.console));
    }

    fn set_keys(&mut self, keys: Vec<Key>) {
        let changed = self.machine.update(
            &keys,
            self.options,
            &mut self.scheduler,
            &mut Tracer::new(&mut self.console),
        );
        match changed {
            Ok(changed) => {
                self.keys = keys;
                if changed {
                    self.render();
                }
            }
            Err(err) => web_sys::console::error_1(&JsValue::from_str(&err.to_string())),
        }
    }

    fn shuffle(&mut self) {
        let mut keys = self.keys.clone();
        for i in (1..keys.len()).rev() {
            keys.swap(i, random_index(i + 1));
        }
        self.set_keys(keys);
    }

    fn add(&mut self) {
        let mut keys = self.keys.clone();
        keys.push(Key::from(self.next_key));
        self.next_key += 1;
        self.set_keys(keys);
    }

    fn remove(&mut self) {
        if self.keys.is_empty() {
            return;
        }
        let mut keys = self.keys.clone();
        keys.remove(random_index(keys.len()));
        self.set_keys(keys);
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Math.random() is in [0, 1), so the product is below `len`"
)]
fn random_index(len: usize) -> usize {
    let r = js_sys::Math::random() * len as f64;
    (r as usize).min(len.saturating_sub(1))
}

fn button(
    document: &Document,
    parent: &HtmlElement,
    label: &str,
    demo: &Rc<RefCell<Demo>>,
    action: fn(&mut Demo),
) -> Result<(), JsValue> {
    let el: HtmlElement = document.create_element("button")?.unchecked_into();
    el.set_text_content(Some(label));
    let _ = el.style().set_property("margin-right", "8px");
    let demo = Rc::clone(demo);
    let on_click = Closure::wrap(Box::new(move || {
        if let Ok(mut demo) = demo.try_borrow_mut() {
            action(&mut demo);
        }
    }) as Box<dyn FnMut()>);
    el.set_onclick(Some(on_click.as_ref().unchecked_ref()));
    // Buttons live as long as the page; their closures keep the demo alive.
    on_click.forget();
    parent.append_child(&el)?;
    Ok(())
}

/// Entry point, called automatically by `wasm_bindgen(start)`.
#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no body"))?;

    let controls: HtmlElement = document.create_element("div")?.unchecked_into();
    let _ = controls.style().set_property("margin", "24px");
    body.append_child(&controls)?;
    let stage: HtmlElement = document.create_element("div")?.unchecked_into();
    let _ = stage.style().set_property("margin", "24px");
    body.append_child(&stage)?;

    let keys: Vec<Key> = (1..=INITIAL_TILES).map(Key::from).collect();
    let options = Options::new(DynamicDirection::Horizontal, TRANSITION);
    let machine =
        StageMachine::new(&keys, options).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let demo = Rc::new(RefCell::new(Demo {
        machine,
        scheduler: WebScheduler::new(),
        painter: DomPainter::new(stage, Tiles)?,
        console: ConsoleSink::new(),
        keys,
        next_key: INITIAL_TILES + 1,
        options,
    }));

    let weak = Rc::downgrade(&demo);
    demo.borrow().scheduler.set_on_fire(move |id, task| {
        let Some(demo) = weak.upgrade() else {
            return;
        };
        let Ok(mut demo) = demo.try_borrow_mut() else {
            return;
        };
        let demo = &mut *demo;
        if demo.machine.fire(
            id,
            task,
            &mut demo.scheduler,
            &mut Tracer::new(&mut demo.console),
        ) {
            demo.render();
        }
    });
    demo.borrow_mut().render();

    button(&document, &controls, "Shuffle", &demo, Demo::shuffle)?;
    button(&document, &controls, "Add", &demo, Demo::add)?;
    button(&document, &controls, "Remove", &demo, Demo::remove)?;
    Ok(())
}
