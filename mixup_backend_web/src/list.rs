// Copyright 2026 the Mixup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The JavaScript-facing component.
//!
//! ```js
//! const list = new AnimatedList(document.getElementById("grid"), {
//!   keys: [1, 2, 3],
//!   renderCell: (key, el, stage, frame, active) => { el.textContent = key; },
//!   dynamicDirection: "horizontal",
//!   transitionDuration: 500,
//! });
//! list.update({ ...props, keys: [3, 2, 1] });
//! ```
//!
//! Props are validated on every call. Invalid props throw an `Error` with the
//! [`ConfigError`] message and leave the list untouched.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use mixup_core::config::{
    self, ConfigError, DynamicDirection, Options, debug_measure_from_millis,
    transition_duration_from_millis,
};
use mixup_core::key::Key;
use mixup_core::machine::StageMachine;
use mixup_core::render::Painter as _;
use mixup_core::scheduler::{Task, TaskId};
use mixup_core::trace::Tracer;

use crate::console::ConsoleSink;
use crate::painter::{CellRenderer, DomPainter, RenderContext};
use crate::scheduler::WebScheduler;

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

/// Forwards rendering to the caller's `renderCell` / `renderWrapper`.
///
/// `renderCell(key, element, stage, frameIndex, isActiveFrame)` and
/// `renderWrapper(element, stage, frameIndex, isActiveFrame)`. Exceptions
/// they throw are logged and otherwise ignored.
struct JsRenderer {
    cell: Function,
    wrapper: Option<Function>,
}

impl JsRenderer {
    fn call(f: &Function, args: &Array) {
        if let Err(err) = f.apply(&JsValue::NULL, args) {
            web_sys::console::error_1(&err);
        }
    }
}

fn number(n: impl Into<i128>) -> JsValue {
    JsValue::from_f64(n.into() as f64)
}

fn key_to_js(key: &Key) -> JsValue {
    match key {
        Key::Number(n) => number(*n),
        Key::String(s) => JsValue::from_str(s),
    }
}

impl CellRenderer for JsRenderer {
    fn render_cell(&mut self, key: &Key, element: &HtmlElement, cx: &RenderContext) {
        let args = Array::of5(
            &key_to_js(key),
            element,
            &JsValue::from_str(cx.stage.name()),
            &number(cx.frame.0),
            &JsValue::from_bool(cx.active),
        );
        Self::call(&self.cell, &args);
    }

    fn render_wrapper(&mut self, element: &HtmlElement, cx: &RenderContext) {
        if let Some(wrapper) = &self.wrapper {
            let args = Array::of4(
                element,
                &JsValue::from_str(cx.stage.name()),
                &number(cx.frame.0),
                &JsValue::from_bool(cx.active),
            );
            Self::call(wrapper, &args);
        }
    }
}

struct Props {
    keys: Vec<Key>,
    renderer: JsRenderer,
    options: Options,
    trace: bool,
}

fn prop(props: &JsValue, name: &str) -> JsValue {
    Reflect::get(props, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
}

fn is_missing(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn flag(props: &JsValue, name: &str) -> bool {
    prop(props, name).as_bool().unwrap_or(false)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the round trip below rejects every value the cast changed"
)]
fn key_from_js(v: &JsValue) -> Result<Key, ConfigError> {
    if let Some(s) = v.as_string() {
        return Ok(Key::String(s));
    }
    let n = v.as_f64().ok_or(ConfigError::InvalidKey)?;
    let int = n as i64;
    if int as f64 == n {
        Ok(Key::Number(int))
    } else {
        Err(ConfigError::InvalidKey)
    }
}

fn parse_keys(v: &JsValue) -> Result<Vec<Key>, ConfigError> {
    if is_missing(v) {
        return Err(ConfigError::MissingKeys);
    }
    let array: &Array = v.dyn_ref().ok_or(ConfigError::MissingKeys)?;
    let keys = array
        .iter()
        .map(|k| key_from_js(&k))
        .collect::<Result<Vec<_>, _>>()?;
    config::validate_keys(&keys)?;
    Ok(keys)
}

fn parse_props(props: &JsValue) -> Result<Props, ConfigError> {
    let keys = parse_keys(&prop(props, "keys"))?;

    let cell = prop(props, "renderCell")
        .dyn_into::<Function>()
        .map_err(|_| ConfigError::NotCallable("renderCell"))?;
    let wrapper = prop(props, "renderWrapper");
    let wrapper = if is_missing(&wrapper) {
        None
    } else {
        Some(
            wrapper
                .dyn_into::<Function>()
                .map_err(|_| ConfigError::NotCallable("renderWrapper"))?,
        )
    };

    let duration = prop(props, "transitionDuration")
        .as_f64()
        .ok_or(ConfigError::NegativeTransitionDuration)
        .and_then(transition_duration_from_millis)?;
    let direction: DynamicDirection = prop(props, "dynamicDirection")
        .as_string()
        .ok_or(ConfigError::InvalidDynamicDirection)?
        .parse()?;
    let debug = prop(props, "debugMeasure");
    let debug_measure = if is_missing(&debug) {
        None
    } else {
        let ms = debug.as_f64().ok_or(ConfigError::InvalidDebugMeasure)?;
        Some(debug_measure_from_millis(ms)?)
    };

    let options = Options::new(direction, duration)
        .with_disable_transition(flag(props, "disableTransition"))
        .with_debug_measure(debug_measure)
        .with_remeasure_all_frames(flag(props, "reMeasureAllPreviousFramesOnNewKeys"));
    options.validate()?;

    Ok(Props {
        keys,
        renderer: JsRenderer { cell, wrapper },
        options,
        trace: flag(props, "trace"),
    })
}

fn js_error(err: &ConfigError) -> JsValue {
    JsError::new(&err.to_string()).into()
}

// ---------------------------------------------------------------------------
// AnimatedList
// ---------------------------------------------------------------------------

struct ListState {
    machine: StageMachine,
    scheduler: WebScheduler,
    painter: DomPainter<JsRenderer>,
    console: Option<ConsoleSink>,
}

fn tracer(console: &mut Option<ConsoleSink>) -> Tracer<'_> {
    match console {
        Some(sink) => Tracer::new(sink),
        None => Tracer::none(),
    }
}

impl ListState {
    fn render(&mut self) {
        let scene = self.machine.scene();
        self.painter.paint(&scene, &mut self.machine);
        self.machine
            .painted(&mut self.scheduler, &mut tracer(&mut self.console));
    }

    fn fire(&mut self, id: TaskId, task: Task) {
        let changed = self.machine.fire(
            id,
            task,
            &mut self.scheduler,
            &mut tracer(&mut self.console),
        );
        if changed {
            self.render();
        }
    }
}

/// An animated, keyed list of cells inside a DOM element.
#[wasm_bindgen]
pub struct AnimatedList {
    state: Rc<RefCell<ListState>>,
}

impl core::fmt::Debug for AnimatedList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AnimatedList").finish_non_exhaustive()
    }
}

#[wasm_bindgen]
impl AnimatedList {
    /// Creates the list inside `root` and paints it at rest.
    #[wasm_bindgen(constructor)]
    pub fn new(root: HtmlElement, props: &JsValue) -> Result<Self, JsValue> {
        let props = parse_props(props).map_err(|e| js_error(&e))?;
        let machine = StageMachine::new(&props.keys, props.options).map_err(|e| js_error(&e))?;
        let painter = DomPainter::new(root, props.renderer)?;
        let state = Rc::new(RefCell::new(ListState {
            machine,
            scheduler: WebScheduler::new(),
            painter,
            console: props.trace.then(ConsoleSink::new),
        }));

        let weak = Rc::downgrade(&state);
        state.borrow().scheduler.set_on_fire(move |id, task| {
            if let Some(state) = weak.upgrade()
                && let Ok(mut state) = state.try_borrow_mut()
            {
                state.fire(id, task);
            }
        });
        state.borrow_mut().render();
        Ok(Self { state })
    }

    /// Applies new props and repaints.
    ///
    /// Throws if the props are invalid, or if called from inside a render
    /// callback.
    pub fn update(&self, props: &JsValue) -> Result<(), JsValue> {
        let props = parse_props(props).map_err(|e| js_error(&e))?;
        let mut state = self
            .state
            .try_borrow_mut()
            .map_err(|_| JsError::new("AnimatedList::update called while rendering"))?;
        let state = &mut *state;
        state
            .machine
            .update(
                &props.keys,
                props.options,
                &mut state.scheduler,
                &mut tracer(&mut state.console),
            )
            .map_err(|e| js_error(&e))?;
        *state.painter.renderer_mut() = props.renderer;
        state.console = props.trace.then(ConsoleSink::new);
        state.render();
        Ok(())
    }

    /// Returns the current stage name (`STALE`, `MEASURE`, `COMMIT` or
    /// `ANIMATE`).
    #[must_use]
    pub fn stage(&self) -> String {
        self.state.borrow().machine.stage().kind().name().to_string()
    }

    /// Returns the number of retained frames.
    #[wasm_bindgen(js_name = "frameCount")]
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.state.borrow().machine.frames().len()
    }

    /// Cancels pending work and removes the painted elements. The list is
    /// inert afterwards.
    pub fn destroy(&self) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        state
            .machine
            .teardown(&mut state.scheduler, &mut tracer(&mut state.console));
        state.painter.clear();
    }
}
