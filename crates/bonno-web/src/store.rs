//! Binding store backed by a JavaScript `WeakMap`.
//!
//! Keys are the elements themselves, so a record disappears with its
//! element and the store never keeps a removed element alive. Records
//! are plain JS objects:
//!
//! ```text
//! { original?: string, placeholder: string, width: number,
//!   height: number, finalRequested: boolean, overlay?: HTMLElement }
//! ```

use bonno_core::{BindingRecord, BindingStore, Placeholder, Size};
use js_sys::{Object, Reflect, WeakMap};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement};

use crate::dom::describe;

const ORIGINAL: &str = "original";
const PLACEHOLDER: &str = "placeholder";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const FINAL_REQUESTED: &str = "finalRequested";
const OVERLAY: &str = "overlay";

/// Element records keyed weakly by element identity.
#[derive(Debug, Clone)]
pub struct JsBindingStore {
    records: WeakMap,
}

impl JsBindingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: WeakMap::new(),
        }
    }

    fn store(&self, node: &Element, record: &BindingRecord<HtmlElement>) -> bool {
        match to_js(record) {
            Ok(value) => {
                self.records.set(node, &value);
                true
            }
            Err(err) => {
                log::warn!("failed to store binding record: {}", describe(&err));
                false
            }
        }
    }
}

impl Default for JsBindingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingStore for JsBindingStore {
    type Node = Element;
    type Overlay = HtmlElement;

    fn get(&self, node: &Element) -> Option<BindingRecord<HtmlElement>> {
        let value = self.records.get(node);
        if value.is_undefined() {
            return None;
        }
        from_js(&value)
    }

    fn bind(&mut self, node: &Element, record: BindingRecord<HtmlElement>) -> bool {
        if self.records.has(node) {
            return false;
        }
        self.store(node, &record)
    }

    fn replace(&mut self, node: &Element, record: BindingRecord<HtmlElement>) -> bool {
        if !self.records.has(node) {
            return false;
        }
        self.store(node, &record)
    }
}

fn to_js(record: &BindingRecord<HtmlElement>) -> Result<Object, JsValue> {
    let object = Object::new();
    let set = |key: &str, value: &JsValue| Reflect::set(&object, &JsValue::from_str(key), value);

    if let Some(original) = &record.original {
        set(ORIGINAL, &JsValue::from_str(original))?;
    }
    set(PLACEHOLDER, &JsValue::from_str(record.placeholder.as_str()))?;
    set(WIDTH, &JsValue::from(record.size.width))?;
    set(HEIGHT, &JsValue::from(record.size.height))?;
    set(FINAL_REQUESTED, &JsValue::from_bool(record.final_requested))?;
    if let Some(overlay) = &record.overlay {
        set(OVERLAY, overlay)?;
    }
    Ok(object)
}

fn from_js(value: &JsValue) -> Option<BindingRecord<HtmlElement>> {
    let get = |key: &str| Reflect::get(value, &JsValue::from_str(key)).ok();
    let dimension = |key: &str| get(key).as_ref().and_then(JsValue::as_f64).and_then(to_u32);

    let placeholder = get(PLACEHOLDER)?.as_string()?;
    Some(BindingRecord {
        original: get(ORIGINAL).as_ref().and_then(JsValue::as_string),
        placeholder: Placeholder::from(placeholder),
        size: Size::new(dimension(WIDTH)?, dimension(HEIGHT)?),
        overlay: get(OVERLAY).and_then(|v| v.dyn_into::<HtmlElement>().ok()),
        final_requested: get(FINAL_REQUESTED)
            .as_ref()
            .and_then(JsValue::as_bool)
            .unwrap_or(false),
    })
}

/// Dimensions are stored from `u32`; anything out of range is corruption.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u32(value: f64) -> Option<u32> {
    (0.0..=f64::from(u32::MAX))
        .contains(&value)
        .then(|| value as u32)
}
