//! Extension runtime glue: messaging, stored preferences and packaged
//! resource URLs.
//!
//! Messages cross the boundary as JSON text, the same way the rest of
//! the crate moves structured data between JS and Rust.

use bonno_core::{Ack, Action};
use js_sys::{Array, Function, JSON, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::dom::describe;

/// Storage key of the feature flag.
const ENABLED_KEY: &str = "isEnabled";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> String;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn on_message_add_listener(listener: &Function) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "sync"], js_name = get)]
    fn storage_sync_get(keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "onChanged"], js_name = addListener)]
    fn storage_on_changed_add_listener(listener: &Function) -> Result<(), JsValue>;
}

/// Errors raised by the runtime glue.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// An extension API call failed.
    #[error("extension API error: {0}")]
    Js(String),

    /// A message could not be converted to or from JSON.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<JsValue> for RuntimeError {
    fn from(value: JsValue) -> Self {
        Self::Js(describe(&value))
    }
}

/// Absolute URL of a file packaged with the extension.
#[must_use]
pub fn resource_url(path: &str) -> String {
    runtime_get_url(path)
}

/// Answer every runtime message with `handler`.
///
/// Each message is parsed as an [`Action`]; the [`Ack`] is sent back
/// synchronously. Unrecognized messages are answered with a failed
/// acknowledgment.
///
/// # Errors
///
/// Returns [`RuntimeError::Js`] if the listener cannot be registered.
pub fn listen_for_actions<F>(mut handler: F) -> Result<(), RuntimeError>
where
    F: FnMut(Action) -> Ack + 'static,
{
    let listener = Closure::<dyn FnMut(JsValue, JsValue, Function)>::new(
        move |message: JsValue, _sender: JsValue, send_response: Function| {
            let ack = match parse_action(&message) {
                Ok(action) => handler(action),
                Err(err) => {
                    log::warn!("ignoring message: {err}");
                    Ack::failed()
                }
            };
            if let Err(err) = respond(&send_response, ack) {
                log::warn!("failed to answer message: {err}");
            }
        },
    );
    on_message_add_listener(listener.as_ref().unchecked_ref())?;
    listener.forget(); // lives for the page lifetime
    Ok(())
}

/// Read the stored feature flag. Absent means disabled.
///
/// # Errors
///
/// Returns [`RuntimeError::Js`] if storage cannot be read.
#[allow(clippy::future_not_send)] // WASM is single-threaded; JsFuture is !Send
pub async fn load_enabled() -> Result<bool, RuntimeError> {
    let keys = Array::of1(&JsValue::from_str(ENABLED_KEY));
    let items = JsFuture::from(storage_sync_get(&keys)?).await?;
    let value = Reflect::get(&items, &JsValue::from_str(ENABLED_KEY))?;
    Ok(value.as_bool().unwrap_or(false))
}

/// Call `handler` whenever the stored feature flag changes.
///
/// # Errors
///
/// Returns [`RuntimeError::Js`] if the listener cannot be registered.
pub fn watch_enabled<F>(mut handler: F) -> Result<(), RuntimeError>
where
    F: FnMut(bool) + 'static,
{
    let listener = Closure::<dyn FnMut(JsValue, JsValue)>::new(
        move |changes: JsValue, area: JsValue| {
            if area.as_string().as_deref() != Some("sync") {
                return;
            }
            let Ok(change) = Reflect::get(&changes, &JsValue::from_str(ENABLED_KEY)) else {
                return;
            };
            if change.is_undefined() {
                return;
            }
            let enabled = Reflect::get(&change, &JsValue::from_str("newValue"))
                .ok()
                .as_ref()
                .and_then(JsValue::as_bool)
                .unwrap_or(false);
            handler(enabled);
        },
    );
    storage_on_changed_add_listener(listener.as_ref().unchecked_ref())?;
    listener.forget();
    Ok(())
}

fn parse_action(message: &JsValue) -> Result<Action, RuntimeError> {
    let text = JSON::stringify(message)?
        .as_string()
        .ok_or_else(|| RuntimeError::Js("message is not serializable".into()))?;
    Ok(serde_json::from_str(&text)?)
}

fn respond(send_response: &Function, ack: Ack) -> Result<(), RuntimeError> {
    let body = JSON::parse(&serde_json::to_string(&ack)?)?;
    send_response.call1(&JsValue::NULL, &body)?;
    Ok(())
}
