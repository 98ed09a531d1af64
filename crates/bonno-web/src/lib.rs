//! Browser content script for bonno.
//!
//! Compiles to a WASM module loaded into every page. It wires the
//! sans-IO engine in `bonno-core` to the live document:
//!
//! - [`dom::DomPage`] implements the page surface over `web-sys`.
//! - [`store::JsBindingStore`] keeps per-element records in a JS
//!   `WeakMap`.
//! - [`assets`] fetches packaged source images for final placeholders.
//! - [`runtime`] receives popup messages and follows the stored
//!   enable flag.
//! - [`button`] is the floating on-page toggle.

pub mod assets;
pub mod button;
pub mod content;
pub mod dom;
pub mod logger;
pub mod runtime;
pub mod store;

use bonno_core::{Action, EngineConfig};
use wasm_bindgen::prelude::*;

use crate::content::ContentScript;

/// Module entry point, run when the content script is instantiated.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);

    let script = match ContentScript::new(EngineConfig::default()) {
        Ok(script) => script,
        Err(err) => {
            log::error!("content script disabled: {err}");
            return;
        }
    };
    content::install(script);

    if let Err(err) = runtime::listen_for_actions(content::dispatch) {
        log::error!("cannot receive messages: {err}");
    }
    if let Err(err) = runtime::watch_enabled(|enabled| {
        content::dispatch(Action::ToggleFeature {
            is_enabled: enabled,
        });
    }) {
        log::warn!("cannot follow setting changes: {err}");
    }

    when_document_ready(|| {
        wasm_bindgen_futures::spawn_local(async {
            let enabled = match runtime::load_enabled().await {
                Ok(enabled) => enabled,
                Err(err) => {
                    log::error!("failed to read stored setting: {err}");
                    false
                }
            };
            content::dispatch(Action::ToggleFeature {
                is_enabled: enabled,
            });
        });
    });
}

/// Run `f` once the document has been parsed.
fn when_document_ready(f: impl FnOnce() + 'static) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.ready_state() != "loading" {
        f();
        return;
    }
    let listener = Closure::once(f);
    if let Err(err) = document
        .add_event_listener_with_callback("DOMContentLoaded", listener.as_ref().unchecked_ref())
    {
        log::warn!("cannot wait for the document: {}", dom::describe(&err));
    }
    listener.forget();
}
