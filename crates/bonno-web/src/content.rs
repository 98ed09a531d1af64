//! Content-script state and its entry points.
//!
//! One [`ContentScript`] lives in a thread-local slot for the lifetime
//! of the page. Event handlers borrow it briefly; final placeholder
//! loads run on `spawn_local` and borrow it again only after their
//! asset has arrived.

use std::cell::RefCell;

use bonno_core::{
    Ack, Action, ConfigError, Controller, Engine, EngineConfig, FinalRequest, Handled, Mode,
    PageError, RasterRenderer,
};
use web_sys::Element;

use crate::assets;
use crate::button::ToggleButton;
use crate::dom::{DomPage, describe};
use crate::runtime;
use crate::store::JsBindingStore;

type PageController = Controller<JsBindingStore, RasterRenderer>;

thread_local! {
    static SCRIPT: RefCell<Option<ContentScript>> = const { RefCell::new(None) };
}

/// Failure to set up the content script.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The document is not reachable.
    #[error(transparent)]
    Page(#[from] PageError),

    /// The engine configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything the content script owns.
pub struct ContentScript {
    controller: PageController,
    page: DomPage,
    button: Option<ToggleButton>,
}

impl ContentScript {
    /// Build the script state for the current document.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if there is no document or `config` is
    /// invalid.
    pub fn new(config: EngineConfig) -> Result<Self, SetupError> {
        let page = DomPage::new()?;
        let renderer = RasterRenderer::from_config(&config);
        let engine = Engine::new(config, JsBindingStore::new(), renderer)?;
        Ok(Self {
            controller: Controller::new(engine),
            page,
            button: None,
        })
    }

    /// Current display mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.controller.mode()
    }

    fn handle(&mut self, action: Action) -> Handled<Element> {
        let handled = self.controller.handle(&self.page, action);
        self.sync_button();
        handled
    }

    /// Show the button while the feature is enabled, with a label
    /// matching the mode.
    fn sync_button(&mut self) {
        if !self.controller.enabled() {
            self.button = None;
            return;
        }
        let mode = self.mode();
        if let Some(button) = &self.button {
            button.show_mode(mode);
            return;
        }
        match ToggleButton::attach(self.page.document(), mode, || {
            dispatch(Action::ToggleImages);
        }) {
            Ok(button) => self.button = Some(button),
            Err(err) => log::warn!("failed to add toggle button: {}", describe(&err)),
        }
    }

    fn asset_url(&self, request: &FinalRequest<Element>) -> String {
        let config = self.controller.engine().config();
        runtime::resource_url(&config.asset_path(request.asset))
    }

    fn complete(
        &mut self,
        request: FinalRequest<Element>,
        asset: Result<&[u8], &assets::AssetError>,
    ) {
        self.controller
            .engine_mut()
            .complete_final(&self.page, request, asset);
    }
}

/// Put `script` in the thread-local slot, replacing any previous one.
pub fn install(script: ContentScript) {
    SCRIPT.with(|slot| *slot.borrow_mut() = Some(script));
}

/// Run `f` against the installed script.
///
/// Returns `None` if no script is installed or it is already borrowed
/// further up the stack.
fn with_script<T>(f: impl FnOnce(&mut ContentScript) -> T) -> Option<T> {
    SCRIPT.with(|slot| {
        let Ok(mut guard) = slot.try_borrow_mut() else {
            log::warn!("content script is busy; dropping re-entrant call");
            return None;
        };
        guard.as_mut().map(f)
    })
}

/// Handle `action` and start loading the final placeholders it
/// requested.
pub fn dispatch(action: Action) -> Ack {
    let Some((ack, loads)) = with_script(|script| {
        let handled = script.handle(action);
        let loads: Vec<_> = handled
            .pending
            .into_iter()
            .map(|request| (script.asset_url(&request), request))
            .collect();
        (handled.ack, loads)
    }) else {
        return Ack::failed();
    };
    for (url, request) in loads {
        spawn_final(url, request);
    }
    ack
}

fn spawn_final(url: String, request: FinalRequest<Element>) {
    wasm_bindgen_futures::spawn_local(async move {
        let asset = assets::fetch_bytes(&url).await;
        with_script(|script| script.complete(request, asset.as_deref()));
    });
}
