//! Floating on-page toggle button.

use bonno_core::Mode;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, HtmlElement};

const IDLE_COLOR: &str = "#a9a9a9";
const HOVER_COLOR: &str = "#4d4d4d";

const STYLE: &str = "position: fixed; top: 20px; right: 20px; z-index: 999999; \
    background: #a9a9a9; color: white; padding: 12px 16px; border-radius: 8px; \
    font-family: system-ui, -apple-system, sans-serif; font-size: 14px; \
    font-weight: 500; cursor: pointer; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); \
    transition: all 0.2s ease; user-select: none; border: none;";

/// Button label for `mode`.
#[must_use]
pub const fn label(mode: Mode) -> &'static str {
    match mode {
        Mode::Placeholder => "煩悩ON",
        Mode::Original => "煩悩OFF",
    }
}

/// The button element and the listeners it owns.
///
/// Dropping the button detaches it from the page.
pub struct ToggleButton {
    element: HtmlElement,
    _listeners: Vec<Closure<dyn FnMut(Event)>>,
}

impl ToggleButton {
    /// Create the button, append it to `document.body` and call
    /// `on_click` for every click.
    ///
    /// # Errors
    ///
    /// Returns the browser error if the element cannot be created or
    /// the document has no body.
    pub fn attach(
        document: &Document,
        mode: Mode,
        on_click: impl Fn() + 'static,
    ) -> Result<Self, JsValue> {
        let element: HtmlElement = document.create_element("div")?.dyn_into()?;
        element.style().set_css_text(STYLE);
        element.set_text_content(Some(label(mode)));

        let hover_target = element.clone();
        let on_enter = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            set_look(&hover_target, HOVER_COLOR, "translateY(-2px)");
        });
        let leave_target = element.clone();
        let on_leave = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
            set_look(&leave_target, IDLE_COLOR, "translateY(0)");
        });
        let on_click = Closure::<dyn FnMut(Event)>::new(move |_: Event| on_click());

        for (event, listener) in [
            ("mouseenter", &on_enter),
            ("mouseleave", &on_leave),
            ("click", &on_click),
        ] {
            element.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())?;
        }

        document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?
            .append_child(&element)?;

        Ok(Self {
            element,
            _listeners: vec![on_enter, on_leave, on_click],
        })
    }

    /// Update the label for `mode`.
    pub fn show_mode(&self, mode: Mode) {
        self.element.set_text_content(Some(label(mode)));
    }
}

impl Drop for ToggleButton {
    fn drop(&mut self) {
        self.element.remove();
    }
}

fn set_look(element: &HtmlElement, background: &str, transform: &str) {
    let style = element.style();
    if style.set_property("background", background).is_err()
        || style.set_property("transform", transform).is_err()
    {
        log::debug!("failed to restyle toggle button");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_follows_mode() {
        assert_eq!(label(Mode::Placeholder), "煩悩ON");
        assert_eq!(label(Mode::Original), "煩悩OFF");
    }
}
