//! [`Page`] over the live document.

use bonno_core::geometry::parse_dimension;
use bonno_core::{ElementKind, OverlaySpec, Page, PageError, Placeholder, Size, SizeHints, Slot};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, Window};

/// Elements scanned for a `background-image`.
const BACKGROUND_SELECTOR: &str =
    "div,section,header,footer,article,aside,main,nav,figure,span,a,button";

/// Marks the overlays this page attaches over frames.
const OVERLAY_ATTRIBUTE: &str = "data-bonno-overlay";

/// The document of the current window.
#[derive(Debug, Clone)]
pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    /// Wrap the global window and its document.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Js`] outside a browser window.
    pub fn new() -> Result<Self, PageError> {
        let window = web_sys::window().ok_or_else(|| PageError::Js("no global window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| PageError::Js("window has no document".into()))?;
        Ok(Self { window, document })
    }

    /// The wrapped document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    fn query_all(root: &JsQuery<'_>, selector: &str) -> Vec<Element> {
        let list = match root.query(selector) {
            Ok(list) => list,
            Err(err) => {
                log::warn!("querySelectorAll({selector}) failed: {}", describe(&err));
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn computed(&self, node: &Element, property: &str) -> Option<String> {
        let style = self.window.get_computed_style(node).ok()??;
        style
            .get_property_value(property)
            .ok()
            .filter(|v| !v.is_empty())
    }
}

/// Something `querySelectorAll` can be called on.
enum JsQuery<'a> {
    Document(&'a Document),
    Element(&'a Element),
}

impl JsQuery<'_> {
    fn query(&self, selector: &str) -> Result<web_sys::NodeList, JsValue> {
        match self {
            Self::Document(document) => document.query_selector_all(selector),
            Self::Element(element) => element.query_selector_all(selector),
        }
    }
}

impl Page for DomPage {
    type Node = Element;
    type Overlay = HtmlElement;

    fn candidates(&self, kind: ElementKind) -> Vec<Element> {
        let selector = match kind {
            ElementKind::Image => "img",
            ElementKind::Background => BACKGROUND_SELECTOR,
            ElementKind::Frame => "iframe",
        };
        Self::query_all(&JsQuery::Document(&self.document), selector)
    }

    fn is_overlay(&self, node: &Element) -> bool {
        node.has_attribute(OVERLAY_ATTRIBUTE)
    }

    fn size_hints(&self, node: &Element) -> SizeHints {
        let rendered = node.dyn_ref::<HtmlElement>().map_or_else(Size::default, |el| {
            Size::new(to_px(el.offset_width()), to_px(el.offset_height()))
        });
        let natural = node
            .dyn_ref::<HtmlImageElement>()
            .map_or_else(Size::default, |img| {
                Size::new(img.natural_width(), img.natural_height())
            });
        let attribute = |name: &str| node.get_attribute(name).map_or(0, |v| parse_dimension(&v));
        let computed = |name: &str| self.computed(node, name).map_or(0, |v| parse_dimension(&v));
        SizeHints {
            rendered,
            natural,
            attributes: Size::new(attribute("width"), attribute("height")),
            computed: Size::new(computed("width"), computed("height")),
        }
    }

    fn layout_box(&self, node: &Element) -> (f64, f64) {
        let rect = node.get_bounding_client_rect();
        (rect.width(), rect.height())
    }

    fn read(&self, node: &Element, slot: Slot) -> Option<String> {
        let value = match slot {
            Slot::Source => node
                .dyn_ref::<HtmlImageElement>()
                .map(HtmlImageElement::src)
                .or_else(|| node.get_attribute("src")),
            Slot::LazySource => node.get_attribute("data-src"),
            Slot::Srcset => node.get_attribute("srcset"),
            Slot::Background => self.computed(node, "background-image"),
        };
        value.filter(|v| !v.is_empty())
    }

    fn write(&self, node: &Element, slot: Slot, value: &str) -> Result<(), PageError> {
        match slot {
            Slot::Source => match node.dyn_ref::<HtmlImageElement>() {
                Some(img) => {
                    img.set_src(value);
                    Ok(())
                }
                None => node.set_attribute("src", value).map_err(js_error),
            },
            Slot::LazySource => node.set_attribute("data-src", value).map_err(js_error),
            Slot::Srcset => node.set_attribute("srcset", value).map_err(js_error),
            Slot::Background => html(node)?
                .style()
                .set_property("background-image", value)
                .map_err(js_error),
        }
    }

    fn responsive_sources(&self, node: &Element) -> Vec<Element> {
        match node.closest("picture") {
            Ok(Some(picture)) => Self::query_all(&JsQuery::Element(&picture), "source"),
            Ok(None) => Vec::new(),
            Err(err) => {
                log::warn!("closest(picture) failed: {}", describe(&err));
                Vec::new()
            }
        }
    }

    fn attach_overlay(&self, node: &Element, spec: &OverlaySpec) -> Result<HtmlElement, PageError> {
        let parent = node.parent_element().ok_or(PageError::Detached)?;
        let overlay: HtmlElement = self
            .document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| PageError::Js("created div is not an HtmlElement".into()))?;
        overlay
            .set_attribute(OVERLAY_ATTRIBUTE, "")
            .map_err(js_error)?;

        let style = overlay.style();
        let width = format!("{}px", spec.size.width);
        let height = format!("{}px", spec.size.height);
        let background = spec.background.css_url();
        let z_index = spec.z_index.to_string();
        for (property, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("left", "0"),
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("background-image", background.as_str()),
            ("background-size", "cover"),
            ("z-index", z_index.as_str()),
            ("pointer-events", "none"),
            ("display", display(spec.visible)),
        ] {
            style.set_property(property, value).map_err(js_error)?;
        }

        if self.computed(&parent, "position").as_deref() == Some("static") {
            html(&parent)?
                .style()
                .set_property("position", "relative")
                .map_err(js_error)?;
        }
        parent
            .insert_before(&overlay, node.next_sibling().as_ref())
            .map_err(js_error)?;
        Ok(overlay)
    }

    fn set_overlay_visible(&self, overlay: &HtmlElement, visible: bool) -> Result<(), PageError> {
        overlay
            .style()
            .set_property("display", display(visible))
            .map_err(js_error)
    }

    fn set_overlay_background(
        &self,
        overlay: &HtmlElement,
        background: &Placeholder,
    ) -> Result<(), PageError> {
        overlay
            .style()
            .set_property("background-image", &background.css_url())
            .map_err(js_error)
    }
}

const fn display(visible: bool) -> &'static str {
    if visible { "block" } else { "none" }
}

fn html(node: &Element) -> Result<&HtmlElement, PageError> {
    node.dyn_ref::<HtmlElement>()
        .ok_or_else(|| PageError::Js(format!("<{}> has no inline style", node.tag_name())))
}

/// Negative offsets come from detached elements; treat them as unknown.
fn to_px(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn js_error(value: JsValue) -> PageError {
    PageError::Js(describe(&value))
}
