//! In-memory page, overlay and renderer doubles for engine tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use bonno_core::{
    CropChoice, ElementKind, Engine, EngineConfig, OverlaySpec, Page, PageError, Placeholder,
    PlaceholderRenderer, RenderError, Size, SizeHints, Slot, WeakBindingStore,
};

pub type Node = Rc<FakeNode>;
pub type Overlay = Rc<FakeOverlay>;
pub type TestEngine = Engine<WeakBindingStore<Node, Overlay>, LabelRenderer>;

/// Attribute marking the overlays a [`FakePage`] attaches.
pub const OVERLAY_ATTRIBUTE: &str = "data-bonno-overlay";

/// One element of the fake document.
#[derive(Debug, Default)]
pub struct FakeNode {
    pub src: RefCell<Option<String>>,
    pub attrs: RefCell<HashMap<String, String>>,
    pub hints: Cell<SizeHints>,
    pub layout: Cell<(f64, f64)>,
    pub computed_background: RefCell<Option<String>>,
    pub inline_background: RefCell<Option<String>>,
    pub sources: RefCell<Vec<Node>>,
    pub reject_writes: Cell<bool>,
}

impl FakeNode {
    pub fn src(&self) -> Option<String> {
        self.src.borrow().clone()
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.attrs.borrow().get(name).cloned()
    }

    pub fn background(&self) -> Option<String> {
        self.inline_background
            .borrow()
            .clone()
            .or_else(|| self.computed_background.borrow().clone())
    }
}

/// An overlay attached over a frame.
///
/// Like a real overlay `div`, it also sits in the document as a styled
/// element carrying its placeholder as an inline background.
#[derive(Debug)]
pub struct FakeOverlay {
    pub size: Size,
    pub z_index: i32,
    pub background: RefCell<String>,
    pub visible: Cell<bool>,
    pub node: Node,
}

/// A document holding images, styled elements and frames.
#[derive(Debug, Default)]
pub struct FakePage {
    pub images: RefCell<Vec<Node>>,
    pub styled: RefCell<Vec<Node>>,
    pub frames: RefCell<Vec<Node>>,
    pub overlays: RefCell<Vec<Overlay>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an `img` with a rendered box.
    pub fn image(&self, src: &str, width: u32, height: u32) -> Node {
        let node = Rc::new(FakeNode {
            src: RefCell::new(Some(src.to_owned())),
            ..FakeNode::default()
        });
        node.hints.set(SizeHints {
            rendered: Size::new(width, height),
            ..SizeHints::default()
        });
        self.images.borrow_mut().push(Rc::clone(&node));
        node
    }

    /// Add an `img` with arbitrary geometry hints and no `src`.
    pub fn lazy_image(&self, data_src: &str, hints: SizeHints) -> Node {
        let node = Rc::new(FakeNode::default());
        node.attrs
            .borrow_mut()
            .insert("data-src".to_owned(), data_src.to_owned());
        node.hints.set(hints);
        self.images.borrow_mut().push(Rc::clone(&node));
        node
    }

    /// Add a `source` sibling to an image inside a `picture`.
    pub fn source(&self, image: &Node, srcset: &str) -> Node {
        let node = Rc::new(FakeNode::default());
        node.attrs
            .borrow_mut()
            .insert("srcset".to_owned(), srcset.to_owned());
        image.sources.borrow_mut().push(Rc::clone(&node));
        node
    }

    /// Add a styled element with a computed background image.
    pub fn styled(&self, background: &str, width: f64, height: f64) -> Node {
        let node = Rc::new(FakeNode {
            computed_background: RefCell::new(Some(background.to_owned())),
            ..FakeNode::default()
        });
        node.layout.set((width, height));
        self.styled.borrow_mut().push(Rc::clone(&node));
        node
    }

    /// Add an `iframe` with a rendered box.
    pub fn frame(&self, width: u32, height: u32) -> Node {
        let node = Rc::new(FakeNode::default());
        node.hints.set(SizeHints {
            rendered: Size::new(width, height),
            ..SizeHints::default()
        });
        self.frames.borrow_mut().push(Rc::clone(&node));
        node
    }

    /// Remove an element from every list so only the test holds it.
    pub fn remove(&self, node: &Node) {
        for list in [&self.images, &self.styled, &self.frames] {
            list.borrow_mut().retain(|n| !Rc::ptr_eq(n, node));
        }
    }
}

impl Page for FakePage {
    type Node = Node;
    type Overlay = Overlay;

    fn candidates(&self, kind: ElementKind) -> Vec<Node> {
        match kind {
            ElementKind::Image => self.images.borrow().clone(),
            ElementKind::Background => self.styled.borrow().clone(),
            ElementKind::Frame => self.frames.borrow().clone(),
        }
    }

    fn is_overlay(&self, node: &Node) -> bool {
        node.attr(OVERLAY_ATTRIBUTE).is_some()
    }

    fn size_hints(&self, node: &Node) -> SizeHints {
        node.hints.get()
    }

    fn layout_box(&self, node: &Node) -> (f64, f64) {
        node.layout.get()
    }

    fn read(&self, node: &Node, slot: Slot) -> Option<String> {
        let value = match slot {
            Slot::Source => node.src(),
            Slot::LazySource => node.attr("data-src"),
            Slot::Srcset => node.attr("srcset"),
            Slot::Background => node.background(),
        };
        value.filter(|v| !v.is_empty())
    }

    fn write(&self, node: &Node, slot: Slot, value: &str) -> Result<(), PageError> {
        if node.reject_writes.get() {
            return Err(PageError::Js("write rejected".to_owned()));
        }
        match slot {
            Slot::Source => *node.src.borrow_mut() = Some(value.to_owned()),
            Slot::LazySource => {
                node.attrs
                    .borrow_mut()
                    .insert("data-src".to_owned(), value.to_owned());
            }
            Slot::Srcset => {
                node.attrs
                    .borrow_mut()
                    .insert("srcset".to_owned(), value.to_owned());
            }
            Slot::Background => *node.inline_background.borrow_mut() = Some(value.to_owned()),
        }
        Ok(())
    }

    fn responsive_sources(&self, node: &Node) -> Vec<Node> {
        node.sources.borrow().clone()
    }

    fn attach_overlay(&self, _node: &Node, spec: &OverlaySpec) -> Result<Overlay, PageError> {
        let node = Rc::new(FakeNode {
            inline_background: RefCell::new(Some(spec.background.css_url())),
            ..FakeNode::default()
        });
        node.attrs
            .borrow_mut()
            .insert(OVERLAY_ATTRIBUTE.to_owned(), String::new());
        node.layout
            .set((f64::from(spec.size.width), f64::from(spec.size.height)));
        self.styled.borrow_mut().push(Rc::clone(&node));

        let overlay = Rc::new(FakeOverlay {
            size: spec.size,
            z_index: spec.z_index,
            background: RefCell::new(spec.background.to_string()),
            visible: Cell::new(spec.visible),
            node,
        });
        self.overlays.borrow_mut().push(Rc::clone(&overlay));
        Ok(overlay)
    }

    fn set_overlay_visible(&self, overlay: &Overlay, visible: bool) -> Result<(), PageError> {
        overlay.visible.set(visible);
        Ok(())
    }

    fn set_overlay_background(
        &self,
        overlay: &Overlay,
        background: &Placeholder,
    ) -> Result<(), PageError> {
        *overlay.background.borrow_mut() = background.to_string();
        *overlay.node.inline_background.borrow_mut() = Some(background.css_url());
        Ok(())
    }
}

/// Renderer producing readable labels instead of pixels.
#[derive(Debug, Default)]
pub struct LabelRenderer;

impl PlaceholderRenderer for LabelRenderer {
    fn provisional(&self, size: Size) -> Result<Placeholder, RenderError> {
        Ok(Placeholder::from(format!("fill:{size}")))
    }

    fn finalize(
        &self,
        asset: &[u8],
        size: Size,
        _crop: CropChoice,
    ) -> Result<Placeholder, RenderError> {
        if asset.is_empty() {
            return Err(RenderError::EmptyAsset);
        }
        Ok(Placeholder::from(format!(
            "final:{}:{size}",
            String::from_utf8_lossy(asset)
        )))
    }
}

pub fn engine() -> TestEngine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> TestEngine {
    Engine::with_seed(config, WeakBindingStore::new(), LabelRenderer, 7).unwrap()
}

/// A successful asset load.
pub fn loaded(bytes: &[u8]) -> Result<&[u8], String> {
    Ok(bytes)
}

/// A failed asset load.
pub fn load_failed() -> Result<&'static [u8], String> {
    Err("404 Not Found".to_owned())
}
