//! The page surface the engine drives.
//!
//! Element kinds share no common interface in the DOM, so the engine
//! sees them through a capability split: content-replaceable elements
//! expose a [`Slot`] whose value can be swapped, overlay-only elements
//! can only be covered. Adding a kind means adding an [`ElementKind`]
//! and its capability, not touching the toggle loop.

use std::borrow::Cow;
use std::fmt;

use crate::geometry::SizeHints;
use crate::types::{Placeholder, Size, css_url};

/// The element families the engine scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `img` elements, with their `picture > source` siblings.
    Image,
    /// Styled block and inline elements carrying a `background-image`.
    Background,
    /// `iframe` elements.
    Frame,
}

impl ElementKind {
    /// Every kind, in scan order.
    pub const ALL: [Self; 3] = [Self::Image, Self::Background, Self::Frame];

    /// How the engine may substitute this kind.
    #[must_use]
    pub const fn capability(self) -> Capability {
        match self {
            Self::Image => Capability::Replaceable(Slot::Source),
            Self::Background => Capability::Replaceable(Slot::Background),
            Self::Frame => Capability::OverlayOnly,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Background => f.write_str("background"),
            Self::Frame => f.write_str("frame"),
        }
    }
}

/// Substitution capability of an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The displayed content lives in `Slot` and can be swapped.
    Replaceable(Slot),
    /// The content cannot be modified and must be covered by an
    /// overlay.
    OverlayOnly,
}

/// A swappable value on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Primary source (`src`).
    Source,
    /// Lazy-load source attribute (`data-src`).
    LazySource,
    /// Responsive source list (`srcset`).
    Srcset,
    /// `background-image`: reads the computed value, writes the inline
    /// style.
    Background,
}

impl Slot {
    /// The form a placeholder takes when written to this slot.
    #[must_use]
    pub fn placeholder_value(self, placeholder: &Placeholder) -> Cow<'_, str> {
        match self {
            Self::Background => Cow::Owned(css_url(placeholder.as_str())),
            Self::Source | Self::LazySource | Self::Srcset => Cow::Borrowed(placeholder.as_str()),
        }
    }
}

/// Errors raised by page operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    /// A browser API call failed.
    #[error("browser API error: {0}")]
    Js(String),

    /// The element has no parent to attach an overlay to.
    #[error("element is detached from the document")]
    Detached,
}

/// How to build an overlay over an overlay-only element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpec {
    /// Size of the covered element's box.
    pub size: Size,
    /// Initial background.
    pub background: Placeholder,
    /// Initial visibility.
    pub visible: bool,
    /// Stacking order.
    pub z_index: i32,
}

/// Everything the engine needs from a document.
///
/// Methods take `&self`: DOM handles are shared and mutate in place.
pub trait Page {
    /// Element handle.
    type Node: Clone;
    /// Handle to an overlay created by [`attach_overlay`](Self::attach_overlay).
    type Overlay: Clone;

    /// Elements of `kind` currently in the document.
    fn candidates(&self, kind: ElementKind) -> Vec<Self::Node>;

    /// Returns `true` if `node` is an overlay this page created through
    /// [`attach_overlay`](Self::attach_overlay). Such nodes are never
    /// bound, even when a scan lists them.
    fn is_overlay(&self, node: &Self::Node) -> bool;

    /// Geometry sources of `node`.
    fn size_hints(&self, node: &Self::Node) -> SizeHints;

    /// Layout box (`getBoundingClientRect`) of `node` as `(width, height)`.
    fn layout_box(&self, node: &Self::Node) -> (f64, f64);

    /// Current value of `slot`; `None` when absent or empty.
    fn read(&self, node: &Self::Node, slot: Slot) -> Option<String>;

    /// Set `slot` to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the browser rejects the write.
    fn write(&self, node: &Self::Node, slot: Slot, value: &str) -> Result<(), PageError>;

    /// `source` elements sharing a `picture` with `node`.
    fn responsive_sources(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Create a positioned, pointer-transparent overlay over `node`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the overlay cannot be created or
    /// inserted.
    fn attach_overlay(
        &self,
        node: &Self::Node,
        spec: &OverlaySpec,
    ) -> Result<Self::Overlay, PageError>;

    /// Show or hide an overlay.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the style cannot be updated.
    fn set_overlay_visible(&self, overlay: &Self::Overlay, visible: bool)
    -> Result<(), PageError>;

    /// Replace an overlay's background.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the style cannot be updated.
    fn set_overlay_background(
        &self,
        overlay: &Self::Overlay,
        background: &Placeholder,
    ) -> Result<(), PageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_overlay_only() {
        assert_eq!(ElementKind::Frame.capability(), Capability::OverlayOnly);
        assert_eq!(
            ElementKind::Image.capability(),
            Capability::Replaceable(Slot::Source)
        );
    }

    #[test]
    fn background_slot_wraps_in_css_url() {
        let p = Placeholder::from("data:a");
        assert_eq!(Slot::Background.placeholder_value(&p), "url(\"data:a\")");
        assert_eq!(Slot::Srcset.placeholder_value(&p), "data:a");
    }
}
