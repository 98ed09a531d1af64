//! Element geometry resolution and the inclusion predicate.
//!
//! Lazy-loaded images often report a zero rendered box and zero
//! natural size, so geometry comes from a prioritized chain of sources
//! and the first one that yields both axes wins.

use crate::config::EngineConfig;
use crate::types::Size;

/// Every geometry source the page can report for one element.
///
/// Unknown axes are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHints {
    /// Live rendered box (`offsetWidth` / `offsetHeight`).
    pub rendered: Size,
    /// Intrinsic media size (`naturalWidth` / `naturalHeight`).
    pub natural: Size,
    /// Declared `width` / `height` attributes.
    pub attributes: Size,
    /// Computed-style `width` / `height`.
    pub computed: Size,
}

impl SizeHints {
    /// The sources in resolution order.
    const fn chain(&self) -> [Size; 4] {
        [self.rendered, self.natural, self.attributes, self.computed]
    }
}

/// Resolve an element's effective size.
///
/// Returns the first source with both axes non-zero. When no source is
/// complete, the highest-priority source with any non-zero axis keeps
/// that axis and the missing one falls back to `default`; with no
/// information at all the result is `default x default`.
#[must_use]
pub fn resolve_size(hints: &SizeHints, default: u32) -> Size {
    let chain = hints.chain();
    if let Some(size) = chain.iter().copied().find(|s| s.is_complete()) {
        return size;
    }
    let partial = chain
        .iter()
        .copied()
        .find(|s| s.width > 0 || s.height > 0)
        .unwrap_or_default();
    Size::new(
        nonzero_or(partial.width, default),
        nonzero_or(partial.height, default),
    )
}

/// Geometry of an iframe: rendered box, then declared attributes.
///
/// Unlike images there is no default; an iframe with no usable size is
/// not covered.
#[must_use]
pub fn frame_size(hints: &SizeHints) -> Size {
    Size::new(
        nonzero_or(hints.rendered.width, hints.attributes.width),
        nonzero_or(hints.rendered.height, hints.attributes.height),
    )
}

/// Geometry of a background layer from its layout box, clamped to
/// `min` per axis.
#[must_use]
pub fn background_size(box_width: f64, box_height: f64, min: u32) -> Size {
    Size::new(
        round_px(box_width).max(min),
        round_px(box_height).max(min),
    )
}

/// Whether an image-like element should be substituted.
///
/// `source` is the primary source with the lazy-load attribute already
/// applied as fallback.
#[must_use]
pub fn is_eligible(source: Option<&str>, size: Size, config: &EngineConfig) -> bool {
    let Some(source) = source.filter(|s| !s.is_empty()) else {
        return false;
    };
    if is_excluded_format(source, config) {
        return false;
    }
    !size.is_icon(config.icon_threshold)
}

/// Whether a computed `background-image` value is worth substituting.
#[must_use]
pub fn is_background_candidate(value: &str, config: &EngineConfig) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value != "none"
        && !value.contains("gradient")
        && !is_excluded_format(value, config)
}

/// Whether `source` names an excluded format.
///
/// Inline `data:` URIs are never excluded by extension, since the
/// extension check is a substring test that a payload could trip.
#[must_use]
pub fn is_excluded_format(source: &str, config: &EngineConfig) -> bool {
    if source.starts_with("data:") {
        return false;
    }
    let lower = source.to_ascii_lowercase();
    config
        .excluded_formats
        .iter()
        .any(|format| lower.contains(format.as_str()))
}

/// Parse a dimension attribute or computed length.
///
/// Leading-integer semantics: `"300"` and `"300px"` give 300,
/// `"12.7px"` gives 12, anything without leading digits gives 0.
#[must_use]
pub fn parse_dimension(value: &str) -> u32 {
    value
        .trim_start()
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, b| {
            acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
        })
}

const fn nonzero_or(value: u32, fallback: u32) -> u32 {
    if value > 0 { value } else { fallback }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_px(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
