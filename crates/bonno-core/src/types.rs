//! Shared value types for the substitution engine.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Element geometry in whole CSS pixels.
///
/// Sizes that reach a cache key are always positive on both axes; the
/// geometry resolver removes zero dimensions before a key is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` when both axes are non-zero.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns `true` when both axes are non-zero and no larger than
    /// `threshold`.
    #[must_use]
    pub const fn is_icon(self, threshold: u32) -> bool {
        self.is_complete() && self.width <= threshold && self.height <= threshold
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Scale down, keeping the aspect ratio, so neither axis exceeds
    /// `max_side`. Sizes already within bounds are returned unchanged
    /// and no axis is rounded below one pixel.
    #[must_use]
    pub fn fit_within(self, max_side: u32) -> Self {
        let longest = self.width.max(self.height);
        if longest <= max_side {
            return self;
        }
        let scale = |axis: u32| {
            let scaled = (u64::from(axis) * u64::from(max_side) + u64::from(longest) / 2)
                / u64::from(longest);
            u32::try_from(scaled).unwrap_or(max_side).clamp(1, max_side)
        };
        Self::new(scale(self.width), scale(self.height))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rendered placeholder visual.
///
/// Opaque to the engine: the raster renderer produces PNG data URLs,
/// test renderers produce labels. Clones share one allocation, so a
/// placeholder can sit in the cache and in any number of binding
/// records at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder(Rc<str>);

impl Placeholder {
    /// The raw value as written into a `src` or `srcset`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value wrapped as a CSS `url(...)` for `background-image`.
    #[must_use]
    pub fn css_url(&self) -> String {
        css_url(&self.0)
    }
}

impl From<String> for Placeholder {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

impl From<&str> for Placeholder {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap a URL as a CSS `url("...")` value.
#[must_use]
pub fn css_url(url: &str) -> String {
    format!("url(\"{url}\")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_display_is_geometry_key_form() {
        assert_eq!(Size::new(300, 150).to_string(), "300x150");
    }

    #[test]
    fn icon_check_is_inclusive() {
        assert!(Size::new(37, 37).is_icon(37));
        assert!(Size::new(30, 37).is_icon(37));
        assert!(!Size::new(38, 38).is_icon(37));
        assert!(!Size::new(10, 38).is_icon(37));
    }

    #[test]
    fn zero_axis_is_never_an_icon() {
        assert!(!Size::new(0, 20).is_icon(37));
        assert!(!Size::new(0, 0).is_icon(37));
    }

    #[test]
    fn oversized_geometry_fits_longest_side() {
        assert_eq!(Size::new(1000, 40_000).fit_within(2048), Size::new(51, 2048));
        assert_eq!(Size::new(4000, 1).fit_within(100), Size::new(100, 1));
        assert_eq!(Size::new(300, 150).fit_within(300), Size::new(300, 150));
    }

    #[test]
    fn placeholder_clones_share_storage() {
        let a = Placeholder::from("data:image/png;base64,AAAA");
        let b = a.clone();
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.as_str(), b.as_str()));
    }

    #[test]
    fn css_url_quotes_value() {
        let p = Placeholder::from("data:x");
        assert_eq!(p.css_url(), "url(\"data:x\")");
    }
}
