//! Cover-crop planning for final placeholders.
//!
//! The random parts of a crop are sampled when the final phase is
//! requested, before the asset's dimensions are known, and carried in a
//! [`CropChoice`]. Planning the rectangle once the asset has loaded is
//! then a pure function.

use rand::Rng;

use crate::types::Size;

/// Vertical placement of a crop taken from a tall source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAnchor {
    /// Keep the top of the source.
    Top,
    /// Keep the middle of the source.
    Center,
    /// Keep the bottom of the source.
    Bottom,
}

impl VerticalAnchor {
    /// All anchors, in selection order.
    pub const ALL: [Self; 3] = [Self::Top, Self::Center, Self::Bottom];

    fn offset(self, max_offset: f64) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => max_offset / 2.0,
            Self::Bottom => max_offset,
        }
    }
}

/// Pre-sampled randomness for one crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropChoice {
    /// Fraction of the free horizontal span to skip, in `[0, 1)`. Used
    /// when the source is wider than the target.
    pub horizontal: f64,
    /// Vertical anchor. Used when the source is taller than the target.
    pub anchor: VerticalAnchor,
}

impl CropChoice {
    /// Sample a uniformly random crop choice.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let horizontal = rng.r#gen::<f64>();
        let anchor = VerticalAnchor::ALL[rng.gen_range(0..VerticalAnchor::ALL.len())];
        Self { horizontal, anchor }
    }
}

/// A source-pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, at least 1.
    pub width: u32,
    /// Height, at least 1.
    pub height: u32,
}

/// Plan the largest target-aspect rectangle inside a `source` image.
///
/// A source wider than the target is cropped horizontally at
/// `choice.horizontal` of the free span; otherwise it is cropped
/// vertically at `choice.anchor`. The rectangle always lies inside the
/// source.
#[must_use]
pub fn cover_crop(source: Size, target: Size, choice: CropChoice) -> CropRect {
    let (sw, sh) = (f64::from(source.width), f64::from(source.height));
    let target_aspect = target.aspect();

    if source.aspect() > target_aspect {
        let width = to_px(sh * target_aspect, source.width);
        let max_offset = f64::from(source.width - width);
        let x = to_px_floor(choice.horizontal.clamp(0.0, 1.0) * max_offset, source.width - width);
        CropRect {
            x,
            y: 0,
            width,
            height: source.height.max(1),
        }
    } else {
        let height = to_px(sw / target_aspect, source.height);
        let max_offset = f64::from(source.height - height);
        let y = to_px_floor(choice.anchor.offset(max_offset), source.height - height);
        CropRect {
            x: 0,
            y,
            width: source.width.max(1),
            height,
        }
    }
}

/// Round a span to whole pixels within `1..=limit`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_px(value: f64, limit: u32) -> u32 {
    (value.round() as u32).clamp(1, limit.max(1))
}

/// Floor an offset to whole pixels within `0..=limit`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_px_floor(value: f64, limit: u32) -> u32 {
    (value.max(0.0).floor() as u32).min(limit)
}
