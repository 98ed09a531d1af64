//! Placeholder pixel generation.
//!
//! [`PlaceholderRenderer`] is the replaceable capability the engine
//! calls for both phases. [`RasterRenderer`] is the production
//! implementation: it paints with the `image` crate and returns PNG
//! data URLs that can be assigned straight to `src`, `srcset` or a CSS
//! `url(...)`.

use base64::Engine as _;
use image::{DynamicImage, ImageEncoder, RgbaImage};

use crate::config::{DEFAULT_MAX_RASTER_SIDE, EngineConfig, ResampleFilter};
use crate::crop::{CropChoice, cover_crop};
use crate::types::{Placeholder, Size};

/// Errors that can occur while rendering a placeholder.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The loaded asset contained no bytes.
    #[error("placeholder asset is empty")]
    EmptyAsset,

    /// The asset decoded to an image with a zero dimension.
    #[error("placeholder asset has no pixels ({0})")]
    DegenerateAsset(Size),

    /// Decoding the asset or encoding the output failed.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Produces placeholder visuals.
pub trait PlaceholderRenderer {
    /// Render the cheap solid-fill placeholder for `size`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the placeholder cannot be encoded.
    fn provisional(&self, size: Size) -> Result<Placeholder, RenderError>;

    /// Render the final placeholder for `size` from encoded asset bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the asset is empty, cannot be decoded,
    /// or the output cannot be encoded.
    fn finalize(
        &self,
        asset: &[u8],
        size: Size,
        crop: CropChoice,
    ) -> Result<Placeholder, RenderError>;
}

/// Renders PNG data URL placeholders with the `image` crate.
///
/// Rasters never exceed `max_side` on either axis; an oversized target
/// is rendered at the same aspect ratio and left for the page to scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterRenderer {
    fill: [u8; 3],
    filter: ResampleFilter,
    max_side: u32,
}

impl RasterRenderer {
    /// Create a renderer with an explicit fill color and filter.
    #[must_use]
    pub const fn new(fill: [u8; 3], filter: ResampleFilter) -> Self {
        Self {
            fill,
            filter,
            max_side: DEFAULT_MAX_RASTER_SIDE,
        }
    }

    /// Cap the longest side of every raster at `max_side` pixels.
    #[must_use]
    pub const fn with_max_side(mut self, max_side: u32) -> Self {
        self.max_side = max_side;
        self
    }

    /// Create a renderer from the engine configuration.
    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.fill_color, config.resample_filter).with_max_side(config.max_raster_side)
    }
}

impl Default for RasterRenderer {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl PlaceholderRenderer for RasterRenderer {
    fn provisional(&self, size: Size) -> Result<Placeholder, RenderError> {
        let [r, g, b] = self.fill;
        let raster = size.fit_within(self.max_side);
        let image =
            RgbaImage::from_pixel(raster.width, raster.height, image::Rgba([r, g, b, 255]));
        encode_png_data_url(&image)
    }

    fn finalize(
        &self,
        asset: &[u8],
        size: Size,
        crop: CropChoice,
    ) -> Result<Placeholder, RenderError> {
        if asset.is_empty() {
            return Err(RenderError::EmptyAsset);
        }
        let source = image::load_from_memory(asset)?;
        let source_size = Size::new(source.width(), source.height());
        if !source_size.is_complete() {
            return Err(RenderError::DegenerateAsset(source_size));
        }

        let rect = cover_crop(source_size, size, crop);
        let cropped = source.crop_imm(rect.x, rect.y, rect.width, rect.height);
        let raster = size.fit_within(self.max_side);
        let scaled: DynamicImage =
            cropped.resize_exact(raster.width, raster.height, self.filter.to_image_filter());
        encode_png_data_url(&scaled.to_rgba8())
    }
}

/// Encode an RGBA image as a `data:image/png;base64,...` placeholder.
///
/// # Errors
///
/// Returns [`RenderError::Image`] if PNG encoding fails.
pub fn encode_png_data_url(image: &RgbaImage) -> Result<Placeholder, RenderError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    Ok(Placeholder::from(format!("data:image/png;base64,{encoded}")))
}
