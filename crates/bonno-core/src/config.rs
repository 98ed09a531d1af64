//! Engine configuration.
//!
//! Every tunable the engine consults lives here rather than at call
//! sites: the icon threshold, the excluded source formats, the asset
//! pool, cache capacity and the placeholder fill color.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resampling filter used when scaling a cropped asset to its target.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Lanczos with 3 lobes: slowest, sharpest.
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    #[must_use]
    pub const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Default cap on either side of a placeholder raster.
pub const DEFAULT_MAX_RASTER_SIDE: u32 = 2048;

/// Errors reported by [`EngineConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The placeholder cache must hold at least one entry.
    #[error("cache capacity must be at least 1")]
    ZeroCacheCapacity,

    /// The asset pool must contain at least one asset.
    #[error("asset pool must contain at least one asset")]
    EmptyAssetPool,

    /// The fallback size must be positive.
    #[error("default size must be positive")]
    ZeroDefaultSize,

    /// Rasters must be allowed at least one pixel per axis.
    #[error("maximum raster side must be positive")]
    ZeroRasterSide,
}

/// Configuration for the substitution engine.
///
/// All fields have defaults, so a partial JSON object deserializes
/// into a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of entries in the shared placeholder cache,
    /// across all key namespaces.
    pub cache_capacity: usize,

    /// Number of interchangeable assets in the placeholder pool.
    pub asset_count: usize,

    /// Extension-relative directory holding `1.jpg ..= N.jpg`.
    pub asset_dir: String,

    /// Elements whose both dimensions are at or below this many
    /// pixels are treated as icons and left alone.
    pub icon_threshold: u32,

    /// Fallback size (per axis) when no geometry source yields one.
    pub default_size: u32,

    /// Per-axis lower bound applied to background-image layout boxes.
    pub min_background_size: u32,

    /// RGB fill of the provisional placeholder.
    pub fill_color: [u8; 3],

    /// Lowercase source substrings that exclude an element unless the
    /// source is an inline `data:` URI.
    pub excluded_formats: Vec<String>,

    /// Stacking order of iframe overlays.
    pub overlay_z_index: i32,

    /// Filter used to scale final placeholders.
    pub resample_filter: ResampleFilter,

    /// Longest side, in pixels, of a rendered placeholder raster.
    /// Larger elements get an aspect-preserving raster that the page
    /// scales up, so one huge element cannot exhaust module memory.
    pub max_raster_side: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 50,
            asset_count: 20,
            asset_dir: "image".to_owned(),
            icon_threshold: 37,
            default_size: 200,
            min_background_size: 100,
            fill_color: [0xa9, 0xa9, 0xa9],
            excluded_formats: vec![".svg".to_owned(), ".gif".to_owned()],
            overlay_z_index: 9999,
            resample_filter: ResampleFilter::default(),
            max_raster_side: DEFAULT_MAX_RASTER_SIDE,
        }
    }
}

impl EngineConfig {
    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ConfigError`].
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        if self.asset_count == 0 {
            return Err(ConfigError::EmptyAssetPool);
        }
        if self.default_size == 0 {
            return Err(ConfigError::ZeroDefaultSize);
        }
        if self.max_raster_side == 0 {
            return Err(ConfigError::ZeroRasterSide);
        }
        Ok(())
    }

    /// Extension-relative path of the asset at `index` (zero-based).
    #[must_use]
    pub fn asset_path(&self, index: usize) -> String {
        format!("{}/{}.jpg", self.asset_dir, index + 1)
    }
}
