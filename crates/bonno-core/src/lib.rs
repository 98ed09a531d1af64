//! bonno-core: placeholder substitution engine (sans-IO).
//!
//! Swaps a page's images, background layers and iframes for cached
//! placeholders and back again:
//! scan -> resolve geometry -> bind once -> swap -> upgrade when the
//! final placeholder arrives.
//!
//! This crate has **no browser dependencies** -- the document is reached
//! through the [`Page`] trait, element records through a
//! [`BindingStore`], and asset loading is left to the caller, which
//! receives [`FinalRequest`]s and answers them through
//! [`Engine::complete_final`]. All browser interaction lives in
//! `bonno-web`.

pub mod binding;
pub mod cache;
pub mod config;
pub mod controller;
pub mod crop;
pub mod engine;
pub mod geometry;
pub mod mode;
pub mod page;
pub mod render;
pub mod types;

pub use binding::{BindingRecord, BindingStore, WeakBindingStore, WeakHandle};
pub use cache::{CacheKey, Namespace, PlaceholderCache};
pub use config::{ConfigError, DEFAULT_MAX_RASTER_SIDE, EngineConfig, ResampleFilter};
pub use controller::{Ack, Action, Controller, Handled};
pub use crop::{CropChoice, CropRect, VerticalAnchor};
pub use engine::{ElementError, Engine, FinalRequest, Toggled};
pub use geometry::SizeHints;
pub use mode::Mode;
pub use page::{Capability, ElementKind, OverlaySpec, Page, PageError, Slot};
pub use render::{PlaceholderRenderer, RasterRenderer, RenderError};
pub use types::{Placeholder, Size};
