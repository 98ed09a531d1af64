//! The toggle engine.
//!
//! [`Engine::toggle`] rescans the whole page on every call, binds
//! elements it has not seen, swaps the ones it has, and flips the mode.
//! Everything visible changes synchronously; final placeholders are
//! returned as [`FinalRequest`]s for the caller to load and hand back
//! through [`Engine::complete_final`], possibly after further toggles.
//!
//! The engine performs no I/O. The page, the binding store and the
//! renderer are supplied by the caller.

use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::binding::{BindingRecord, BindingStore};
use crate::cache::{CacheKey, PlaceholderCache};
use crate::config::{ConfigError, EngineConfig};
use crate::crop::CropChoice;
use crate::geometry;
use crate::mode::Mode;
use crate::page::{Capability, ElementKind, OverlaySpec, Page, PageError, Slot};
use crate::render::{PlaceholderRenderer, RenderError};
use crate::types::{Placeholder, Size};

/// Failure while handling a single element. Never aborts a scan.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    /// A page operation failed.
    #[error(transparent)]
    Page(#[from] PageError),

    /// The provisional placeholder could not be rendered.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A final placeholder waiting for its asset.
#[derive(Debug, Clone)]
pub struct FinalRequest<N> {
    /// Element to upgrade once the asset is rendered.
    pub node: N,
    /// Kind of `node`.
    pub kind: ElementKind,
    /// Cache key the result is stored under.
    pub key: CacheKey,
    /// Zero-based index into the asset pool.
    pub asset: usize,
    /// Crop randomness, sampled at request time.
    pub crop: CropChoice,
}

/// Result of one [`Engine::toggle`].
#[derive(Debug)]
pub struct Toggled<N> {
    /// Mode after the toggle.
    pub mode: Mode,
    /// Final placeholders to load.
    pub pending: Vec<FinalRequest<N>>,
}

/// The substitution state machine.
pub struct Engine<S, R> {
    config: EngineConfig,
    mode: Mode,
    cache: PlaceholderCache,
    bindings: S,
    renderer: R,
    rng: SmallRng,
}

impl<S, R> Engine<S, R>
where
    S: BindingStore,
    R: PlaceholderRenderer,
{
    /// Create an engine in [`Mode::Original`] with an entropy-seeded
    /// random source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn new(config: EngineConfig, bindings: S, renderer: R) -> Result<Self, ConfigError> {
        Self::with_rng(config, bindings, renderer, SmallRng::from_entropy())
    }

    /// Create an engine with a seeded random source, for reproducible
    /// asset and crop selection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` is invalid.
    pub fn with_seed(
        config: EngineConfig,
        bindings: S,
        renderer: R,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(config, bindings, renderer, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(
        config: EngineConfig,
        bindings: S,
        renderer: R,
        rng: SmallRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            cache: PlaceholderCache::new(config.cache_capacity),
            config,
            mode: Mode::Original,
            bindings,
            renderer,
            rng,
        })
    }

    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The placeholder cache.
    #[must_use]
    pub const fn cache(&self) -> &PlaceholderCache {
        &self.cache
    }

    /// Mutable access to the placeholder cache.
    pub const fn cache_mut(&mut self) -> &mut PlaceholderCache {
        &mut self.cache
    }

    /// The binding store.
    #[must_use]
    pub const fn bindings(&self) -> &S {
        &self.bindings
    }

    /// Switch every eligible element to the other mode.
    ///
    /// Runs image, background and frame passes in that order, then
    /// flips the mode. A failure on one element is logged and the scan
    /// continues.
    pub fn toggle<P>(&mut self, page: &P) -> Toggled<S::Node>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        let target = self.mode.toggled();
        let mut pending = Vec::new();

        for kind in ElementKind::ALL {
            for node in page.candidates(kind) {
                if page.is_overlay(&node) {
                    continue;
                }
                let outcome = match kind.capability() {
                    Capability::Replaceable(slot) => {
                        self.visit_replaceable(page, kind, slot, &node, target, &mut pending)
                    }
                    Capability::OverlayOnly => {
                        self.visit_overlaid(page, kind, &node, target, &mut pending)
                    }
                };
                if let Err(err) = outcome {
                    log::warn!("skipping {kind} element: {err}");
                }
            }
        }

        self.mode = target;
        log::debug!(
            "switched to {target} mode, {} final placeholder(s) pending",
            pending.len()
        );
        Toggled {
            mode: target,
            pending,
        }
    }

    /// Deliver the asset for a [`FinalRequest`].
    ///
    /// Renders and caches the final placeholder, stores it in the
    /// element's record, and shows it only where the element still
    /// displays the placeholder it replaces. If another element of the
    /// same geometry already resolved the key, that result is reused
    /// and `asset` is ignored. A failed load is logged and the element
    /// keeps its provisional placeholder.
    pub fn complete_final<P, E>(
        &mut self,
        page: &P,
        request: FinalRequest<S::Node>,
        asset: Result<&[u8], E>,
    ) where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
        E: fmt::Display,
    {
        let FinalRequest {
            node,
            kind,
            key,
            asset: index,
            crop,
        } = request;

        let placeholder = if let Some(cached) = self.cache.get(&key) {
            cached
        } else {
            let rendered = match asset {
                Ok(bytes) => self
                    .renderer
                    .finalize(bytes, key.size, crop)
                    .map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            match rendered {
                Ok(placeholder) => {
                    self.cache.set(key, placeholder.clone());
                    placeholder
                }
                Err(msg) => {
                    log::error!("failed to build final placeholder {key} from asset {index}: {msg}");
                    return;
                }
            }
        };

        if let Err(err) = self.upgrade(page, kind, &node, &placeholder) {
            log::warn!("failed to upgrade {kind} element to {key}: {err}");
        }
    }

    fn visit_replaceable<P>(
        &mut self,
        page: &P,
        kind: ElementKind,
        slot: Slot,
        node: &S::Node,
        target: Mode,
        pending: &mut Vec<FinalRequest<S::Node>>,
    ) -> Result<(), ElementError>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        if let Some(record) = self.bindings.get(node) {
            if target.is_placeholder() {
                let record = self.ensure_final(kind, node, record, pending);
                self.show(page, kind, slot, node, &record.placeholder, record.size)?;
            } else {
                self.restore(page, kind, slot, node, &record)?;
            }
            return Ok(());
        }

        let Some((original, size)) = self.measure(page, kind, node) else {
            return Ok(());
        };
        let provisional = self.provisional(size)?;
        let record = BindingRecord::replaceable(original, provisional, size);
        self.bindings.bind(node, record.clone());
        log::debug!("bound {kind} element at {size}");

        if target.is_placeholder() {
            let record = self.ensure_final(kind, node, record, pending);
            self.show(page, kind, slot, node, &record.placeholder, size)?;
        }
        Ok(())
    }

    fn visit_overlaid<P>(
        &mut self,
        page: &P,
        kind: ElementKind,
        node: &S::Node,
        target: Mode,
        pending: &mut Vec<FinalRequest<S::Node>>,
    ) -> Result<(), ElementError>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        if let Some(record) = self.bindings.get(node) {
            let Some(overlay) = record.overlay.clone() else {
                return Ok(());
            };
            if target.is_placeholder() {
                let previous = record.placeholder.clone();
                let record = self.ensure_final(kind, node, record, pending);
                if record.placeholder != previous {
                    page.set_overlay_background(&overlay, &record.placeholder)?;
                }
            }
            page.set_overlay_visible(&overlay, target.is_placeholder())?;
            return Ok(());
        }

        let size = geometry::frame_size(&page.size_hints(node));
        let threshold = self.config.icon_threshold;
        if size.width <= threshold || size.height <= threshold {
            return Ok(());
        }

        let provisional = self.provisional(size)?;
        let spec = OverlaySpec {
            size,
            background: provisional.clone(),
            visible: target.is_placeholder(),
            z_index: self.config.overlay_z_index,
        };
        let overlay = page.attach_overlay(node, &spec)?;
        let record = BindingRecord::overlaid(overlay.clone(), provisional.clone(), size);
        self.bindings.bind(node, record.clone());
        log::debug!("covered {kind} element at {size}");

        if target.is_placeholder() {
            let record = self.ensure_final(kind, node, record, pending);
            if record.placeholder != provisional {
                page.set_overlay_background(&overlay, &record.placeholder)?;
            }
        }
        Ok(())
    }

    /// Original value and geometry of an unbound element, or `None` if
    /// the element is not eligible.
    fn measure<P>(&self, page: &P, kind: ElementKind, node: &S::Node) -> Option<(String, Size)>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        match kind {
            ElementKind::Image => {
                let source = page
                    .read(node, Slot::Source)
                    .or_else(|| page.read(node, Slot::LazySource));
                let size = geometry::resolve_size(&page.size_hints(node), self.config.default_size);
                if !geometry::is_eligible(source.as_deref(), size, &self.config) {
                    return None;
                }
                source.map(|source| (source, size))
            }
            ElementKind::Background => {
                let value = page.read(node, Slot::Background)?;
                if !geometry::is_background_candidate(&value, &self.config) {
                    return None;
                }
                let (width, height) = page.layout_box(node);
                let size =
                    geometry::background_size(width, height, self.config.min_background_size);
                let threshold = self.config.icon_threshold;
                (size.width > threshold && size.height > threshold).then_some((value, size))
            }
            ElementKind::Frame => None,
        }
    }

    /// The provisional placeholder for `size`, rendered on a cache miss.
    fn provisional(&mut self, size: Size) -> Result<Placeholder, RenderError> {
        let key = CacheKey::provisional(size);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let placeholder = self.renderer.provisional(size)?;
        self.cache.set(key, placeholder.clone());
        Ok(placeholder)
    }

    /// Adopt a cached final placeholder for the record's geometry, or
    /// request one if this element never asked before.
    ///
    /// A request is made at most once per element, so a failed load is
    /// not retried.
    fn ensure_final(
        &mut self,
        kind: ElementKind,
        node: &S::Node,
        mut record: BindingRecord<S::Overlay>,
        pending: &mut Vec<FinalRequest<S::Node>>,
    ) -> BindingRecord<S::Overlay> {
        let key = final_key(kind, record.size);
        if let Some(cached) = self.cache.get(&key) {
            if record.placeholder != cached || !record.final_requested {
                record.placeholder = cached;
                record.final_requested = true;
                self.bindings.replace(node, record.clone());
            }
            return record;
        }
        if !record.final_requested {
            record.final_requested = true;
            self.bindings.replace(node, record.clone());
            pending.push(FinalRequest {
                node: node.clone(),
                kind,
                key,
                asset: self.rng.gen_range(0..self.config.asset_count),
                crop: CropChoice::random(&mut self.rng),
            });
        }
        record
    }

    /// Display `placeholder` on a replaceable element.
    fn show<P>(
        &mut self,
        page: &P,
        kind: ElementKind,
        slot: Slot,
        node: &S::Node,
        placeholder: &Placeholder,
        size: Size,
    ) -> Result<(), PageError>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        write_shown(page, kind, slot, node, &slot.placeholder_value(placeholder))?;
        if kind != ElementKind::Image {
            return Ok(());
        }
        for source in page.responsive_sources(node) {
            match self.bindings.get(&source) {
                Some(mut record) => {
                    if record.placeholder != *placeholder {
                        record.placeholder = placeholder.clone();
                        self.bindings.replace(&source, record);
                    }
                }
                None => {
                    let original = page.read(&source, Slot::Srcset).unwrap_or_default();
                    self.bindings.bind(
                        &source,
                        BindingRecord::replaceable(original, placeholder.clone(), size),
                    );
                }
            }
            page.write(&source, Slot::Srcset, placeholder.as_str())?;
        }
        Ok(())
    }

    /// Put a replaceable element back to its original value.
    fn restore<P>(
        &self,
        page: &P,
        kind: ElementKind,
        slot: Slot,
        node: &S::Node,
        record: &BindingRecord<S::Overlay>,
    ) -> Result<(), PageError>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        write_shown(page, kind, slot, node, record.shown(false).unwrap_or_default())?;
        if kind != ElementKind::Image {
            return Ok(());
        }
        for source in page.responsive_sources(node) {
            if let Some(record) = self.bindings.get(&source) {
                page.write(&source, Slot::Srcset, record.shown(false).unwrap_or_default())?;
            }
        }
        Ok(())
    }

    /// Store `placeholder` in the element's record and show it where
    /// the element still displays the value it supersedes.
    fn upgrade<P>(
        &mut self,
        page: &P,
        kind: ElementKind,
        node: &S::Node,
        placeholder: &Placeholder,
    ) -> Result<(), PageError>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        let Some(mut record) = self.bindings.get(node) else {
            return Ok(());
        };
        if record.placeholder == *placeholder {
            return Ok(());
        }
        let previous = std::mem::replace(&mut record.placeholder, placeholder.clone());
        let overlay = record.overlay.clone();
        self.bindings.replace(node, record);
        log::debug!("upgraded {kind} element to its final placeholder");

        match kind.capability() {
            Capability::Replaceable(slot) => {
                let superseded = slot.placeholder_value(&previous);
                if page.read(node, slot).as_deref() == Some(superseded.as_ref()) {
                    write_shown(page, kind, slot, node, &slot.placeholder_value(placeholder))?;
                }
                if kind == ElementKind::Image {
                    self.upgrade_sources(page, node, &previous, placeholder)?;
                }
            }
            Capability::OverlayOnly => {
                if let Some(overlay) = overlay {
                    page.set_overlay_background(&overlay, placeholder)?;
                }
            }
        }
        Ok(())
    }

    fn upgrade_sources<P>(
        &mut self,
        page: &P,
        node: &S::Node,
        previous: &Placeholder,
        placeholder: &Placeholder,
    ) -> Result<(), PageError>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        for source in page.responsive_sources(node) {
            let Some(mut record) = self.bindings.get(&source) else {
                continue;
            };
            if record.placeholder != *previous {
                continue;
            }
            record.placeholder = placeholder.clone();
            self.bindings.replace(&source, record);
            if page.read(&source, Slot::Srcset).as_deref() == Some(previous.as_str()) {
                page.write(&source, Slot::Srcset, placeholder.as_str())?;
            }
        }
        Ok(())
    }
}

impl<S, R> fmt::Debug for Engine<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("mode", &self.mode)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Cache key of the final placeholder for an element of `kind`.
const fn final_key(kind: ElementKind, size: Size) -> CacheKey {
    match kind.capability() {
        Capability::Replaceable(_) => CacheKey::final_for(size),
        Capability::OverlayOnly => CacheKey::frame_final(size),
    }
}

/// Write `value` to `slot`, mirroring it into `data-src` on images that
/// carry one so lazy loaders do not bring the other value back.
fn write_shown<P: Page>(
    page: &P,
    kind: ElementKind,
    slot: Slot,
    node: &P::Node,
    value: &str,
) -> Result<(), PageError> {
    page.write(node, slot, value)?;
    if kind == ElementKind::Image && page.read(node, Slot::LazySource).is_some() {
        page.write(node, Slot::LazySource, value)?;
    }
    Ok(())
}

