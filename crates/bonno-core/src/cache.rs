//! Bounded placeholder cache keyed by geometry.
//!
//! One LRU store holds three key namespaces: provisional fills
//! (`WxH`), final per-element placeholders (`actual_WxH`) and final
//! iframe overlays (`iframe_actual_WxH`). The namespace is part of the
//! key, so the namespaces never collide, but they do share the
//! capacity: inserting a final placeholder can evict a provisional one
//! and vice versa.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::types::{Placeholder, Size};

/// Which family of placeholder a cache key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Solid-fill placeholder shown immediately.
    Provisional,
    /// Cropped asset for images and background layers.
    Final,
    /// Cropped asset for iframe overlays.
    FrameFinal,
}

impl Namespace {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Provisional => "",
            Self::Final => "actual_",
            Self::FrameFinal => "iframe_actual_",
        }
    }
}

/// A namespaced geometry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Key family.
    pub namespace: Namespace,
    /// Resolved element geometry.
    pub size: Size,
}

impl CacheKey {
    /// Key of the provisional fill for `size`.
    #[must_use]
    pub const fn provisional(size: Size) -> Self {
        Self {
            namespace: Namespace::Provisional,
            size,
        }
    }

    /// Key of the final placeholder for an element of `size`.
    #[must_use]
    pub const fn final_for(size: Size) -> Self {
        Self {
            namespace: Namespace::Final,
            size,
        }
    }

    /// Key of the final overlay placeholder for an iframe of `size`.
    #[must_use]
    pub const fn frame_final(size: Size) -> Self {
        Self {
            namespace: Namespace::FrameFinal,
            size,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.namespace.prefix(), self.size)
    }
}

/// LRU cache of rendered placeholders.
///
/// `get` and `set` refresh recency; `has` does not.
pub struct PlaceholderCache {
    entries: LruCache<CacheKey, Placeholder>,
}

impl PlaceholderCache {
    /// Create a cache holding at most `capacity` entries.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<Placeholder> {
        self.entries.get(key).cloned()
    }

    /// Insert or refresh `key`.
    ///
    /// Inserting a new key into a full cache evicts exactly one entry,
    /// the least recently used.
    pub fn set(&mut self, key: CacheKey, value: Placeholder) {
        if let Some((evicted, _)) = self.entries.push(key, value)
            && evicted != key
        {
            log::debug!("placeholder cache evicted {evicted}");
        }
    }

    /// Whether `key` is present. Does not affect recency.
    #[must_use]
    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl fmt::Debug for PlaceholderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
