//! Per-element binding records.
//!
//! A binding associates an element with the value it showed before
//! substitution and the placeholder that replaces it. Each element is
//! bound at most once, and the store must never be what keeps an
//! element alive: once the page drops an element its record goes with
//! it.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::types::{Placeholder, Size};

/// What the engine remembers about one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingRecord<O> {
    /// Value shown before substitution: the image source, the `srcset`
    /// of a responsive `source`, or the computed `background-image`.
    /// Absent for overlay-only elements.
    pub original: Option<String>,
    /// Placeholder shown in placeholder mode. Starts provisional and is
    /// upgraded in place once the final phase resolves.
    pub placeholder: Placeholder,
    /// Geometry the placeholder was rendered for.
    pub size: Size,
    /// Overlay covering an element whose content cannot be replaced.
    pub overlay: Option<O>,
    /// Whether the final phase has been requested for this element.
    pub final_requested: bool,
}

impl<O> BindingRecord<O> {
    /// Record for a content-replaceable element.
    #[must_use]
    pub const fn replaceable(original: String, placeholder: Placeholder, size: Size) -> Self {
        Self {
            original: Some(original),
            placeholder,
            size,
            overlay: None,
            final_requested: false,
        }
    }

    /// Record for an overlay-only element.
    #[must_use]
    pub const fn overlaid(overlay: O, placeholder: Placeholder, size: Size) -> Self {
        Self {
            original: None,
            placeholder,
            size,
            overlay: Some(overlay),
            final_requested: false,
        }
    }

    /// The value to show for an element in the given mode.
    ///
    /// `None` for overlay-only elements in original mode, which have no
    /// content value of their own.
    #[must_use]
    pub fn shown(&self, placeholder_mode: bool) -> Option<&str> {
        if placeholder_mode {
            Some(self.placeholder.as_str())
        } else {
            self.original.as_deref()
        }
    }
}

/// Identity-keyed storage of binding records.
pub trait BindingStore {
    /// Element handle.
    type Node: Clone;
    /// Overlay handle kept in records of overlay-only elements.
    type Overlay: Clone;

    /// The record for `node`, if it has been bound.
    fn get(&self, node: &Self::Node) -> Option<BindingRecord<Self::Overlay>>;

    /// Bind `node` to `record`.
    ///
    /// Returns `false` and leaves the existing record untouched if
    /// `node` is already bound.
    fn bind(&mut self, node: &Self::Node, record: BindingRecord<Self::Overlay>) -> bool;

    /// Replace the record of an already-bound `node`.
    ///
    /// Returns `false` if `node` was never bound.
    fn replace(&mut self, node: &Self::Node, record: BindingRecord<Self::Overlay>) -> bool;
}

/// A node handle that can be held weakly and compared by identity.
pub trait WeakHandle: Sized {
    /// Non-owning form of the handle.
    type Weak;

    /// Identity of the referenced node, stable while it is alive.
    fn identity(&self) -> usize;

    /// Create a non-owning handle.
    fn downgrade(&self) -> Self::Weak;

    /// Whether the node behind a non-owning handle is still alive.
    fn is_alive(weak: &Self::Weak) -> bool;
}

impl<T> WeakHandle for Rc<T> {
    type Weak = Weak<T>;

    fn identity(&self) -> usize {
        Rc::as_ptr(self).cast::<()>() as usize
    }

    fn downgrade(&self) -> Self::Weak {
        Rc::downgrade(self)
    }

    fn is_alive(weak: &Self::Weak) -> bool {
        weak.strong_count() > 0
    }
}

/// Entry count below which [`WeakBindingStore::bind`] skips pruning.
const MIN_PRUNE_AT: usize = 64;

/// Binding store over weakly-held node handles.
///
/// Entries whose node has been dropped are treated as absent. They are
/// purged on access, by [`prune`](Self::prune), and by `bind` whenever
/// the table has doubled since the last sweep, so dead entries never
/// outnumber live ones for long. An identity reused by a new node after
/// the old one was dropped starts unbound.
pub struct WeakBindingStore<N: WeakHandle, O> {
    entries: HashMap<usize, (N::Weak, BindingRecord<O>)>,
    prune_at: usize,
}

impl<N: WeakHandle, O> WeakBindingStore<N, O> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            prune_at: MIN_PRUNE_AT,
        }
    }

    /// Drop records whose node is gone.
    pub fn prune(&mut self) {
        self.entries.retain(|_, (weak, _)| N::is_alive(weak));
        self.prune_at = (self.entries.len() * 2).max(MIN_PRUNE_AT);
    }

    /// Number of records for live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|(weak, _)| N::is_alive(weak))
            .count()
    }

    /// Returns `true` if no live node is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_entry(&mut self, node: &N) -> Option<&mut BindingRecord<O>> {
        let id = node.identity();
        let alive = self
            .entries
            .get(&id)
            .is_some_and(|(weak, _)| N::is_alive(weak));
        if !alive {
            self.entries.remove(&id);
            return None;
        }
        self.entries.get_mut(&id).map(|(_, record)| record)
    }
}

impl<N: WeakHandle, O> Default for WeakBindingStore<N, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: WeakHandle + Clone, O: Clone> BindingStore for WeakBindingStore<N, O> {
    type Node = N;
    type Overlay = O;

    fn get(&self, node: &N) -> Option<BindingRecord<O>> {
        self.entries
            .get(&node.identity())
            .filter(|(weak, _)| N::is_alive(weak))
            .map(|(_, record)| record.clone())
    }

    fn bind(&mut self, node: &N, record: BindingRecord<O>) -> bool {
        if self.live_entry(node).is_some() {
            return false;
        }
        if self.entries.len() >= self.prune_at {
            self.prune();
        }
        self.entries
            .insert(node.identity(), (node.downgrade(), record));
        true
    }

    fn replace(&mut self, node: &N, record: BindingRecord<O>) -> bool {
        match self.live_entry(node) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => false,
        }
    }
}
