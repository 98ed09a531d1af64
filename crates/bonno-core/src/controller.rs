//! Inbound actions and their acknowledgments.
//!
//! The popup and settings pages talk to the content script with two
//! messages: toggle now, and enable or disable the feature. Both are
//! answered synchronously with an [`Ack`].

use serde::{Deserialize, Serialize};

use crate::binding::BindingStore;
use crate::engine::{Engine, FinalRequest};
use crate::mode::Mode;
use crate::page::Page;
use crate::render::PlaceholderRenderer;

/// A request from another extension context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    /// Switch the page to the other mode.
    ToggleImages,
    /// Enable or disable the feature on this page.
    ToggleFeature {
        /// New enabled state.
        #[serde(rename = "isEnabled")]
        is_enabled: bool,
    },
}

/// Acknowledgment sent back for every [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the action was carried out.
    pub success: bool,
    /// Mode after the action.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mode: Option<Mode>,
    /// Whether placeholders are shown, under the key the popup reads.
    #[serde(
        rename = "isBlackMode",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub placeholder_shown: Option<bool>,
}

impl Ack {
    /// Successful acknowledgment carrying the resulting mode.
    #[must_use]
    pub const fn done(mode: Mode) -> Self {
        Self {
            success: true,
            mode: Some(mode),
            placeholder_shown: Some(mode.is_placeholder()),
        }
    }

    /// Unsuccessful acknowledgment.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            success: false,
            mode: None,
            placeholder_shown: None,
        }
    }
}

/// Result of handling an [`Action`].
#[derive(Debug)]
pub struct Handled<N> {
    /// Acknowledgment for the sender.
    pub ack: Ack,
    /// Final placeholders the caller should load.
    pub pending: Vec<FinalRequest<N>>,
}

/// Owns the engine and the feature flag.
#[derive(Debug)]
pub struct Controller<S, R> {
    engine: Engine<S, R>,
    enabled: bool,
}

impl<S, R> Controller<S, R>
where
    S: BindingStore,
    R: PlaceholderRenderer,
{
    /// Wrap an engine. The feature starts disabled.
    #[must_use]
    pub const fn new(engine: Engine<S, R>) -> Self {
        Self {
            engine,
            enabled: false,
        }
    }

    /// Whether the feature is enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Current display mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.engine.mode()
    }

    /// The wrapped engine.
    #[must_use]
    pub const fn engine(&self) -> &Engine<S, R> {
        &self.engine
    }

    /// Mutable access to the wrapped engine.
    pub const fn engine_mut(&mut self) -> &mut Engine<S, R> {
        &mut self.engine
    }

    /// Dispatch an inbound action.
    pub fn handle<P>(&mut self, page: &P, action: Action) -> Handled<S::Node>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        match action {
            Action::ToggleImages => self.toggle(page),
            Action::ToggleFeature { is_enabled } => self.set_enabled(page, is_enabled),
        }
    }

    /// Switch the page to the other mode.
    pub fn toggle<P>(&mut self, page: &P) -> Handled<S::Node>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        let toggled = self.engine.toggle(page);
        Handled {
            ack: Ack::done(toggled.mode),
            pending: toggled.pending,
        }
    }

    /// Enable or disable the feature.
    ///
    /// Disabling while placeholders are shown restores the originals.
    pub fn set_enabled<P>(&mut self, page: &P, enabled: bool) -> Handled<S::Node>
    where
        P: Page<Node = S::Node, Overlay = S::Overlay>,
    {
        self.enabled = enabled;
        log::info!("feature {}", if enabled { "enabled" } else { "disabled" });

        if !enabled && self.engine.mode().is_placeholder() {
            return self.toggle(page);
        }
        Handled {
            ack: Ack::done(self.engine.mode()),
            pending: Vec::new(),
        }
    }
}
