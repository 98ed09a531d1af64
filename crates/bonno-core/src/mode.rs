//! The global display mode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What every bound element currently displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Elements show their original content.
    #[default]
    Original,
    /// Elements show placeholders; iframes are covered.
    Placeholder,
}

impl Mode {
    /// The only transition: the other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Original => Self::Placeholder,
            Self::Placeholder => Self::Original,
        }
    }

    /// Returns `true` in placeholder mode.
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Placeholder => f.write_str("placeholder"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_original_mode() {
        assert_eq!(Mode::default(), Mode::Original);
    }

    #[test]
    fn toggling_twice_returns_to_start() {
        for mode in [Mode::Original, Mode::Placeholder] {
            assert_ne!(mode.toggled(), mode);
            assert_eq!(mode.toggled().toggled(), mode);
        }
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Mode::Placeholder).unwrap(),
            "\"placeholder\""
        );
        assert_eq!(
            serde_json::from_str::<Mode>("\"original\"").unwrap(),
            Mode::Original
        );
    }
}
