//! Page configuration.

use serde::Deserialize;
use thiserror::Error;

/// Errors from loading a [`PageConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid JSON for a [`PageConfig`].
    #[error("invalid page configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// User-agent policy knobs that change lifecycle outcomes.
///
/// Every field has a default, so an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageConfig {
    /// Whether the user agent intends to keep unloaded documents in the
    /// back/forward cache. When off, every unloaded document becomes
    /// unsalvageable and is destroyed.
    pub back_forward_cache: bool,

    /// Whether `beforeunload` may ask the user to confirm leaving the page.
    pub unload_prompts: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            back_forward_cache: false,
            unload_prompts: true,
        }
    }
}

impl PageConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON, unknown fields or
    /// mistyped values.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config = serde_json::from_str(text)?;
        log::debug!(target: "lifecycle", "loaded {config:?}");
        Ok(config)
    }
}
