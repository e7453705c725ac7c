//! Error types for market data operations.

use thiserror::Error;

/// Errors from market fetches and vault resolution.
#[derive(Debug, Error)]
pub enum MorphoError {
    #[error("market API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("market API error: {0}")]
    Api(String),

    #[error("no market data for key {key}")]
    MarketNotFound { key: String },

    #[error("vault {vault_id} does not match any listed market")]
    Unresolved { vault_id: String },
}

impl MorphoError {
    /// True when the next poll cycle may succeed without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(self, MorphoError::Transport(_))
    }

    /// True when the vault's identifying inputs need correcting by whoever
    /// enrolled it.
    pub fn is_resolution(&self) -> bool {
        matches!(self, MorphoError::Unresolved { .. })
    }
}
