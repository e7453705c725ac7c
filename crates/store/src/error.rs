//! Error types for store operations.

use thiserror::Error;

/// Errors raised by store reads, writes, and durability flushes.
///
/// A failed flush is fatal to the operation that triggered it, but committed
/// state for other vaults is untouched: flushes always write a complete
/// snapshot while the store's write lock is held.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode store snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}
