//! Durable vault registry and rate history.
//!
//! This crate provides:
//! - A lock-guarded store owning every vault record and its last observed rate
//! - Pluggable durability backends (JSON files on disk, or none for tests)

pub mod backend;
pub mod error;
pub mod store;

pub use backend::{JsonFileBackend, MemoryBackend, StorageBackend, StoreSnapshot};
pub use error::StoreError;
pub use store::VaultStore;
