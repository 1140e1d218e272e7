//! Trait definitions for the storage module.

use super::error::StorageError;
use super::types::StorageDirs;

/// Resolves the directories a job stages into and writes output to.
pub trait StorageGate: Send + Sync {
    /// Ensures both directories exist, creating them if absent.
    ///
    /// Idempotent. Directory creation is the only side effect. Called under
    /// the job lock, so it must not wait on anything that takes the lock;
    /// async callers should treat it as blocking I/O.
    fn resolve_directories(&self) -> Result<StorageDirs, StorageError>;
}
