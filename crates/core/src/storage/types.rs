//! Types for the storage module.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Directories returned by a [`StorageGate`](super::StorageGate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageDirs {
    /// Process-owned directory for the staged input.
    pub temp_dir: PathBuf,
    /// Directory receiving engine output.
    pub output_dir: PathBuf,
}

/// Shared "storage access granted" signal.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    granted: Arc<AtomicBool>,
}

impl AccessGrant {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: Arc::new(AtomicBool::new(granted)),
        }
    }

    pub fn granted() -> Self {
        Self::new(true)
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn set(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl Default for AccessGrant {
    fn default() -> Self {
        Self::granted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_grant_clones_share_state() {
        let grant = AccessGrant::new(false);
        let other = grant.clone();
        assert!(!other.is_granted());

        grant.set(true);
        assert!(other.is_granted());
    }
}
