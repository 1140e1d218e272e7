//! Testing utilities and mock implementations.
//!
//! Mocks for the engine and source seams, so a job can be driven end to end
//! without ffmpeg or a real media picker.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidstage_core::testing::{MockEngine, MockSource};
//!
//! let engine = MockEngine::new();
//! engine.set_exit_code(7);
//!
//! let source = MockSource::from_bytes(fixtures::payload(1024));
//! ```

mod mock_engine;
mod mock_source;

pub use mock_engine::{MockEngine, RecordedInvocation, MOCK_ENGINE_VERSION};
pub use mock_source::MockSource;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::Path;

    use crate::storage::StorageConfig;

    /// Deterministic, non-uniform payload of `len` bytes.
    pub fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    /// Storage config rooted under `root`, with neither directory created.
    pub fn storage_config(root: &Path) -> StorageConfig {
        StorageConfig::with_dirs(root.join("tmp"), root.join("Tx_video"))
    }
}
