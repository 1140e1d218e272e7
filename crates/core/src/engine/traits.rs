//! Trait definitions for the engine module.

use std::path::Path;

/// Status returned by an engine that completed successfully.
pub const ENGINE_SUCCESS: i32 = 0;

/// Status used when the engine could not run at all.
pub const ENGINE_FAILURE: i32 = -1;

/// A transcoding engine with a path-in, path-out, status-code contract.
///
/// Implementations block for the whole transcode. Non-zero codes are opaque
/// and surfaced to observers verbatim.
pub trait TranscodeEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Version of the underlying engine, for diagnostics. May block.
    fn version(&self) -> Option<String> {
        None
    }

    /// Transcodes `input` into `output`, returning the engine status.
    fn transcode(&self, input: &Path, output: &Path) -> i32;
}
