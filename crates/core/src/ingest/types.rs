//! Types for the ingest module.

use serde::Serialize;
use std::path::PathBuf;

/// A successfully staged input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFile {
    /// Location of the staged copy.
    pub path: PathBuf,
    /// Size on disk after the copy completed.
    pub size_bytes: u64,
}
