//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons the working directories could not be resolved.
///
/// Every variant is a `StorageUnavailable` condition from the job's point of
/// view: fatal to the current attempt and never retried.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The external permission subsystem has not granted storage access.
    #[error("Storage access has not been granted")]
    AccessDenied,

    /// A directory could not be created.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path exists but is not a writable directory.
    #[error("Not a writable directory: {path}")]
    NotWritable { path: PathBuf },
}
