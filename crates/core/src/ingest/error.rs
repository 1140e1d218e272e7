//! Error types for the ingest module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while staging a source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The handle could not be opened, or failed while being read.
    #[error("Source unreadable: {source_desc}")]
    SourceUnreadable {
        source_desc: String,
        #[source]
        error: std::io::Error,
    },

    /// The stream closed cleanly but nothing was staged.
    #[error("Source yielded no data")]
    EmptySource,

    /// Writing the staged file failed.
    #[error("Failed to write staged file: {path}")]
    DestinationWriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn unreadable(source_desc: impl Into<String>, error: std::io::Error) -> Self {
        Self::SourceUnreadable {
            source_desc: source_desc.into(),
            error,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::DestinationWriteFailed {
            path: path.into(),
            error,
        }
    }

    /// Stable snake_case name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnreadable { .. } => "source_unreadable",
            Self::EmptySource => "empty_source",
            Self::DestinationWriteFailed { .. } => "destination_write_failed",
        }
    }
}
