//! Types for the job orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::engine::ENGINE_SUCCESS;
use crate::ingest::IngestError;
use crate::storage::StorageError;

/// Lifecycle state of the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Ingesting,
    Staged,
    Transcoding,
    Succeeded,
    Failed { reason: JobFailure },
}

impl JobState {
    /// Stable snake_case name, used for logs, metrics and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ingesting => "ingesting",
            Self::Staged => "staged",
            Self::Transcoding => "transcoding",
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether background work is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Ingesting | Self::Transcoding)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }

    /// Whether a new selection may be accepted.
    pub fn accepts_selection(&self) -> bool {
        matches!(self, Self::Idle) || self.is_terminal()
    }
}

/// Why a job ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobFailure {
    /// The source could not be opened or read.
    #[error("source unreadable")]
    SourceUnreadable,

    /// The source closed without yielding data.
    #[error("source yielded no data")]
    EmptySource,

    /// The staged copy could not be written.
    #[error("failed to write staged file")]
    DestinationWriteFailed,

    /// The engine returned a non-zero code, or reported success without
    /// producing a non-empty output (code 0).
    #[error("{}", transcode_message(.code))]
    TranscodeError { code: i32 },
}

fn transcode_message(code: &i32) -> String {
    if *code == ENGINE_SUCCESS {
        "engine reported success but the output is missing or empty".to_string()
    } else {
        format!("engine failed with code {}", code)
    }
}

impl From<&IngestError> for JobFailure {
    fn from(err: &IngestError) -> Self {
        match err {
            IngestError::SourceUnreadable { .. } => Self::SourceUnreadable,
            IngestError::EmptySource => Self::EmptySource,
            IngestError::DestinationWriteFailed { .. } => Self::DestinationWriteFailed,
        }
    }
}

/// Synchronous rejection of a submission. No state changes when returned.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Work is in flight, or a staged file awaits transcoding.
    #[error("job is busy ({state})")]
    AlreadyBusy { state: &'static str },

    /// A transcode was requested without a staged file.
    #[error("no staged input to transcode (state: {state})")]
    NotStaged { state: &'static str },

    /// The working directories could not be resolved.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl SubmitError {
    /// Stable snake_case name of the rejection reason.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyBusy { .. } => "already_busy",
            Self::NotStaged { .. } => "not_staged",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

/// Consistent point-in-time view of the job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    /// Number of times the job has been armed.
    pub run: u64,
    pub state: JobState,
    /// Description of the selected source for the current run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Present only while `Staged` or `Transcoding`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staged_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Present only while `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<JobFailure>,
    /// Sequence number of the last published event.
    pub sequence: u64,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(JobState::Idle.accepts_selection());
        assert!(JobState::Succeeded.accepts_selection());
        assert!(JobState::Failed {
            reason: JobFailure::EmptySource
        }
        .accepts_selection());
        assert!(!JobState::Ingesting.accepts_selection());
        assert!(!JobState::Staged.accepts_selection());
        assert!(!JobState::Transcoding.accepts_selection());

        assert!(JobState::Ingesting.is_busy());
        assert!(!JobState::Staged.is_busy());
        assert!(!JobState::Idle.is_terminal());
    }

    #[test]
    fn test_failure_display() {
        assert_eq!(
            JobFailure::TranscodeError { code: 7 }.to_string(),
            "engine failed with code 7"
        );
        assert_eq!(
            JobFailure::TranscodeError { code: 0 }.to_string(),
            "engine reported success but the output is missing or empty"
        );
        assert_eq!(JobFailure::EmptySource.to_string(), "source yielded no data");
    }

    #[test]
    fn test_failure_from_ingest_error() {
        let err = IngestError::EmptySource;
        assert_eq!(JobFailure::from(&err), JobFailure::EmptySource);

        let err = IngestError::DestinationWriteFailed {
            path: PathBuf::from("/tmp/input.mp4"),
            error: std::io::Error::other("disk full"),
        };
        assert_eq!(JobFailure::from(&err), JobFailure::DestinationWriteFailed);
    }

    #[test]
    fn test_submit_error_display() {
        let err = SubmitError::AlreadyBusy { state: "transcoding" };
        assert_eq!(err.to_string(), "job is busy (transcoding)");
        assert_eq!(err.kind(), "already_busy");

        let err = SubmitError::from(StorageError::AccessDenied);
        assert_eq!(err.kind(), "storage_unavailable");
        assert_eq!(
            err.to_string(),
            "storage unavailable: Storage access has not been granted"
        );
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&JobState::Staged).unwrap();
        assert_eq!(json, r#"{"name":"staged"}"#);

        let state = JobState::Failed {
            reason: JobFailure::SourceUnreadable,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(
            json,
            r#"{"name":"failed","reason":{"kind":"source_unreadable"}}"#
        );
    }
}
