//! Status event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::orchestrator::JobState;

/// One published state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Job the transition belongs to.
    pub job_id: String,
    /// How many times the job had been armed when this was published.
    pub run: u64,
    /// Strictly increasing per orchestrator, starting at 1.
    pub sequence: u64,
    /// When the transition happened.
    pub at: DateTime<Utc>,
    /// State entered.
    pub state: JobState,
    /// Details of the transition.
    pub detail: StatusDetail,
}

/// Transition details, one variant per kind of transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusDetail {
    /// A selection was accepted and ingest started.
    Selection { source: String, output_path: PathBuf },
    /// The source was staged.
    Staged { path: PathBuf, size_bytes: u64 },
    /// The engine was started.
    Transcoding {
        input_path: PathBuf,
        output_path: PathBuf,
    },
    /// The engine succeeded and the staged file was removed.
    Completed {
        output_path: PathBuf,
        output_size_bytes: u64,
        reclaimed_bytes: u64,
    },
    /// The job failed.
    Failure {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reclaimed_bytes: Option<u64>,
    },
}

impl StatusEvent {
    /// Whether this event ends the current run.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
