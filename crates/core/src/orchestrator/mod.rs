//! Job orchestrator for single-item transcodes.
//!
//! The orchestrator owns one [`Job`](JobSnapshot) and drives it through:
//! - **Ingest**: stage the selected source into the temp slot (background task)
//! - **Transcode**: run the engine on the staged file (blocking pool)
//! - **Cleanup**: delete the staged file before publishing the outcome
//!
//! Overlapping work is rejected at submission time, never queued.

mod config;
mod runner;
mod types;

pub use config::JobConfig;
pub use runner::JobOrchestrator;
pub use types::{JobFailure, JobSnapshot, JobState, SubmitError};
