//! Job configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ingest::DEFAULT_CHUNK_SIZE;

/// Filesystem layout and ingest parameters for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// File name of the single staged slot inside the temp directory.
    /// Overwritten by every run.
    #[serde(default = "default_staged_file_name")]
    pub staged_file_name: String,

    /// Output file name prefix.
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    /// Output file extension, without the dot.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Ingest copy chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_staged_file_name() -> String {
    "input.mp4".to_string()
}

fn default_output_prefix() -> String {
    "TX_VideoT".to_string()
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            staged_file_name: default_staged_file_name(),
            output_prefix: default_output_prefix(),
            output_extension: default_output_extension(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl JobConfig {
    /// Path of the staged slot inside `temp_dir`.
    pub fn staged_path(&self, temp_dir: &Path) -> PathBuf {
        temp_dir.join(&self.staged_file_name)
    }

    /// Output path for a run stamped with `timestamp_ms`.
    pub fn output_path(&self, output_dir: &Path, timestamp_ms: i64) -> PathBuf {
        output_dir.join(format!(
            "{}_{}.{}",
            self.output_prefix, timestamp_ms, self.output_extension
        ))
    }
}
