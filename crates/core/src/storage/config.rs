//! Configuration for the storage gate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where staged inputs and engine outputs live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Process-owned directory holding the staged input slot.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Directory receiving transcoded outputs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Initial value of the storage access signal.
    #[serde(default = "default_access_granted")]
    pub access_granted: bool,
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("vidstage")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("Tx_video")
}

fn default_access_granted() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
            access_granted: default_access_granted(),
        }
    }
}

impl StorageConfig {
    /// Creates a config with explicit directories.
    pub fn with_dirs(temp_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            temp_dir,
            output_dir,
            ..Default::default()
        }
    }
}
