//! Runs an engine off the caller's thread.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::error;

use super::traits::{TranscodeEngine, ENGINE_FAILURE};

/// Wraps a [`TranscodeEngine`] for use from async code.
#[derive(Clone)]
pub struct TranscodeInvoker {
    engine: Arc<dyn TranscodeEngine>,
}

impl TranscodeInvoker {
    pub fn new(engine: Arc<dyn TranscodeEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Engine version, queried on the blocking pool.
    pub async fn engine_version(&self) -> Option<String> {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || engine.version())
            .await
            .unwrap_or_else(|e| {
                error!("Engine {} version query aborted: {}", self.engine.name(), e);
                None
            })
    }

    /// Invokes the engine on the blocking pool and returns its status.
    ///
    /// A panicking engine is reported as [`ENGINE_FAILURE`].
    pub async fn invoke(&self, input: &Path, output: &Path) -> i32 {
        let engine = Arc::clone(&self.engine);
        let input: PathBuf = input.to_path_buf();
        let output: PathBuf = output.to_path_buf();

        match tokio::task::spawn_blocking(move || engine.transcode(&input, &output)).await {
            Ok(code) => code,
            Err(e) => {
                error!("Engine {} aborted: {}", self.engine.name(), e);
                ENGINE_FAILURE
            }
        }
    }
}
