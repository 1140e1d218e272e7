//! Mock transcode engine for testing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::engine::{TranscodeEngine, ENGINE_SUCCESS};

/// Version reported by [`MockEngine`].
pub const MOCK_ENGINE_VERSION: &str = "mock-1.0";

/// A recorded engine invocation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Size of the input when the engine was called, `None` if it was missing.
    pub input_size: Option<u64>,
}

#[derive(Debug)]
struct Behavior {
    exit_code: i32,
    write_output: bool,
    output_bytes: Vec<u8>,
}

/// Mock implementation of the [`TranscodeEngine`] trait.
///
/// By default it writes a small output file and returns success. Clones share
/// state, so a test can keep one handle while the orchestrator owns another.
///
/// # Example
///
/// ```rust,ignore
/// use vidstage_core::testing::MockEngine;
///
/// let engine = MockEngine::new();
/// engine.set_exit_code(7);
///
/// // ... run a job ...
///
/// assert_eq!(engine.invocation_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockEngine {
    behavior: Arc<Mutex<Behavior>>,
    invocations: Arc<Mutex<Vec<RecordedInvocation>>>,
    /// `true` while the engine is held; paired with a condvar for release.
    hold: Arc<(Mutex<bool>, Condvar)>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(Behavior {
                exit_code: ENGINE_SUCCESS,
                write_output: true,
                output_bytes: b"mock transcoded output".to_vec(),
            })),
            invocations: Arc::new(Mutex::new(Vec::new())),
            hold: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Status code returned by subsequent runs.
    pub fn set_exit_code(&self, code: i32) {
        self.behavior().exit_code = code;
    }

    /// Whether subsequent runs write anything to the output path.
    pub fn set_write_output(&self, write: bool) {
        self.behavior().write_output = write;
    }

    /// Bytes written to the output path.
    pub fn set_output_bytes(&self, bytes: Vec<u8>) {
        self.behavior().output_bytes = bytes;
    }

    /// Block subsequent runs until [`release`](Self::release) is called.
    ///
    /// Tests that hold the engine must release it, or the runtime cannot shut
    /// down.
    pub fn hold(&self) {
        let (held, _) = &*self.hold;
        *held.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn release(&self) {
        let (held, cvar) = &*self.hold;
        *held.lock().unwrap_or_else(PoisonError::into_inner) = false;
        cvar.notify_all();
    }

    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn behavior(&self) -> std::sync::MutexGuard<'_, Behavior> {
        self.behavior.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_while_held(&self) {
        let (held, cvar) = &*self.hold;
        let mut guard = held.lock().unwrap_or_else(PoisonError::into_inner);
        while *guard {
            guard = cvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl TranscodeEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn version(&self) -> Option<String> {
        Some(MOCK_ENGINE_VERSION.to_string())
    }

    fn transcode(&self, input: &Path, output: &Path) -> i32 {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedInvocation {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                input_size: std::fs::metadata(input).ok().map(|m| m.len()),
            });

        self.wait_while_held();

        let (exit_code, write_output, output_bytes) = {
            let behavior = self.behavior();
            (
                behavior.exit_code,
                behavior.write_output,
                behavior.output_bytes.clone(),
            )
        };

        if write_output && std::fs::write(output, output_bytes).is_err() {
            return crate::engine::ENGINE_FAILURE;
        }

        exit_code
    }
}
