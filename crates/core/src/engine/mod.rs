//! Transcode engine boundary.
//!
//! The engine is opaque: it receives an input path and an output path and
//! returns an integer status, `0` for success. Anything satisfying
//! [`TranscodeEngine`] (in-process library, subprocess, remote call) can be
//! plugged into the orchestrator.
//!
//! [`TranscodeInvoker`] moves the blocking engine call onto the blocking
//! thread pool and adds no other semantics.

mod config;
mod ffmpeg;
mod invoker;
mod traits;

pub use config::EngineConfig;
pub use ffmpeg::FfmpegEngine;
pub use invoker::TranscodeInvoker;
pub use traits::{TranscodeEngine, ENGINE_FAILURE, ENGINE_SUCCESS};
