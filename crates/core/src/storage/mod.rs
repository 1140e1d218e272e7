//! Storage gate: resolves the process-owned directories a job works in.
//!
//! The gate is the boundary to the host's storage and permission model. The
//! orchestrator only consumes the two directories it returns:
//!
//! - a temp directory holding the single staged input slot
//! - an output directory receiving engine output
//!
//! Access is gated by an [`AccessGrant`], which the embedding process flips
//! when its permission subsystem reports a decision.

mod config;
mod error;
mod fs_gate;
mod traits;
mod types;

pub use config::StorageConfig;
pub use error::StorageError;
pub use fs_gate::FsStorageGate;
pub use traits::StorageGate;
pub use types::{AccessGrant, StorageDirs};
