//! Trait definitions for the ingest module.

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Byte stream produced by an opened source.
pub type SourceStream = Box<dyn AsyncRead + Send + Unpin>;

/// An externally selected input that can be opened for reading on demand.
#[async_trait]
pub trait SourceHandle: Send + Sync {
    /// Human readable description for logs and status events.
    fn describe(&self) -> String;

    /// Opens the source for a single sequential read.
    async fn open(&self) -> std::io::Result<SourceStream>;
}
