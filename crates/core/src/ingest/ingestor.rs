//! Chunked copy of a source into the staged slot.

use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

use super::error::IngestError;
use super::traits::{SourceHandle, SourceStream};
use super::types::StagedFile;

/// Smallest accepted copy chunk.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Default copy chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Copies a [`SourceHandle`] into a local destination file.
#[derive(Debug, Clone)]
pub struct SourceIngestor {
    chunk_size: usize,
}

impl Default for SourceIngestor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl SourceIngestor {
    /// Creates an ingestor; chunk sizes below [`MIN_CHUNK_SIZE`] are raised to it.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(MIN_CHUNK_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Streams `handle` into `destination`.
    ///
    /// Succeeds only when the stream reaches EOF and the destination holds at
    /// least one byte. On any failure the destination is removed before the
    /// error is returned.
    pub async fn ingest(
        &self,
        handle: &dyn SourceHandle,
        destination: &Path,
    ) -> Result<StagedFile, IngestError> {
        let source_desc = handle.describe();

        // Nothing is written if the handle cannot be opened.
        let mut stream = handle
            .open()
            .await
            .map_err(|e| IngestError::unreadable(&source_desc, e))?;

        match self.copy(&mut stream, &source_desc, destination).await {
            Ok(staged) => Ok(staged),
            Err(e) => {
                remove_partial(destination).await;
                Err(e)
            }
        }
    }

    async fn copy(
        &self,
        stream: &mut SourceStream,
        source_desc: &str,
        destination: &Path,
    ) -> Result<StagedFile, IngestError> {
        let file = File::create(destination)
            .await
            .map_err(|e| IngestError::write_failed(destination, e))?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);

        let mut buffer = vec![0u8; self.chunk_size];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = stream
                .read(&mut buffer)
                .await
                .map_err(|e| IngestError::unreadable(source_desc, e))?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .await
                .map_err(|e| IngestError::write_failed(destination, e))?;

            total_bytes += bytes_read as u64;
        }

        writer
            .flush()
            .await
            .map_err(|e| IngestError::write_failed(destination, e))?;
        writer
            .into_inner()
            .sync_all()
            .await
            .map_err(|e| IngestError::write_failed(destination, e))?;

        info!(
            "Copied {} bytes from {} -> {:?}",
            total_bytes, source_desc, destination
        );

        let size_bytes = fs::metadata(destination)
            .await
            .map_err(|e| IngestError::write_failed(destination, e))?
            .len();

        if size_bytes == 0 {
            warn!("Staged file {:?} is empty after copy", destination);
            return Err(IngestError::EmptySource);
        }

        Ok(StagedFile {
            path: destination.to_path_buf(),
            size_bytes,
        })
    }
}

/// Removes a partially written destination, tolerating its absence.
/// Removes a partially written staged file, if any.
pub(crate) async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial staged file {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial staged file {:?}: {}", path, e),
    }
}
