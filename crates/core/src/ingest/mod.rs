//! Source ingestion: staging an external input into process-owned storage.
//!
//! A [`SourceHandle`] is whatever the selection mechanism hands us (a local
//! path, a content stream, a test double). [`SourceIngestor`] copies it into
//! the single staged slot in bounded chunks and guarantees that a failed
//! ingest never leaves a partial file behind.

mod error;
mod ingestor;
mod source;
mod traits;
mod types;

pub use error::IngestError;
pub(crate) use ingestor::remove_partial;
pub use ingestor::{SourceIngestor, DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
pub use source::FileSource;
pub use traits::{SourceHandle, SourceStream};
pub use types::StagedFile;
