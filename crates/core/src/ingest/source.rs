//! Source handle backed by a local file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::traits::{SourceHandle, SourceStream};

/// A source on the local filesystem. The file is only opened by [`open`].
///
/// [`open`]: SourceHandle::open
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SourceHandle for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn open(&self) -> std::io::Result<SourceStream> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::new(file))
    }
}
