use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use super::{ByteStream, FileStat, FileSystem};
use crate::error::IoError;

/// Chunk size used when streaming files to clients.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// [`FileSystem`] backed by the local disk through `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    chunk_size: usize,
}

impl LocalFileSystem {
    /// Create a local file system with the default chunk size (64 KiB).
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a local file system that streams in chunks of `chunk_size` bytes.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }
}

impl Default for LocalFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn stat(&self, path: &Path) -> Result<FileStat, IoError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| IoError::from_io(path, &e))?;

        Ok(FileStat {
            len: metadata.len(),
            modified: metadata.modified().ok(),
            is_file: metadata.is_file(),
        })
    }

    async fn stream(&self, path: &Path) -> Result<ByteStream, IoError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| IoError::from_io(path, &e))?;

        Ok(ReaderStream::with_capacity(file, self.chunk_size).boxed())
    }
}
