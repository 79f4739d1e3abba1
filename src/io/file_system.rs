use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::IoError;

/// A lazily produced stream of file bytes.
///
/// Dropping the stream releases the underlying file handle.
pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// Metadata returned by [`FileSystem::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes
    pub len: u64,

    /// Last modification time, if the platform reports one
    pub modified: Option<SystemTime>,

    /// Whether the path is a regular file (directories are never served)
    pub is_file: bool,
}

/// Read-only view of the file system used to resolve and stream assets.
///
/// Resolution only ever calls [`stat`](FileSystem::stat) and
/// [`exists`](FileSystem::exists); file contents are opened by
/// [`stream`](FileSystem::stream) when a GET response body is produced.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Fetch metadata for `path`.
    ///
    /// Returns `IoError::NotFound` when nothing exists at the path.
    async fn stat(&self, path: &Path) -> Result<FileStat, IoError>;

    /// Check whether a regular file exists at `path`.
    async fn exists(&self, path: &Path) -> Result<bool, IoError> {
        match self.stat(path).await {
            Ok(stat) => Ok(stat.is_file),
            Err(IoError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Open `path` and return its contents as a byte stream.
    async fn stream(&self, path: &Path) -> Result<ByteStream, IoError>;
}
