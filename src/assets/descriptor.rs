use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::io::FileStat;

/// Resolved metadata about a static file.
///
/// Descriptors are immutable once built and are shared between requests
/// through the [`AssetCache`](super::AssetCache).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path to the canonical (uncompressed) file
    pub file_path: PathBuf,

    /// MIME type derived from the file extension
    pub content_type: String,

    /// Pre-compressed variants keyed by `Accept-Encoding` token
    pub compressions: BTreeMap<String, PathBuf>,

    /// Optional opaque validator
    pub etag: Option<String>,

    /// Byte length of the canonical file and of each variant, as seen at
    /// resolution time
    pub lengths: BTreeMap<PathBuf, u64>,
}

impl FileDescriptor {
    /// Create a descriptor with no compressed variants and no etag.
    pub fn new(file_path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            content_type: content_type.into(),
            compressions: BTreeMap::new(),
            etag: None,
            lengths: BTreeMap::new(),
        }
    }

    /// Register a pre-compressed variant.
    pub fn with_compression(
        mut self,
        encoding: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.compressions.insert(encoding.into(), path.into());
        self
    }

    /// Record the byte length of the canonical file or one of its variants.
    pub fn with_length(mut self, path: impl Into<PathBuf>, len: u64) -> Self {
        self.lengths.insert(path.into(), len);
        self
    }

    /// Set the validator.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Path of the variant for `encoding`, if one exists.
    pub fn compression(&self, encoding: &str) -> Option<&Path> {
        self.compressions.get(encoding).map(PathBuf::as_path)
    }

    /// Recorded byte length of `path` (the canonical file or a variant).
    pub fn content_length(&self, path: &Path) -> Option<u64> {
        self.lengths.get(path).copied()
    }
}

/// Content type for a file, looked up from its extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Weak validator derived from file size and modification time.
///
/// No file contents are read, so the value only changes when the file is
/// rewritten. It is weak because every encoding of the file shares it.
pub fn metadata_etag(stat: &FileStat) -> String {
    let modified = stat
        .modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("W/\"{:x}-{:x}\"", stat.len, modified)
}

/// Build the path of a sibling file by appending `suffix` (e.g. `.gz`).
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
