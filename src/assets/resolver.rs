//! Maps URL paths to files inside a served directory.
//!
//! For a normalized path `/p` the resolver tries, in order:
//! - `p` itself
//! - `p<ext>` for each allowed extension (`/about` -> `about.html`)
//! - `p/index<ext>` for each allowed extension (`/` -> `index.html`)
//!
//! Every candidate must pass the include patterns, then the exclude
//! patterns, then the extension allow-list before the file system is probed.
//! Only metadata is read; contents are streamed later by the handler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use http::HeaderValue;
use tracing::debug;

use super::cache::{normalize_path, AssetLookup};
use super::descriptor::{content_type_for, metadata_etag, sibling_path, FileDescriptor};
use crate::error::{ConfigError, ResolveError};
use crate::io::{FileStat, FileSystem};

/// Extensions served when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".html"];

const INDEX_FILE_STEM: &str = "index";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

// =============================================================================
// Configuration
// =============================================================================

/// Which files in a directory may be served, and how they are described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Root directory to serve from
    pub directory: PathBuf,

    /// Glob patterns a file must match (any of) when non-empty
    pub include: Vec<String>,

    /// Glob patterns that reject a file (takes precedence over `include`)
    pub exclude: Vec<String>,

    /// Allowed file extensions, with leading dot
    pub extensions: Vec<String>,

    /// `Accept-Encoding` token to file suffix, e.g. `gzip` -> `.gz`
    pub compressions: BTreeMap<String, String>,

    /// Whether descriptors carry an etag
    pub etag: bool,
}

impl ResolverConfig {
    /// Serve `.html` files from `directory` with etags enabled.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            compressions: BTreeMap::new(),
            etag: true,
        }
    }

    /// Set the include patterns.
    pub fn with_include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the exclude patterns.
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the allowed extensions.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Register a pre-compressed variant suffix for an encoding.
    pub fn with_compression(
        mut self,
        encoding: impl Into<String>,
        suffix: impl Into<String>,
    ) -> Self {
        self.compressions.insert(encoding.into(), suffix.into());
        self
    }

    /// Enable or disable etags.
    pub fn with_etag(mut self, enabled: bool) -> Self {
        self.etag = enabled;
        self
    }
}

// =============================================================================
// FileResolver
// =============================================================================

/// Resolves URL paths to [`FileDescriptor`]s under one directory.
pub struct FileResolver {
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    extensions: Vec<String>,
    compressions: BTreeMap<String, String>,
    etag: bool,
    fs: Arc<dyn FileSystem>,
}

impl FileResolver {
    /// Compile `config` into a resolver reading through `fs`.
    pub fn new(config: ResolverConfig, fs: Arc<dyn FileSystem>) -> Result<Self, ConfigError> {
        let include = compile_patterns(&config.include)?;
        let exclude = compile_patterns(&config.exclude)?;

        let mut extensions = Vec::with_capacity(config.extensions.len());
        for ext in &config.extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::InvalidExtension(ext.clone()));
            }
            extensions.push(ext.to_ascii_lowercase());
        }

        for (encoding, suffix) in &config.compressions {
            if encoding.is_empty() || HeaderValue::from_str(encoding).is_err() {
                return Err(ConfigError::InvalidEncoding(encoding.clone()));
            }
            if !suffix.starts_with('.') || suffix.len() < 2 {
                return Err(ConfigError::InvalidExtension(suffix.clone()));
            }
        }

        let root = if config.directory.is_absolute() {
            config.directory
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&config.directory))
                .unwrap_or(config.directory)
        };

        Ok(Self {
            root,
            include,
            exclude,
            extensions,
            compressions: config.compressions,
            etag: config.etag,
            fs,
        })
    }

    /// The directory files are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a root-relative file path (e.g. `docs/index.html`) against the
    /// include patterns, exclude patterns and extension allow-list.
    pub fn check_allowed(&self, relative: &str) -> Result<(), ResolveError> {
        if !self.include.is_empty()
            && !self
                .include
                .iter()
                .any(|p| p.matches_with(relative, MATCH_OPTIONS))
        {
            return Err(ResolveError::Excluded {
                path: relative.to_string(),
            });
        }

        if self
            .exclude
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS))
        {
            return Err(ResolveError::Excluded {
                path: relative.to_string(),
            });
        }

        let allowed = Path::new(relative)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = format!(".{}", ext.to_ascii_lowercase());
                self.extensions.contains(&ext)
            })
            .unwrap_or(false);

        if !allowed {
            return Err(ResolveError::DisallowedExtension {
                path: relative.to_string(),
            });
        }

        Ok(())
    }

    /// Resolve a URL path. The path is normalized first, so `..` segments
    /// can never leave the root directory.
    pub async fn resolve(&self, path: &str) -> Result<FileDescriptor, ResolveError> {
        let path = normalize_path(path);
        let relative = path.trim_start_matches('/');
        if relative.contains('\0') {
            return Err(ResolveError::NotFound { path });
        }

        let mut rejected = Vec::new();

        for candidate in self.candidates(relative) {
            if let Err(err) = self.check_allowed(&candidate) {
                rejected.push((candidate, err));
                continue;
            }

            let file_path = self.root.join(&candidate);
            match self.fs.stat(&file_path).await {
                Ok(stat) if stat.is_file => {
                    debug!(path = %path, file = %file_path.display(), "resolved asset");
                    return self.describe(file_path, &stat).await;
                }
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(ResolveError::Io(err)),
            }
        }

        // Nothing servable. Report the filter that hid an existing file, if any.
        for (candidate, err) in rejected {
            if self.fs.exists(&self.root.join(&candidate)).await? {
                return Err(err);
            }
        }

        Err(ResolveError::NotFound { path })
    }

    /// Build the descriptor for a resolved file and its variants.
    async fn describe(
        &self,
        file_path: PathBuf,
        stat: &FileStat,
    ) -> Result<FileDescriptor, ResolveError> {
        let mut descriptor = FileDescriptor::new(&file_path, content_type_for(&file_path))
            .with_length(&file_path, stat.len);
        if self.etag {
            descriptor = descriptor.with_etag(metadata_etag(stat));
        }

        for (encoding, suffix) in &self.compressions {
            let variant = sibling_path(&file_path, suffix);
            match self.fs.stat(&variant).await {
                Ok(stat) if stat.is_file => {
                    descriptor = descriptor
                        .with_length(&variant, stat.len)
                        .with_compression(encoding.clone(), variant);
                }
                Ok(_) => {}
                Err(err) if err.is_not_found() => {}
                Err(err) => return Err(ResolveError::Io(err)),
            }
        }

        Ok(descriptor)
    }

    /// Candidate root-relative file paths for a request path.
    fn candidates(&self, relative: &str) -> Vec<String> {
        let mut candidates = Vec::with_capacity(1 + self.extensions.len() * 2);

        if !relative.is_empty() {
            candidates.push(relative.to_string());
            for ext in &self.extensions {
                candidates.push(format!("{relative}{ext}"));
            }
        }

        for ext in &self.extensions {
            if relative.is_empty() {
                candidates.push(format!("{INDEX_FILE_STEM}{ext}"));
            } else {
                candidates.push(format!("{relative}/{INDEX_FILE_STEM}{ext}"));
            }
        }

        candidates
    }
}

#[async_trait]
impl AssetLookup for FileResolver {
    async fn lookup(&self, path: &str) -> Result<FileDescriptor, ResolveError> {
        self.resolve(path).await
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
