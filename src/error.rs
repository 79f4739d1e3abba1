use std::path::Path;

use http::{HeaderMap, Method, Uri};
use thiserror::Error;

/// I/O errors that can occur when probing or streaming local files
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// File or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The process is not allowed to access the path
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other failure reported by the operating system
    #[error("I/O error on {path}: {message}")]
    Other { path: String, message: String },
}

impl IoError {
    /// Classify a `std::io::Error` raised while accessing `path`.
    pub fn from_io(path: &Path, err: &std::io::Error) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            // A file where a directory was expected (`page.html/index.html`)
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                IoError::NotFound(path)
            }
            std::io::ErrorKind::PermissionDenied => IoError::PermissionDenied(path),
            _ => IoError::Other {
                path,
                message: err.to_string(),
            },
        }
    }

    /// Whether this error means the path is simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IoError::NotFound(_))
    }
}

/// Reasons a URL path does not resolve to a static file
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No candidate file exists on disk
    #[error("No file found for {path}")]
    NotFound { path: String },

    /// The path was rejected by the include/exclude patterns
    #[error("Path {path} is excluded by configuration")]
    Excluded { path: String },

    /// The file extension is not in the allow-list
    #[error("Extension of {path} is not allowed")]
    DisallowedExtension { path: String },

    /// The file system failed for a reason other than absence
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl ResolveError {
    /// Whether this failure may be remembered by the cache.
    ///
    /// Absence and policy rejections are stable until the next deploy;
    /// I/O faults may be transient and are always retried.
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, ResolveError::Io(_))
    }
}

/// Invalid static-file configuration
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// An include or exclude glob failed to compile
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// File extensions must be given with a leading dot
    #[error("Invalid extension '{0}': extensions must start with '.'")]
    InvalidExtension(String),

    /// Encoding tokens must be usable as a `content-encoding` header value
    #[error("Invalid compression encoding '{0}'")]
    InvalidEncoding(String),

    /// The served directory does not exist or is not a directory
    #[error("Directory '{0}' does not exist or is not a directory")]
    MissingDirectory(String),

    /// The cache must hold at least one entry
    #[error("Cache capacity must be greater than 0")]
    ZeroCapacity,

    /// Cached entries must live for a non-zero duration
    #[error("Cache time-to-live must be greater than 0")]
    ZeroTimeToLive,
}

/// The parts of a request kept for diagnostics when static serving fails.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl RequestHead {
    /// Capture the head of an HTTP request.
    pub fn of<B>(request: &http::Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        }
    }

    /// Capture the head of a request that was split into parts.
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
        }
    }
}

/// Failures of the static file handler.
///
/// Neither variant is fatal: the middleware adapter recovers from both by
/// passing the request on to the next handler.
#[derive(Debug, Clone, Error)]
pub enum StaticFileError {
    /// The request used a method other than GET or HEAD
    #[error("Method {} not supported for {}", .request.method, .request.uri)]
    MethodNotSupported {
        request: RequestHead,
        methods: Vec<Method>,
    },

    /// No static file resolves for the request path
    #[error("No static file for {}", .request.uri)]
    FileNotFound { request: RequestHead },
}

impl StaticFileError {
    /// The request that produced this failure.
    pub fn request(&self) -> &RequestHead {
        match self {
            StaticFileError::MethodNotSupported { request, .. } => request,
            StaticFileError::FileNotFound { request } => request,
        }
    }
}
