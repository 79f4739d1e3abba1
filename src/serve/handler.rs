//! Per-request static file serving.
//!
//! The handler walks each request through a fixed sequence:
//!
//! 1. Method check (GET and HEAD only)
//! 2. Cache lookup of the request path
//! 3. `Accept-Encoding` negotiation against pre-compressed variants
//! 4. Response assembly: headers, conditional `304`, then an empty body for
//!    HEAD or a streamed file body for GET
//!
//! Failures are returned as [`StaticFileError`] values so that a middleware
//! can hand the request on to the next handler instead.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::response::Response;
use http::header::{
    ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, ETAG,
    IF_NONE_MATCH, VARY,
};
use http::request::Parts;
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use tracing::{debug, warn};

use super::negotiation::negotiate;
use crate::assets::{AssetCache, AssetLookup, FileResolver};
use crate::error::{IoError, RequestHead, ResolveError, StaticFileError};
use crate::io::FileSystem;

/// Methods the handler serves; everything else is `MethodNotSupported`.
pub const SUPPORTED_METHODS: [Method; 2] = [Method::GET, Method::HEAD];

// =============================================================================
// Response Configuration
// =============================================================================

/// Options applied to every successful response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseConfig {
    /// `cache-control: max-age` value
    pub max_age: Option<Duration>,

    /// Mark responses `immutable`
    pub immutable: bool,
}

impl ResponseConfig {
    /// No cache-control header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the max-age.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Enable or disable the `immutable` directive.
    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// The `cache-control` header value, or `None` when nothing is configured.
    pub fn cache_control(&self) -> Option<String> {
        match (self.max_age, self.immutable) {
            (Some(max_age), true) => Some(format!("max-age={}, immutable", max_age.as_secs())),
            (Some(max_age), false) => Some(format!("max-age={}", max_age.as_secs())),
            (None, true) => Some("immutable".to_string()),
            (None, false) => None,
        }
    }
}

// =============================================================================
// StaticFileHandler
// =============================================================================

/// Serves files resolved through an [`AssetCache`].
pub struct StaticFileHandler<L: AssetLookup = FileResolver> {
    cache: AssetCache<L>,
    fs: Arc<dyn FileSystem>,
    config: ResponseConfig,
}

impl<L: AssetLookup> StaticFileHandler<L> {
    /// Create a handler that streams bodies through `fs`.
    pub fn new(cache: AssetCache<L>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            cache,
            fs,
            config: ResponseConfig::default(),
        }
    }

    /// Set the response options.
    pub fn with_response_config(mut self, config: ResponseConfig) -> Self {
        self.config = config;
        self
    }

    /// The underlying cache.
    pub fn cache(&self) -> &AssetCache<L> {
        &self.cache
    }

    /// The response options.
    pub fn response_config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Produce a response for a request head.
    ///
    /// # Arguments
    ///
    /// * `parts` - Method, URI and headers of the request; the body is never read
    ///
    /// # Returns
    ///
    /// The file response (200, or 304 when `If-None-Match` matches), or
    /// `MethodNotSupported` / `FileNotFound`.
    pub async fn handle(&self, parts: &Parts) -> Result<Response, StaticFileError> {
        if !SUPPORTED_METHODS.contains(&parts.method) {
            return Err(StaticFileError::MethodNotSupported {
                request: RequestHead::from_parts(parts),
                methods: SUPPORTED_METHODS.to_vec(),
            });
        }

        let path = parts.uri.path();
        let descriptor = match self.cache.get(path).await {
            Ok(descriptor) => descriptor,
            Err(err) => {
                match &err {
                    ResolveError::Io(_) => {
                        warn!(path = %path, error = %err, "static file unavailable")
                    }
                    _ => debug!(path = %path, error = %err, "no static file"),
                }
                return Err(not_found(parts));
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&descriptor.content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );
        if let Some(value) = descriptor
            .etag
            .as_deref()
            .and_then(|etag| HeaderValue::from_str(etag).ok())
        {
            headers.insert(ETAG, value);
        }
        if let Some(value) = self
            .config
            .cache_control()
            .and_then(|cc| HeaderValue::from_str(&cc).ok())
        {
            headers.insert(CACHE_CONTROL, value);
        }

        let accept_encoding = parts
            .headers
            .get(ACCEPT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let negotiated = negotiate(accept_encoding, &descriptor.compressions).and_then(
            |(encoding, variant)| {
                HeaderValue::from_str(encoding)
                    .ok()
                    .map(|value| (value, variant))
            },
        );

        let body_path: &Path = match negotiated {
            Some((encoding, variant)) => {
                headers.insert(CONTENT_ENCODING, encoding);
                headers.insert(VARY, HeaderValue::from_static("accept-encoding"));
                variant
            }
            None => &descriptor.file_path,
        };

        if let Some(etag) = descriptor.etag.as_deref() {
            if if_none_match(&parts.headers, etag) {
                debug!(path = %path, "static file not modified");
                return Ok(build_response(StatusCode::NOT_MODIFIED, headers, Body::empty()));
            }
        }

        // GET and HEAD both carry the length of the file GET would stream
        if let Some(len) = descriptor.content_length(body_path) {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }

        if parts.method == Method::HEAD {
            return Ok(build_response(StatusCode::OK, headers, Body::empty()));
        }

        let stream = match self.fs.stream(body_path).await {
            Ok(stream) => stream,
            Err(err) => {
                // Removed or unreadable since it was resolved
                match &err {
                    IoError::NotFound(_) => {
                        warn!(path = %path, error = %err, "static file vanished since resolution")
                    }
                    _ => warn!(path = %path, error = %err, "failed to open static file"),
                }
                return Err(not_found(parts));
            }
        };

        Ok(build_response(StatusCode::OK, headers, Body::from_stream(stream)))
    }

    /// Serve `request`, or pass it to `fallback` when no file is served.
    ///
    /// This is the recovery point for [`StaticFileError`]: both variants
    /// fall through, and `fallback` receives the request untouched.
    pub async fn serve_or<B, F, Fut>(&self, request: Request<B>, fallback: F) -> Response
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response>,
    {
        let (parts, body) = request.into_parts();
        match self.handle(&parts).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "static files fall through");
                fallback(Request::from_parts(parts, body)).await
            }
        }
    }
}

fn not_found(parts: &Parts) -> StaticFileError {
    StaticFileError::FileNotFound {
        request: RequestHead::from_parts(parts),
    }
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Whether any `If-None-Match` value matches `etag` (weak comparison).
fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
    let etag = etag.trim_start_matches("W/");
    headers
        .get_all(IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

// =============================================================================
// Tests
// =============================================================================
