//! Test utilities for integration tests.
//!
//! This module provides a temporary site on disk, a file system that counts
//! how often it is touched, and helpers for driving a router.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use asset_streamer::assets::{AssetCache, FileResolver, ResolverConfig};
use asset_streamer::error::IoError;
use asset_streamer::io::{ByteStream, FileStat, FileSystem, LocalFileSystem};
use asset_streamer::serve::{ResponseConfig, StaticFileHandler};

// =============================================================================
// Temporary Site
// =============================================================================

/// A directory tree of assets that is removed when dropped.
///
/// ```text
/// index.html          (+ .gz, .br)
/// about.html
/// style.css           (+ .gz)
/// docs/index.html
/// docs/guide.html     (+ .br)
/// drafts/wip.html
/// ```
pub struct TestSite {
    dir: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let site = Self {
            dir: TempDir::new().unwrap(),
        };
        site.write("index.html", "<h1>home</h1>");
        site.write("index.html.gz", "gzip-home");
        site.write("index.html.br", "brotli-home");
        site.write("about.html", "<h1>about</h1>");
        site.write("style.css", "body { margin: 0 }");
        site.write("style.css.gz", "gzip-style");
        site.write("docs/index.html", "<h1>docs</h1>");
        site.write("docs/guide.html", "<h1>guide</h1>");
        site.write("docs/guide.html.br", "brotli-guide");
        site.write("drafts/wip.html", "<h1>wip</h1>");
        site
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root().join(relative)).unwrap();
    }

    /// Resolver config for this site with gzip and brotli variants.
    pub fn config(&self) -> ResolverConfig {
        ResolverConfig::new(self.root())
            .with_compression("gzip", ".gz")
            .with_compression("br", ".br")
    }
}

// =============================================================================
// Counting File System
// =============================================================================

/// A local file system that counts metadata probes and opened streams.
#[derive(Default)]
pub struct CountingFileSystem {
    inner: LocalFileSystem,
    stats: AtomicUsize,
    streams: AtomicUsize,
}

impl CountingFileSystem {
    pub fn stat_count(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }

    pub fn stream_count(&self) -> usize {
        self.streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSystem for CountingFileSystem {
    async fn stat(&self, path: &Path) -> Result<FileStat, IoError> {
        self.stats.fetch_add(1, Ordering::SeqCst);
        self.inner.stat(path).await
    }

    async fn stream(&self, path: &Path) -> Result<ByteStream, IoError> {
        self.streams.fetch_add(1, Ordering::SeqCst);
        self.inner.stream(path).await
    }
}

// =============================================================================
// Handler Construction
// =============================================================================

/// Everything a test needs to build a router and observe what it did.
pub struct Harness {
    pub handler: StaticFileHandler,
    pub cache: AssetCache<FileResolver>,
    pub fs: Arc<CountingFileSystem>,
}

impl Harness {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_response_config(config, ResponseConfig::new())
    }

    pub fn with_response_config(config: ResolverConfig, response: ResponseConfig) -> Self {
        let fs = Arc::new(CountingFileSystem::default());
        let resolver = FileResolver::new(config, fs.clone()).unwrap();
        let cache = AssetCache::new(resolver);
        let handler = StaticFileHandler::new(cache.clone(), fs.clone())
            .with_response_config(response);

        Self { handler, cache, fs }
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Send a request with the given method and headers through `router`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Body::empty()).unwrap();

    router.clone().oneshot(request).await.unwrap()
}

/// Send a plain GET request.
pub async fn get(router: &Router, uri: &str) -> Response {
    send(router, Method::GET, uri, &[]).await
}

/// Collect a response body into a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
