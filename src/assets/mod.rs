//! Asset resolution layer.
//!
//! Turns request paths into [`FileDescriptor`]s exactly once per path, even
//! under concurrent load.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           StaticFileHandler             │
//! └────────────────────┬────────────────────┘
//!                      │ get(path)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              AssetCache                 │
//! │  (LRU + TTL, singleflight per path)     │
//! └────────────────────┬────────────────────┘
//!                      │ lookup(path) on miss
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             FileResolver                │
//! │  (include/exclude, extensions,          │
//! │   compressed siblings, etag)            │
//! └────────────────────┬────────────────────┘
//!                      │ stat / exists
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              FileSystem                 │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use asset_streamer::assets::{AssetCache, FileResolver, ResolverConfig};
//! use asset_streamer::io::LocalFileSystem;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResolverConfig::new("public").with_compression("gzip", ".gz");
//! let resolver = FileResolver::new(config, Arc::new(LocalFileSystem::new()))?;
//! let cache = AssetCache::new(resolver);
//!
//! let descriptor = cache.get("/index.html").await?;
//! println!("{} ({})", descriptor.file_path.display(), descriptor.content_type);
//! # Ok(())
//! # }
//! ```

mod cache;
mod descriptor;
mod resolver;

pub use cache::{
    normalize_path, AssetCache, AssetLookup, CacheStats, LookupResult, DEFAULT_CACHE_CAPACITY,
    DEFAULT_TIME_TO_LIVE,
};
pub use descriptor::{content_type_for, metadata_etag, sibling_path, FileDescriptor};
pub use resolver::{FileResolver, ResolverConfig, DEFAULT_EXTENSIONS};
