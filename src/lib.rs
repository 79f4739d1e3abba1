//! # Asset Streamer
//!
//! Static file middleware for axum with content negotiation, conditional
//! requests and a bounded, single-flight resolution cache.
//!
//! ## Features
//!
//! - **Pre-compressed variants**: serves `index.html.gz` / `index.html.br`
//!   siblings when the client's `Accept-Encoding` allows it
//! - **Single-flight cache**: concurrent requests for one path share a single
//!   file-system lookup; hits and misses are cached with LRU eviction and a TTL
//! - **Filtering**: include/exclude globs and an extension allow-list
//! - **Fallthrough**: anything that is not a servable file continues to the
//!   application's own routes
//!
//! ## Architecture
//!
//! - [`io`] - File-system trait and local disk implementation
//! - [`assets`] - File descriptors, path resolution and the asset cache
//! - [`serve`] - Content negotiation and the static file handler
//! - [`server`] - Axum middleware, router and JSON handlers
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use asset_streamer::{
//!     create_router, AssetCache, FileResolver, LocalFileSystem, ResolverConfig, RouterConfig,
//!     StaticFileHandler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fs = Arc::new(LocalFileSystem::new());
//!     let config = ResolverConfig::new("public").with_compression("gzip", ".gz");
//!     let resolver = FileResolver::new(config, fs.clone())?;
//!     let handler = StaticFileHandler::new(AssetCache::new(resolver), fs);
//!
//!     let router = create_router(handler, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod io;
pub mod serve;
pub mod server;

// Re-export commonly used types
pub use assets::{
    normalize_path, AssetCache, AssetLookup, CacheStats, FileDescriptor, FileResolver,
    ResolverConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_EXTENSIONS, DEFAULT_TIME_TO_LIVE,
};
pub use config::{CheckConfig, Cli, Command, FilesArgs, ServeConfig};
pub use error::{ConfigError, IoError, RequestHead, ResolveError, StaticFileError};
pub use io::{FileStat, FileSystem, LocalFileSystem};
pub use serve::{negotiate, parse_accept_encoding, ResponseConfig, StaticFileHandler};
pub use server::{
    create_router, health_handler, not_found_handler, static_files_middleware, with_static_files,
    ErrorResponse, HealthResponse, RouterConfig,
};
