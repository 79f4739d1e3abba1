//! Router configuration for Asset Streamer.
//!
//! The static file middleware sits in front of every route, so a request is
//! answered from disk when a file resolves and reaches the application
//! routes otherwise.
//!
//! # Route Structure
//!
//! ```text
//! <static files>    - Any GET/HEAD path that resolves to a file
//! /health           - Health check
//! <fallback>        - JSON 404
//! ```
//!
//! # Example
//!
//! ```ignore
//! use asset_streamer::assets::{AssetCache, FileResolver, ResolverConfig};
//! use asset_streamer::server::routes::{create_router, RouterConfig};
//! use asset_streamer::serve::StaticFileHandler;
//!
//! let fs = Arc::new(LocalFileSystem::new());
//! let resolver = FileResolver::new(ResolverConfig::new("public"), fs.clone())?;
//! let handler = StaticFileHandler::new(AssetCache::new(resolver), fs);
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(handler, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, ETAG, IF_NONE_MATCH};
use http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, not_found_handler};
use super::middleware::static_files_middleware;
use crate::assets::AssetLookup;
use crate::serve::StaticFileHandler;

// =============================================================================
// Router Configuration
// =============================================================================

/// Layers wrapped around the static files and application routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Origins allowed to read responses cross-origin; `None` allows any
    pub cors_origins: Option<Vec<String>>,

    /// Wrap the router in `TraceLayer`
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Any origin, tracing on.
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Restrict CORS to `origins`. An empty list disables CORS headers.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Serve static files with `/health` and a JSON 404 behind them.
///
/// CORS applies to every response; tracing is optional.
pub fn create_router<L>(handler: StaticFileHandler<L>, config: RouterConfig) -> Router
where
    L: AssetLookup,
{
    let routes = Router::new()
        .route("/health", get(health_handler))
        .fallback(not_found_handler);

    let router = with_static_files(routes, handler).layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Put static file serving in front of an existing router.
///
/// Requests that do not resolve to a file, or that use a method other than
/// GET/HEAD, reach `router` unchanged. Add routes and fallbacks to `router`
/// before calling this; later additions bypass the static files.
pub fn with_static_files<L: AssetLookup>(router: Router, handler: StaticFileHandler<L>) -> Router {
    router.layer(middleware::from_fn_with_state(
        Arc::new(handler),
        static_files_middleware::<L>,
    ))
}

/// Read-only CORS: GET and HEAD, revalidation and encoding headers.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([ACCEPT_ENCODING, IF_NONE_MATCH])
        .expose_headers([ETAG, CONTENT_ENCODING])
        .max_age(Duration::from_secs(24 * 60 * 60));

    let Some(origins) = &config.cors_origins else {
        return layer.allow_origin(Any);
    };
    if origins.is_empty() {
        return layer;
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(origins)
}

// =============================================================================
// Tests
// =============================================================================
