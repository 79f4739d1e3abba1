//! Asset Streamer - A static file server.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use asset_streamer::{
    assets::{AssetCache, FileResolver},
    config::{CheckConfig, Cli, Command, FilesArgs, ServeConfig},
    io::{FileSystem, LocalFileSystem},
    serve::StaticFileHandler,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
    let resolver = match build_resolver(&config.files, fs.clone()) {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Asset Streamer v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Directory: {}", resolver.root().display());
    info!("  Extensions: {}", config.files.extensions.join(", "));
    if !config.files.include.is_empty() {
        info!("  Include: {}", config.files.include.join(", "));
    }
    if !config.files.exclude.is_empty() {
        info!("  Exclude: {}", config.files.exclude.join(", "));
    }
    for (encoding, suffix) in &config.files.compressions {
        info!("  Compression: {} -> *{}", encoding, suffix);
    }
    if config.files.no_etag {
        warn!("  ETags: disabled - clients cannot revalidate");
    }
    info!(
        "  Cache: {} paths, {}s time-to-live",
        config.cache_capacity, config.cache_ttl
    );

    let paths = config
        .preload
        .then(|| collect_servable_paths(&resolver))
        .unwrap_or_default();

    let cache = AssetCache::with_capacity(resolver, config.cache_capacity, config.cache_ttl());

    if config.preload {
        info!("");
        info!("Preloading {} file(s)...", paths.len());
        let found = cache.preload(&paths).await;
        info!("  Resolved {} of {} file(s)", found, paths.len());
    }

    let handler =
        StaticFileHandler::new(cache, fs).with_response_config(config.response_config());
    let router = create_router(handler, build_router_config(&config));

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl -I http://{}/", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "asset_streamer=debug,tower_http=debug"
    } else {
        "asset_streamer=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config.with_tracing(!config.no_tracing)
}

fn build_resolver(files: &FilesArgs, fs: Arc<dyn FileSystem>) -> Result<FileResolver, String> {
    FileResolver::new(files.resolver_config(), fs).map_err(|e| e.to_string())
}

/// URL paths of every file under the root that passes the resolver's filters.
fn collect_servable_paths(resolver: &FileResolver) -> Vec<String> {
    WalkDir::new(resolver.root())
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(resolver.root()).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_str())
                .collect::<Option<Vec<_>>>()?
                .join("/");
            resolver
                .check_allowed(&relative)
                .is_ok()
                .then(|| format!("/{relative}"))
        })
        .collect()
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    // Initialize minimal logging for check command
    if config.verbose {
        init_logging(true);
    }

    println!("Asset Streamer Configuration Check");
    println!("══════════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ Directory: {}", e);
        return ExitCode::FAILURE;
    }

    let resolver = match build_resolver(&config.files, Arc::new(LocalFileSystem::new())) {
        Ok(resolver) => {
            println!("✓ Directory: {}", resolver.root().display());
            resolver
        }
        Err(e) => {
            println!("✗ Configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("✓ Extensions: {}", config.files.extensions.join(", "));
    println!();

    let mut failures = 0;
    for path in &config.paths {
        match resolver.resolve(path).await {
            Ok(descriptor) => {
                println!("✓ {}", path);
                println!("  File: {}", descriptor.file_path.display());
                println!("  Content-Type: {}", descriptor.content_type);
                if let Some(len) = descriptor.content_length(&descriptor.file_path) {
                    println!("  Size: {} bytes", len);
                }
                if let Some(ref etag) = descriptor.etag {
                    println!("  ETag: {}", etag);
                }
                for (encoding, variant) in &descriptor.compressions {
                    println!("  Variant ({}): {}", encoding, variant.display());
                }
            }
            Err(e) => {
                failures += 1;
                println!("✗ {}", path);
                println!("  {}", e);
            }
        }
    }

    println!();
    println!("══════════════════════════════════");
    if failures == 0 {
        println!("✓ All {} path(s) resolved!", config.paths.len());
        ExitCode::SUCCESS
    } else {
        println!("✗ {} of {} path(s) failed", failures, config.paths.len());
        ExitCode::FAILURE
    }
}
