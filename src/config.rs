//! Configuration management for Asset Streamer.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `ASSET_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use asset_streamer::config::{Cli, Command};
//! use clap::Parser;
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Serving {}", config.files.dir.display()),
//!     Command::Check(config) => println!("Checking {} path(s)", config.paths.len()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `ASSET_DIR` - Directory to serve (required)
//! - `ASSET_INCLUDE` / `ASSET_EXCLUDE` - Comma-separated glob patterns
//! - `ASSET_EXTENSIONS` - Comma-separated allowed extensions (default: .html)
//! - `ASSET_COMPRESSIONS` - Comma-separated `token=.ext` pairs (e.g. gzip=.gz)
//! - `ASSET_HOST` - Server bind address (default: 0.0.0.0)
//! - `ASSET_PORT` - Server port (default: 3000)
//! - `ASSET_CACHE_CAPACITY` - Max cached paths (default: 10000)
//! - `ASSET_CACHE_TTL` - Seconds a cached path stays valid (default: 365 days)
//! - `ASSET_MAX_AGE` - `cache-control: max-age` in seconds (default: unset)
//! - `ASSET_CORS_ORIGINS` - Comma-separated allowed origins (default: any)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::assets::{ResolverConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_TIME_TO_LIVE};
use crate::error::ConfigError;
use crate::serve::ResponseConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default cache time-to-live in seconds (365 days).
pub const DEFAULT_CACHE_TTL_SECS: u64 = DEFAULT_TIME_TO_LIVE.as_secs();

// =============================================================================
// CLI Arguments
// =============================================================================

/// Asset Streamer - Static file middleware and server.
///
/// Serves files from a local directory with pre-compressed variants,
/// conditional requests and a single-flight resolution cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "asset-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Consume the parsed arguments, returning the selected command.
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeConfig),

    /// Resolve URL paths against a directory and report the result
    Check(CheckConfig),
}

/// Options shared by every command that resolves files.
#[derive(Args, Debug, Clone)]
pub struct FilesArgs {
    /// Directory to serve files from.
    #[arg(long, env = "ASSET_DIR")]
    pub dir: PathBuf,

    /// Only serve files matching one of these globs (comma-separated).
    ///
    /// Patterns are matched against the path relative to `--dir`,
    /// e.g. `docs/**/*.html`.
    #[arg(long, env = "ASSET_INCLUDE", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Never serve files matching these globs (comma-separated).
    ///
    /// Takes precedence over `--include`.
    #[arg(long, env = "ASSET_EXCLUDE", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Allowed file extensions, with leading dot (comma-separated).
    #[arg(
        long,
        env = "ASSET_EXTENSIONS",
        value_delimiter = ',',
        default_value = ".html"
    )]
    pub extensions: Vec<String>,

    /// Pre-compressed variant as `TOKEN=.EXT`, e.g. `gzip=.gz` (repeatable).
    #[arg(
        long = "compression",
        value_name = "TOKEN=.EXT",
        env = "ASSET_COMPRESSIONS",
        value_delimiter = ',',
        value_parser = parse_compression
    )]
    pub compressions: Vec<(String, String)>,

    /// Do not send etags (and never answer 304).
    #[arg(long, default_value_t = false)]
    pub no_etag: bool,
}

impl FilesArgs {
    /// Validate the options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.dir.is_dir() {
            let dir = self.dir.display().to_string();
            return Err(ConfigError::MissingDirectory(dir).to_string());
        }

        if self.extensions.is_empty() {
            return Err("At least one extension is required. Set --extensions".to_string());
        }

        Ok(())
    }

    /// Build the resolver configuration.
    pub fn resolver_config(&self) -> ResolverConfig {
        self.compressions.iter().fold(
            ResolverConfig::new(&self.dir)
                .with_include(self.include.iter().cloned())
                .with_exclude(self.exclude.iter().cloned())
                .with_extensions(self.extensions.iter().cloned())
                .with_etag(!self.no_etag),
            |config, (encoding, suffix)| config.with_compression(encoding, suffix),
        )
    }
}

/// Parse a `TOKEN=.EXT` compression mapping.
fn parse_compression(value: &str) -> Result<(String, String), String> {
    let (token, suffix) = value
        .split_once('=')
        .ok_or_else(|| format!("expected TOKEN=.EXT, got '{value}'"))?;

    let token = token.trim();
    let suffix = suffix.trim();
    if token.is_empty() {
        return Err(format!("missing encoding token in '{value}'"));
    }
    if !suffix.starts_with('.') || suffix.len() < 2 {
        return Err(format!("file extension must start with '.', got '{suffix}'"));
    }

    Ok((token.to_string(), suffix.to_string()))
}

// =============================================================================
// Serve Command
// =============================================================================

/// Configuration for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "ASSET_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "ASSET_PORT")]
    pub port: u16,

    // =========================================================================
    // Files Configuration
    // =========================================================================
    #[command(flatten)]
    pub files: FilesArgs,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Maximum number of resolved paths to keep in cache.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY, env = "ASSET_CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Seconds a resolved path (or a miss) stays cached.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS, env = "ASSET_CACHE_TTL")]
    pub cache_ttl: u64,

    /// Resolve every servable file in the directory before accepting requests.
    #[arg(long, default_value_t = false)]
    pub preload: bool,

    // =========================================================================
    // Response Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, env = "ASSET_MAX_AGE")]
    pub max_age: Option<u64>,

    /// Add the `immutable` Cache-Control directive.
    #[arg(long, default_value_t = false)]
    pub immutable: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "ASSET_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.files.validate()?;

        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCapacity.to_string());
        }
        if self.cache_ttl == 0 {
            return Err(ConfigError::ZeroTimeToLive.to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Cache time-to-live.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Response options from `--max-age` and `--immutable`.
    pub fn response_config(&self) -> ResponseConfig {
        let config = ResponseConfig::new().with_immutable(self.immutable);
        match self.max_age {
            Some(seconds) => config.with_max_age(Duration::from_secs(seconds)),
            None => config,
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

/// Configuration for the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub files: FilesArgs,

    /// URL paths to resolve, e.g. `/` or `/docs/intro`.
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.files.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
