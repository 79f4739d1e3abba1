//! Bounded, time-limited, single-flight cache of resolved files.
//!
//! The cache maps normalized URL paths to [`FileDescriptor`]s (or to the
//! reason the path does not resolve). It provides:
//! - LRU eviction once `capacity` entries are stored
//! - Time-to-live expiry for positive and negative entries alike
//! - Singleflight: concurrent misses for one path share a single lookup
//!
//! Lookups run on a detached task. A caller that is cancelled while waiting
//! only abandons its own wait; the lookup still completes and is delivered to
//! every other waiter and stored in the cache.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use lru::LruCache;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::descriptor::FileDescriptor;
use crate::error::{IoError, ResolveError};

// =============================================================================
// Configuration
// =============================================================================

/// Default number of cached paths.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Default time-to-live for cached paths (365 days).
///
/// Assets are expected to change on deploy, not while the server runs.
pub const DEFAULT_TIME_TO_LIVE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Result of resolving one path, shared between all waiters.
pub type LookupResult = Result<Arc<FileDescriptor>, ResolveError>;

// =============================================================================
// AssetLookup Trait
// =============================================================================

/// Resolves a normalized URL path to a file descriptor.
///
/// The cache invokes this at most once per path at a time.
#[async_trait]
pub trait AssetLookup: Send + Sync + 'static {
    /// Resolve `path` (always normalized, starting with `/`).
    async fn lookup(&self, path: &str) -> Result<FileDescriptor, ResolveError>;
}

// =============================================================================
// Path Normalization
// =============================================================================

/// Normalize a request path into a cache key.
///
/// Strips any query or fragment, percent-decodes, drops empty and `.`
/// segments and resolves `..` without climbing above the root. The result
/// always starts with `/`, never ends with one (except for the root itself)
/// and normalizing it again yields the same string.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let mut key = String::with_capacity(decoded.len() + 1);
    key.push('/');
    key.push_str(&segments.join("/"));
    key
}

// =============================================================================
// Cache Entries
// =============================================================================

struct CacheEntry {
    value: LookupResult,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, time_to_live: Duration) -> bool {
        self.inserted_at.elapsed() >= time_to_live
    }
}

/// State for an in-flight lookup.
struct InFlightState {
    /// Notification for waiters
    notify: Notify,
    /// Result of the lookup (set before waiters are notified)
    result: Mutex<Option<LookupResult>>,
}

impl InFlightState {
    fn new() -> Self {
        Self {
            notify: Notify::new(),
            result: Mutex::new(None),
        }
    }

    async fn complete(&self, result: LookupResult) {
        *self.result.lock().await = Some(result);
        self.notify.notify_waiters();
    }

    async fn wait(&self) -> LookupResult {
        loop {
            // Register before checking so a completion in between is not missed.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(ref result) = *self.result.lock().await {
                return result.clone();
            }

            notified.await;
        }
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a live entry
    pub hits: u64,
    /// Lookups that found no live entry
    pub misses: u64,
    /// Number of times the underlying lookup ran
    pub resolutions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    resolutions: AtomicU64,
}

// =============================================================================
// AssetCache
// =============================================================================

struct CacheInner<L: AssetLookup> {
    lookup: L,
    entries: Mutex<LruCache<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<InFlightState>>>,
    time_to_live: Duration,
    counters: Counters,
}

/// Single-flight cache in front of an [`AssetLookup`].
///
/// Cloning is cheap; clones share the same entries.
pub struct AssetCache<L: AssetLookup> {
    inner: Arc<CacheInner<L>>,
}

impl<L: AssetLookup> Clone for AssetCache<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: AssetLookup> AssetCache<L> {
    /// Create a cache with the default capacity (10,000) and TTL (365 days).
    pub fn new(lookup: L) -> Self {
        Self::with_capacity(lookup, DEFAULT_CACHE_CAPACITY, DEFAULT_TIME_TO_LIVE)
    }

    /// Create a cache holding at most `capacity` paths for `time_to_live` each.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(lookup: L, capacity: usize, time_to_live: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(CacheInner {
                lookup,
                entries: Mutex::new(LruCache::new(capacity)),
                in_flight: Mutex::new(HashMap::new()),
                time_to_live,
                counters: Counters::default(),
            }),
        }
    }

    /// The wrapped lookup.
    pub fn lookup(&self) -> &L {
        &self.inner.lookup
    }

    /// Get the descriptor for a request path, resolving it on a miss.
    ///
    /// This method:
    /// 1. Normalizes the path
    /// 2. Returns a live cached entry (positive or negative) if present
    /// 3. Otherwise joins the in-flight lookup for the path, starting one if
    ///    none is running
    pub async fn get(&self, path: &str) -> LookupResult {
        let key = normalize_path(path);

        // Fast path: live entry
        if let Some(result) = self.cached(&key).await {
            self.inner.counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!(path = %key, "asset cache hit");
            return result;
        }

        self.inner.counters.misses.fetch_add(1, Ordering::Relaxed);

        let state = {
            let mut in_flight = self.inner.in_flight.lock().await;

            if let Some(state) = in_flight.get(&key) {
                // Another task is resolving this path
                state.clone()
            } else {
                // A lookup may have finished since the fast path; a finished
                // lookup is stored before it leaves `in_flight`.
                if let Some(result) = self.cached(&key).await {
                    return result;
                }

                let state = Arc::new(InFlightState::new());
                in_flight.insert(key.clone(), state.clone());
                self.spawn_lookup(key.clone(), state.clone());
                state
            }
        };

        state.wait().await
    }

    /// Resolve `paths` ahead of the first request.
    ///
    /// Returns how many of them resolved to a file.
    pub async fn preload<I, S>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lookups = paths.into_iter().map(|path| {
            let cache = self.clone();
            let path = path.as_ref().to_string();
            async move { cache.get(&path).await.is_ok() }
        });

        futures::future::join_all(lookups)
            .await
            .into_iter()
            .filter(|found| *found)
            .count()
    }

    /// Remove a path from the cache.
    ///
    /// An in-flight lookup for the path is not affected.
    pub async fn invalidate(&self, path: &str) {
        let key = normalize_path(path);
        self.inner.entries.lock().await.pop(&key);
    }

    /// Remove every cached path.
    pub async fn clear(&self) {
        self.inner.entries.lock().await.clear();
    }

    /// Drop all expired entries, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.inner.entries.lock().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.inner.time_to_live))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    /// Number of stored entries, including not-yet-purged expired ones.
    pub async fn len(&self) -> usize {
        self.inner.entries.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.entries.lock().await.is_empty()
    }

    /// Maximum number of entries.
    pub async fn capacity(&self) -> usize {
        self.inner.entries.lock().await.cap().get()
    }

    /// Configured time-to-live.
    pub fn time_to_live(&self) -> Duration {
        self.inner.time_to_live
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            resolutions: counters.resolutions.load(Ordering::Relaxed),
        }
    }

    /// Return the live entry for `key`, dropping it if expired.
    async fn cached(&self, key: &str) -> Option<LookupResult> {
        let mut entries = self.inner.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(self.inner.time_to_live) => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!(path = %key, "asset cache entry expired");
            entries.pop(key);
        }
        None
    }

    /// Run the lookup for `key` on its own task and publish the result.
    fn spawn_lookup(&self, key: String, state: Arc<InFlightState>) {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            inner.counters.resolutions.fetch_add(1, Ordering::Relaxed);
            debug!(path = %key, "resolving asset");

            let result = match AssertUnwindSafe(inner.lookup.lookup(&key))
                .catch_unwind()
                .await
            {
                Ok(result) => result.map(Arc::new),
                Err(_) => {
                    warn!(path = %key, "asset lookup panicked");
                    Err(ResolveError::Io(IoError::Other {
                        path: key.clone(),
                        message: "lookup panicked".to_string(),
                    }))
                }
            };

            match &result {
                Err(err) if !err.is_cacheable() => {
                    warn!(path = %key, error = %err, "asset lookup failed, not caching");
                }
                _ => {
                    let entry = CacheEntry {
                        value: result.clone(),
                        inserted_at: Instant::now(),
                    };
                    inner.entries.lock().await.put(key.clone(), entry);
                }
            }

            // Leave `in_flight` first so a later miss retries an uncached
            // failure instead of joining this finished lookup.
            inner.in_flight.lock().await.remove(&key);
            state.complete(result).await;
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
