//! Cache behavior tests through the full request path.
//!
//! Tests verify:
//! - Concurrent requests for one path resolve it once
//! - Repeat requests skip the file system
//! - Negative entries stick until invalidated
//! - Filtered files are cached as negative entries
//! - Files removed after resolution fall through
//! - Preloading

use axum::http::{Method, StatusCode};
use futures::future::join_all;

use asset_streamer::server::{create_router, RouterConfig};

use super::test_utils::{body_string, get, send, Harness, TestSite};

#[tokio::test]
async fn test_concurrent_requests_resolve_once() {
    let site = TestSite::new();
    let Harness { handler, cache, fs } = Harness::new(site.config());
    let router = create_router(handler, RouterConfig::new().with_tracing(false));

    let requests = (0..32).map(|_| {
        let router = router.clone();
        tokio::spawn(async move { body_string(get(&router, "/docs/guide").await).await })
    });

    for result in join_all(requests).await {
        assert_eq!(result.unwrap(), "<h1>guide</h1>");
    }

    assert_eq!(cache.stats().resolutions, 1);
    assert_eq!(fs.stream_count(), 32);
}

#[tokio::test]
async fn test_repeat_requests_skip_file_system() {
    let site = TestSite::new();
    let Harness { handler, cache, fs } = Harness::new(site.config());
    let router = create_router(handler, RouterConfig::new().with_tracing(false));

    let response = send(&router, Method::HEAD, "/about", &[]).await;
    assert_eq!(response.status(), StatusCode::OK);
    let probes = fs.stat_count();
    assert!(probes > 0);

    for _ in 0..5 {
        let response = send(&router, Method::HEAD, "/about", &[]).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(fs.stat_count(), probes);
    let stats = cache.stats();
    assert_eq!(stats.resolutions, 1);
    assert_eq!(stats.hits, 5);
}

#[tokio::test]
async fn test_negative_entry_until_invalidated() {
    let site = TestSite::new();
    let Harness { handler, cache, .. } = Harness::new(site.config());
    let router = create_router(handler, RouterConfig::new().with_tracing(false));

    assert_eq!(get(&router, "/new.html").await.status(), StatusCode::NOT_FOUND);

    site.write("new.html", "<h1>new</h1>");
    assert_eq!(get(&router, "/new.html").await.status(), StatusCode::NOT_FOUND);

    cache.invalidate("/new.html").await;
    let response = get(&router, "/new.html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>new</h1>");
}

#[tokio::test]
async fn test_filtered_files_are_negative_cached() {
    let site = TestSite::new();
    let Harness { handler, cache, fs } = Harness::new(site.config().with_exclude(["drafts/**"]));
    let router = create_router(handler, RouterConfig::new().with_tracing(false));

    // Both files exist; one has a disallowed extension, one is excluded
    for path in ["/style.css", "/drafts/wip.html"] {
        assert_eq!(get(&router, path).await.status(), StatusCode::NOT_FOUND);
    }
    let probes = fs.stat_count();

    for path in ["/style.css", "/drafts/wip.html"] {
        assert_eq!(get(&router, path).await.status(), StatusCode::NOT_FOUND);
    }

    assert_eq!(fs.stat_count(), probes);
    let stats = cache.stats();
    assert_eq!(stats.resolutions, 2);
    assert_eq!(stats.hits, 2);
}

#[tokio::test]
async fn test_file_removed_after_resolution() {
    let site = TestSite::new();
    let Harness { handler, cache, .. } = Harness::new(site.config());
    let router = create_router(handler, RouterConfig::new().with_tracing(false));

    assert_eq!(get(&router, "/about.html").await.status(), StatusCode::OK);
    site.remove("about.html");

    // The descriptor is still cached, but there is nothing left to stream
    let response = get(&router, "/about.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cache.clear().await;
    let response = send(&router, Method::HEAD, "/about.html", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_preload_warms_cache() {
    let site = TestSite::new();
    let Harness { handler, cache, fs } = Harness::new(site.config());

    let found = cache
        .preload(["/", "/about", "/docs/guide", "/missing"])
        .await;
    assert_eq!(found, 3);
    assert_eq!(cache.len().await, 4);

    let probes = fs.stat_count();
    let router = create_router(handler, RouterConfig::new().with_tracing(false));
    assert_eq!(get(&router, "/about").await.status(), StatusCode::OK);
    assert_eq!(get(&router, "/missing").await.status(), StatusCode::NOT_FOUND);

    assert_eq!(fs.stat_count(), probes);
    assert_eq!(cache.stats().resolutions, 4);
}
