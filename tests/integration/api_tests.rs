//! API integration tests for static file serving through the router.
//!
//! Tests verify:
//! - Resolution of exact, extensionless and index paths
//! - Content negotiation of pre-compressed variants
//! - HEAD and conditional requests
//! - Filtering, health check and the JSON 404 fallback

use std::time::Duration;

use axum::http::{header, Method, StatusCode};

use asset_streamer::serve::ResponseConfig;
use asset_streamer::server::{create_router, RouterConfig};

use super::test_utils::{body_json, body_string, get, send, Harness, TestSite};

fn router_for(site: &TestSite) -> axum::Router {
    let harness = Harness::new(site.config());
    create_router(harness.handler, RouterConfig::new().with_tracing(false))
}

// =============================================================================
// Resolution
// =============================================================================

#[tokio::test]
async fn test_serves_exact_file() {
    let site = TestSite::new();
    let router = router_for(&site);

    let response = get(&router, "/about.html").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    assert!(response.headers().contains_key(header::ETAG));
    assert!(!response.headers().contains_key(header::CACHE_CONTROL));
    assert_eq!(body_string(response).await, "<h1>about</h1>");
}

#[tokio::test]
async fn test_serves_index_and_extensionless_paths() {
    let site = TestSite::new();
    let router = router_for(&site);

    assert_eq!(body_string(get(&router, "/").await).await, "<h1>home</h1>");
    assert_eq!(body_string(get(&router, "/about").await).await, "<h1>about</h1>");
    assert_eq!(body_string(get(&router, "/docs").await).await, "<h1>docs</h1>");
    assert_eq!(body_string(get(&router, "/docs/").await).await, "<h1>docs</h1>");
    assert_eq!(body_string(get(&router, "/docs/guide").await).await, "<h1>guide</h1>");
}

#[tokio::test]
async fn test_query_string_is_ignored() {
    let site = TestSite::new();
    let router = router_for(&site);

    let response = get(&router, "/about.html?v=42").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "<h1>about</h1>");
}

#[tokio::test]
async fn test_path_traversal_stays_in_root() {
    let site = TestSite::new();
    let router = router_for(&site);

    let response = get(&router, "/docs/../about.html").await;
    assert_eq!(body_string(response).await, "<h1>about</h1>");

    let response = get(&router, "/../../../../etc/hostname.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Content Negotiation
// =============================================================================

#[tokio::test]
async fn test_negotiates_preferred_variant() {
    let site = TestSite::new();
    let router = router_for(&site);

    let response = send(
        &router,
        Method::GET,
        "/",
        &[("accept-encoding", "br;q=0.5, gzip;q=0.9, identity;q=0.9")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    assert_eq!(response.headers()[header::VARY], "accept-encoding");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(body_string(response).await, "gzip-home");
}

#[tokio::test]
async fn test_falls_back_to_canonical_file() {
    let site = TestSite::new();
    let router = router_for(&site);

    // about.html has no compressed siblings
    let response = send(&router, Method::GET, "/about.html", &[("accept-encoding", "gzip")]).await;
    assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
    assert!(!response
        .headers()
        .get_all(header::VARY)
        .iter()
        .any(|v| v == "accept-encoding"));
    assert_eq!(body_string(response).await, "<h1>about</h1>");

    // guide.html only has a brotli sibling
    let response = send(&router, Method::GET, "/docs/guide", &[("accept-encoding", "gzip")]).await;
    assert_eq!(body_string(response).await, "<h1>guide</h1>");

    // No Accept-Encoding at all
    let response = get(&router, "/").await;
    assert!(!response.headers().contains_key(header::CONTENT_ENCODING));
    assert_eq!(body_string(response).await, "<h1>home</h1>");
}

// =============================================================================
// HEAD and Conditional Requests
// =============================================================================

#[tokio::test]
async fn test_head_matches_get_without_streaming() {
    let site = TestSite::new();
    let harness = Harness::with_response_config(
        site.config(),
        ResponseConfig::new()
            .with_max_age(Duration::from_secs(86400))
            .with_immutable(true),
    );
    let fs = harness.fs.clone();
    let router = create_router(harness.handler, RouterConfig::new().with_tracing(false));
    let encoding = [("accept-encoding", "br")];

    let head = send(&router, Method::HEAD, "/", &encoding).await;
    assert_eq!(head.status(), StatusCode::OK);
    assert_eq!(fs.stream_count(), 0);

    let full = send(&router, Method::GET, "/", &encoding).await;
    assert_eq!(fs.stream_count(), 1);

    assert_eq!(head.headers(), full.headers());
    assert_eq!(
        head.headers()[header::CACHE_CONTROL],
        "max-age=86400, immutable"
    );
    assert_eq!(head.headers()[header::CONTENT_ENCODING], "br");
    assert_eq!(head.headers()[header::CONTENT_LENGTH], "11");
    assert!(body_string(head).await.is_empty());
    assert_eq!(body_string(full).await, "brotli-home");
}

#[tokio::test]
async fn test_if_none_match_returns_not_modified() {
    let site = TestSite::new();
    let router = router_for(&site);

    let first = get(&router, "/about.html").await;
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_string();
    assert!(etag.starts_with("W/\""));

    let response = send(
        &router,
        Method::GET,
        "/about.html",
        &[("if-none-match", etag.as_str())],
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[header::ETAG], etag.as_str());
    assert!(body_string(response).await.is_empty());

    let response = send(
        &router,
        Method::GET,
        "/about.html",
        &[("if-none-match", "\"stale\"")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_etag_disabled() {
    let site = TestSite::new();
    let harness = Harness::new(site.config().with_etag(false));
    let router = create_router(harness.handler, RouterConfig::new());

    let response = send(&router, Method::GET, "/", &[("if-none-match", "*")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::ETAG));
}

// =============================================================================
// Filtering
// =============================================================================

#[tokio::test]
async fn test_extension_allow_list() {
    let site = TestSite::new();

    let router = router_for(&site);
    assert_eq!(get(&router, "/style.css").await.status(), StatusCode::NOT_FOUND);

    let harness = Harness::new(site.config().with_extensions([".html", ".css"]));
    let router = create_router(harness.handler, RouterConfig::new());
    let response = send(&router, Method::GET, "/style.css", &[("accept-encoding", "gzip")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    assert_eq!(body_string(response).await, "gzip-style");
}

#[tokio::test]
async fn test_include_and_exclude() {
    let site = TestSite::new();
    let harness = Harness::new(
        site.config()
            .with_include(["**/*.html"])
            .with_exclude(["drafts/**"]),
    );
    let router = create_router(harness.handler, RouterConfig::new());

    assert_eq!(get(&router, "/docs/guide").await.status(), StatusCode::OK);
    assert_eq!(
        get(&router, "/drafts/wip.html").await.status(),
        StatusCode::NOT_FOUND
    );
}

// =============================================================================
// Router Endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let site = TestSite::new();
    let router = router_for(&site);

    let response = get(&router, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_file_reaches_fallback() {
    let site = TestSite::new();
    let router = router_for(&site);

    let response = get(&router, "/nope.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_unsupported_method_reaches_fallback() {
    let site = TestSite::new();
    let router = router_for(&site);

    // The file exists, but DELETE is not served and falls through
    let response = send(&router, Method::DELETE, "/about.html", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.headers().contains_key(header::ETAG));
}

#[tokio::test]
async fn test_cors_headers() {
    let site = TestSite::new();
    let harness = Harness::new(site.config());
    let router = create_router(
        harness.handler,
        RouterConfig::new().with_cors_origins(vec!["https://example.com".to_string()]),
    );

    let response = send(&router, Method::GET, "/", &[("origin", "https://example.com")]).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://example.com"
    );
}
