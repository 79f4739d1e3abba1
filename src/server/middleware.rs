//! Axum middleware adapter for [`StaticFileHandler`].
//!
//! Requests that resolve to a file are answered directly. Everything else
//! (unknown paths, excluded files, non-GET/HEAD methods) continues down the
//! middleware stack unchanged.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::assets::AssetLookup;
use crate::serve::StaticFileHandler;

/// Serve a static file or run the rest of the stack.
///
/// Mount with [`axum::middleware::from_fn_with_state`]:
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/ping", get(ping))
///     .layer(middleware::from_fn_with_state(
///         Arc::new(handler),
///         static_files_middleware::<FileResolver>,
///     ));
/// ```
pub async fn static_files_middleware<L: AssetLookup>(
    State(handler): State<Arc<StaticFileHandler<L>>>,
    request: Request,
    next: Next,
) -> Response {
    handler
        .serve_or(request, |request| next.run(request))
        .await
}
