//! HTTP server layer for Asset Streamer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │ middleware  │  │  handlers   │  │        routes           │  │
//! │  │(static files│  │ (health,    │  │  (router config, CORS,  │  │
//! │  │ or next)    │  │  404, 405)  │  │   tracing)              │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use handlers::{health_handler, not_found_handler, ErrorResponse, HealthResponse};
pub use middleware::static_files_middleware;
pub use routes::{create_router, with_static_files, RouterConfig};
