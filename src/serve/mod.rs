//! Request handling: content negotiation and the static file handler.

mod handler;
mod negotiation;

pub use handler::{ResponseConfig, StaticFileHandler, SUPPORTED_METHODS};
pub use negotiation::{negotiate, parse_accept_encoding, NegotiationPreference};
