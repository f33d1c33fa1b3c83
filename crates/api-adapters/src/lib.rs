//! # api-adapters
//!
//! The JSON HTTP surface of the forum (feature `web-axum`) plus the pieces
//! it needs that do not depend on axum: wire DTOs, metrics and the
//! escaping content renderer.

pub mod dto;
pub mod metrics;
pub mod render;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::Metrics;
pub use render::SafeHtmlRenderer;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
