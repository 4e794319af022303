//! Lookout camera system ordering wizard.
//!
//! This crate provides the wizard as a library, allowing it to be tested and
//! reused with any commerce backend that implements
//! [`CatalogSource`](catalog::CatalogSource) and [`CartBackend`](cart::CartBackend).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod wizard;

#[cfg(test)]
mod test_support;

use axum::{Router, middleware::from_fn};
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::state::AppState;
use crate::wizard::Commerce;

/// Build the application router: routes, session, request ID and tracing layers.
///
/// Sentry layers are added by the binary so tests can build the router
/// without a Sentry client.
pub fn app<P: Commerce>(state: AppState<P>, sessions: SessionManagerLayer<MemoryStore>) -> Router {
    routes::routes()
        .layer(sessions)
        .with_state(state)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            },
        ))
}
