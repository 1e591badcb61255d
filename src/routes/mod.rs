// ABOUTME: HTTP route assembly with CORS and request tracing layers
// ABOUTME: Merges the chat streaming and health routers onto one axum Router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Knowledge Chat Server Contributors

//! HTTP routes
//!
//! Route handlers are grouped per concern, each exposing a `routes()`
//! constructor; [`router`] merges them and applies the shared layers.

use crate::server::ServerState;
use axum::Router;
use http::{HeaderValue, Method};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Chat streaming routes
pub mod chat;

/// Health check routes
pub mod health;

pub use chat::ChatRoutes;
pub use health::HealthRoutes;

/// Assemble the full application router
#[must_use]
pub fn router(state: Arc<ServerState>) -> Router {
    let cors = setup_cors(&state.config.cors_allowed_origins);

    Router::new()
        .merge(ChatRoutes::routes(state))
        .merge(HealthRoutes::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Configure CORS from the comma-separated origin list
///
/// `*` (or an empty list) permits any origin; otherwise only the listed
/// origins are allowed.
fn setup_cors(allowed_origins: &str) -> CorsLayer {
    let allow_origin = if allowed_origins.is_empty() || allowed_origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    HeaderValue::from_str(trimmed).ok()
                }
            })
            .collect();

        if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([http::header::CONTENT_TYPE, http::header::ACCEPT])
}
