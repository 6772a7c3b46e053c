// ABOUTME: Route module organization for the homeserve HTTP endpoints
// ABOUTME: Centralized route definitions organized by role domain
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Route modules for the homeserve API.
//!
//! Routes are grouped by the role that consumes them; each module contains
//! thin handlers that delegate to the database and guard layers. The route
//! surface (method, path, auth requirement) is fixed; handlers hand the view
//! layer plain JSON data structures.

/// Admin routes: moderation, catalog and account management
pub mod admin;
/// Authentication routes: login, signup, logout
pub mod auth;
/// Customer routes: dashboard, search, booking, requests, reviews
pub mod customer;
/// Professional routes: work queue, search, acceptance
pub mod professional;

use crate::context::ServerResources;
use crate::middleware::require_session;
use axum::middleware::from_fn_with_state;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Assemble the full application router
pub fn router(resources: Arc<ServerResources>) -> Router {
    let protected = Router::new()
        .merge(customer::routes())
        .merge(professional::routes())
        .merge(admin::routes())
        .route_layer(from_fn_with_state(resources.clone(), require_session));

    Router::new()
        .merge(auth::routes())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(resources)
}

/// Uniform envelope for mutation outcomes
#[derive(Debug, serde::Serialize)]
pub struct MessageResponse {
    /// Whether the operation took effect
    pub success: bool,
    /// Human-readable outcome for the view layer
    pub message: String,
}

impl MessageResponse {
    /// Successful outcome
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
