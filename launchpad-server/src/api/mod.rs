//! API Module
//!
//! HTTP layer of the server: the browser form, the JSON endpoint and the
//! health check. Every handler shares one [`Provisioner`].

pub mod error;
pub mod form;
pub mod health;
pub mod provision;

use axum::{
    Router,
    routing::{get, post},
};
use launchpad_engine::Provisioner;
use tower_http::trace::TraceLayer;

/// Create the main router with all endpoints
pub fn create_router(provisioner: Provisioner) -> Router {
    Router::new()
        // Browser front end
        .route("/", get(form::index))
        .route("/submit", post(form::submit))
        // JSON API
        .route("/api/provision", post(provision::provision))
        // Health check
        .route("/health", get(health::health_check))
        // Add state and middleware
        .with_state(provisioner)
        .layer(TraceLayer::new_for_http())
}
