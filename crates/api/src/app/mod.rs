//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: guard, issuer and store wiring
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices) -> Router {
    let guard = services.guard.clone();

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router(&guard))
        .layer(ServiceBuilder::new().layer(Extension(Arc::new(services))))
}
