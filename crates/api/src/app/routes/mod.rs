use std::sync::Arc;

use axum::Router;

use tokengate_auth::RequestGuard;

pub mod auth;
pub mod issues;
pub mod projects;
pub mod system;
pub mod users;

/// Router for everything under `/api`. Each route carries its own guard layer.
pub fn router(guard: &Arc<RequestGuard>) -> Router {
    Router::new()
        .nest("/auth", auth::router(guard))
        .nest("/users", users::router(guard))
        .nest("/projects", projects::router(guard).merge(issues::router(guard)))
}

