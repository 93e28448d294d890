use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    RequestExt,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
    routing::MethodRouter,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;

use tokengate_auth::{AuthorizationContext, Credentials, Requirement, RequestGuard};

use crate::app::errors::auth_error_to_response;
use crate::context::SessionContext;

pub const REFRESH_COOKIE: &str = "refresh_token";

/// State of one guard layer: the shared guard plus the requirement of the
/// route it wraps.
#[derive(Clone)]
pub struct GuardLayerState {
    pub guard: Arc<RequestGuard>,
    pub requirement: Requirement,
}

/// Wrap a route so it only runs for callers meeting `requirement`.
pub fn guarded(route: MethodRouter, guard: &Arc<RequestGuard>, requirement: Requirement) -> MethodRouter {
    route.route_layer(axum::middleware::from_fn_with_state(
        GuardLayerState {
            guard: guard.clone(),
            requirement,
        },
        guard_middleware,
    ))
}

pub async fn guard_middleware(
    State(state): State<GuardLayerState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Routes without parameters fail this extraction; they simply carry none.
    let params = req
        .extract_parts::<Path<HashMap<String, String>>>()
        .await
        .map(|Path(params)| params)
        .unwrap_or_default();
    let ctx = AuthorizationContext::from_path_params(
        params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );

    let credentials = Credentials::new(
        extract_bearer(req.headers()).map(str::to_owned),
        refresh_cookie(req.headers()),
    );

    let admission = match state
        .guard
        .check(&credentials, state.requirement, &ctx, Utc::now())
    {
        Ok(admission) => admission,
        Err(rejection) => return auth_error_to_response(&rejection.error),
    };

    req.extensions_mut()
        .insert(SessionContext::new(admission.claims));

    let mut response = next.run(req).await;

    if let Some(token) = admission.renewed_access_token {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                response.headers_mut().insert(header::AUTHORIZATION, value);
            }
            Err(e) => tracing::warn!(error = %e, "renewed token is not a valid header value"),
        }
    }

    response
}

/// Token from `Authorization: Bearer <token>`; `None` when absent or empty.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

pub fn refresh_cookie(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}
