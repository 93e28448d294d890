use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use tracing::info;

use tokengate_auth::{Requirement, RequestGuard};
use tokengate_infra::verify_password;

use crate::app::dto::{self, LoginRequest, LoginResponse, StatusResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::config::CookieSettings;
use crate::context::SessionContext;
use crate::middleware::{REFRESH_COOKIE, guarded, refresh_cookie};

pub fn router(guard: &Arc<RequestGuard>) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/refresh", post(refresh))
        .route("/status", guarded(get(status), guard, Requirement::Authenticated))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = dto::required(&body.email, "email")?;
    let password = dto::required_password(&body.password, "password")?;

    let user = services.users.fetch_user_by_email(email)?;
    if !verify_password(password, &user.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let tokens = services.issuer.issue_pair(user.id, user.is_root, Utc::now())?;
    let max_age = services.issuer.ttl().refresh.num_seconds();
    info!(user_id = %user.id, "login");

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            refresh_cookie_header(&tokens.refresh_token, max_age, services.cookies),
        )],
        Json(LoginResponse {
            status: "success",
            access_token: tokens.access_token,
        }),
    ))
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, refresh_cookie_header("", 0, services.cookies))],
        Json(json!({ "status": "success", "message": "successfully logged out" })),
    )
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = refresh_cookie(&headers);
    let access_token = services
        .issuer
        .refresh(refresh_token.as_deref(), Utc::now())?;

    Ok(Json(LoginResponse {
        status: "success",
        access_token,
    }))
}

pub async fn status(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "success",
        user_id: session.user_id(),
        is_root: session.is_root(),
    })
}

fn refresh_cookie_header(value: &str, max_age_secs: i64, settings: CookieSettings) -> String {
    let mut cookie = format!(
        "{REFRESH_COOKIE}={value}; Path=/; Max-Age={max_age_secs}; SameSite={}",
        settings.same_site
    );
    if settings.http_only {
        cookie.push_str("; HttpOnly");
    }
    if settings.secure {
        cookie.push_str("; Secure");
    }
    cookie
}
