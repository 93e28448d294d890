use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch},
};
use tracing::info;
use validator::Validate;

use tokengate_auth::{AuthError, Requirement, RequestGuard};
use tokengate_core::{DomainError, UserId};
use tokengate_infra::{NewUser, hash_password};

use crate::app::dto::{self, CreateUserRequest, Envelope, PageQuery, UpdatePasswordRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::guarded;

pub fn router(guard: &Arc<RequestGuard>) -> Router {
    Router::new()
        .route(
            "/",
            guarded(get(list_users).post(create_user), guard, Requirement::RootOnly),
        )
        .route(
            "/:user_id",
            guarded(delete(delete_user), guard, Requirement::RootOnly).merge(guarded(
                patch(update_password),
                guard,
                Requirement::self_only(),
            )),
        )
        .route(
            "/:user_id/projects",
            guarded(get(list_user_projects), guard, Requirement::self_or_root_viewer()),
        )
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(Envelope::success(services.users.fetch_all_users()?)))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let first_name = dto::required(&body.first_name, "first_name")?;
    let last_name = dto::required(&body.last_name, "last_name")?;
    let email = dto::required(&body.email, "email")?;
    let password = dto::required_password(&body.password, "password")?;
    let confirmed = dto::required_password(&body.confirmed_password, "confirmed_password")?;

    if password != confirmed {
        return Err(DomainError::validation("passwords do not match").into());
    }
    body.validate()?;

    let profile = services.users.add_user(NewUser {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
        is_root: false,
    })?;

    Ok((StatusCode::CREATED, Json(Envelope::success(profile))))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id: UserId = user_id.parse()?;
    services.users.delete_user(user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_password(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let password = dto::required_password(&body.password, "password")?;

    services
        .users
        .update_password(user_id, hash_password(password)?)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Projects visible to the path user: every project when that user is root,
/// otherwise the ones they are a member of.
pub async fn list_user_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let page = query.pagination()?;

    let is_root = services
        .directory
        .user_is_root(user_id)
        .map_err(AuthError::from)?
        .ok_or(DomainError::not_found("user"))?;

    let projects = if is_root {
        services.projects.fetch_projects(page)?
    } else {
        services.projects.fetch_projects_for_user(user_id, page)?
    };
    info!(%user_id, count = projects.items.len(), "user projects listed");

    Ok(Json(Envelope::success(projects)))
}
