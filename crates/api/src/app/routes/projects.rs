use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use serde_json::json;

use tokengate_auth::{Requirement, RequestGuard};
use tokengate_core::{ProjectId, UserId};

use crate::app::dto::{self, AddMemberRequest, Envelope, PageQuery, ProjectNameRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::guarded;

/// Project administration. Root only throughout.
pub fn router(guard: &Arc<RequestGuard>) -> Router {
    let root = Requirement::RootOnly;
    Router::new()
        .route("/", guarded(get(list_projects).post(create_project), guard, root))
        .route(
            "/:project_id",
            guarded(delete(delete_project).patch(rename_project), guard, root),
        )
        .route(
            "/:project_id/users",
            guarded(get(list_members).post(add_member), guard, root),
        )
        .route(
            "/:project_id/users/:user_id",
            guarded(delete(remove_member), guard, root),
        )
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.pagination()?;
    Ok(Json(Envelope::success(services.projects.fetch_projects(page)?)))
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ProjectNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = dto::required(&body.name, "name")?;
    let project = services.projects.add_project(name)?;
    Ok((StatusCode::CREATED, Json(Envelope::success(project))))
}

pub async fn rename_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
    Json(body): Json<ProjectNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    let name = dto::required(&body.name, "name")?;
    let project = services.projects.rename_project(project_id, name)?;
    Ok(Json(Envelope::success(project)))
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    services.projects.delete_project(project_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    let members = services.projects.fetch_project_members(project_id)?;
    Ok(Json(Envelope::success(members)))
}

pub async fn add_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    let user_id: UserId = dto::required(&body.user_id, "user_id")?.parse()?;

    services.projects.add_project_member(project_id, user_id)?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(json!({
            "project_id": project_id,
            "user_id": user_id,
        }))),
    ))
}

pub async fn remove_member(
    Extension(services): Extension<Arc<AppServices>>,
    Path((project_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    let user_id: UserId = user_id.parse()?;
    services.projects.remove_project_member(project_id, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}
