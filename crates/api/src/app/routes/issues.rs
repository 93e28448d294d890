use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use tokengate_auth::{Requirement, RequestGuard};
use tokengate_core::{DomainError, DomainResult, IssueId, ProjectId};
use tokengate_infra::IssueKind;

use crate::app::dto::{Envelope, PageQuery, ResolveIssueRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::guarded;

/// Issue triage, open to root and members of the project in the path.
pub fn router(guard: &Arc<RequestGuard>) -> Router {
    let member = Requirement::ProjectMember;
    Router::new()
        .route(
            "/:project_id/issues",
            guarded(get(list_issues).delete(clear_issues), guard, member),
        )
        .route(
            "/:project_id/issues/summary",
            guarded(get(issue_summary), guard, member),
        )
        .route(
            "/:project_id/issues/:kind/:issue_id",
            guarded(
                get(get_issue).patch(resolve_issue).delete(delete_issue),
                guard,
                member,
            ),
        )
}

/// `errors` or `rejections`; anything else names no resource.
fn issue_kind(segment: &str) -> DomainResult<IssueKind> {
    match segment {
        "errors" => Ok(IssueKind::Error),
        "rejections" => Ok(IssueKind::Rejection),
        _ => Err(DomainError::not_found("issue kind")),
    }
}

fn issue_path(project_id: &str, kind: &str, issue_id: &str) -> Result<(ProjectId, IssueKind, IssueId), ApiError> {
    Ok((project_id.parse()?, issue_kind(kind)?, issue_id.parse()?))
}

pub async fn list_issues(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    let page = query.pagination()?;
    Ok(Json(Envelope::success(services.issues.fetch_issues(project_id, page)?)))
}

pub async fn clear_issues(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    match services.issues.delete_issues(project_id)? {
        0 => Err(DomainError::not_found("issues").into()),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

/// Issue counts per hour of the current UTC day.
pub async fn issue_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id: ProjectId = project_id.parse()?;
    let summary = services.issues.issue_summary(project_id, Utc::now())?;
    Ok(Json(Envelope::success(summary)))
}

pub async fn get_issue(
    Extension(services): Extension<Arc<AppServices>>,
    Path((project_id, kind, issue_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (project_id, kind, issue_id) = issue_path(&project_id, &kind, &issue_id)?;
    let issue = services.issues.fetch_issue(project_id, kind, issue_id)?;
    Ok(Json(Envelope::success(issue)))
}

/// Set the resolved flag to the value in the body.
pub async fn resolve_issue(
    Extension(services): Extension<Arc<AppServices>>,
    Path((project_id, kind, issue_id)): Path<(String, String, String)>,
    Json(body): Json<ResolveIssueRequest>,
) -> Result<StatusCode, ApiError> {
    let (project_id, kind, issue_id) = issue_path(&project_id, &kind, &issue_id)?;
    let resolved = body
        .resolved
        .ok_or_else(|| DomainError::validation("missing resolved state"))?;
    services.issues.set_issue_resolved(project_id, kind, issue_id, resolved)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_issue(
    Extension(services): Extension<Arc<AppServices>>,
    Path((project_id, kind, issue_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let (project_id, kind, issue_id) = issue_path(&project_id, &kind, &issue_id)?;
    services.issues.delete_issue(project_id, kind, issue_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_segments() {
        assert_eq!(issue_kind("errors"), Ok(IssueKind::Error));
        assert_eq!(issue_kind("rejections"), Ok(IssueKind::Rejection));
        assert!(matches!(issue_kind("error"), Err(DomainError::NotFound(_))));
    }
}
