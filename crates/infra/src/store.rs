use chrono::{DateTime, Utc};
use tokengate_core::{DomainResult, IssueId, ProjectId, UserId};

use crate::records::{
    HourlyCount, IssueKind, IssueRecord, NewUser, Page, Pagination, ProjectRecord, ProjectSummary, UserProfile,
    UserRecord,
};

/// User accounts.
pub trait UserStore: Send + Sync {
    fn add_user(&self, user: NewUser) -> DomainResult<UserProfile>;
    fn fetch_user_by_email(&self, email: &str) -> DomainResult<UserRecord>;
    fn fetch_all_users(&self) -> DomainResult<Vec<UserProfile>>;
    fn delete_user(&self, user_id: UserId) -> DomainResult<()>;
    fn update_password(&self, user_id: UserId, password_hash: String) -> DomainResult<()>;
}

/// Projects and who may act on them.
pub trait ProjectStore: Send + Sync {
    fn add_project(&self, name: &str) -> DomainResult<ProjectRecord>;
    fn fetch_projects(&self, page: Pagination) -> DomainResult<Page<ProjectSummary>>;
    fn fetch_projects_for_user(&self, user_id: UserId, page: Pagination) -> DomainResult<Page<ProjectSummary>>;
    fn rename_project(&self, project_id: ProjectId, name: &str) -> DomainResult<ProjectRecord>;
    fn delete_project(&self, project_id: ProjectId) -> DomainResult<()>;
    fn fetch_project_members(&self, project_id: ProjectId) -> DomainResult<Vec<UserProfile>>;
    fn add_project_member(&self, project_id: ProjectId, user_id: UserId) -> DomainResult<()>;
    fn remove_project_member(&self, project_id: ProjectId, user_id: UserId) -> DomainResult<()>;
}

/// Errors and rejections reported against a project.
pub trait IssueStore: Send + Sync {
    fn record_issue(&self, project_id: ProjectId, kind: IssueKind, message: &str) -> DomainResult<IssueRecord>;
    fn fetch_issues(&self, project_id: ProjectId, page: Pagination) -> DomainResult<Page<IssueRecord>>;
    /// A single issue; an issue of the other kind is not found.
    fn fetch_issue(&self, project_id: ProjectId, kind: IssueKind, issue_id: IssueId) -> DomainResult<IssueRecord>;
    /// Set the resolved flag to `resolved`. Repeating the call changes nothing.
    fn set_issue_resolved(
        &self,
        project_id: ProjectId,
        kind: IssueKind,
        issue_id: IssueId,
        resolved: bool,
    ) -> DomainResult<IssueRecord>;
    fn delete_issue(&self, project_id: ProjectId, kind: IssueKind, issue_id: IssueId) -> DomainResult<()>;
    /// 24 buckets, one per UTC hour of `now`'s date.
    fn issue_summary(&self, project_id: ProjectId, now: DateTime<Utc>) -> DomainResult<Vec<HourlyCount>>;
    /// Remove every issue of the project, returning how many were removed.
    fn delete_issues(&self, project_id: ProjectId) -> DomainResult<usize>;
}
