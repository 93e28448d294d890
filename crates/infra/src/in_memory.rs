use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Timelike, Utc};
use tracing::{debug, info};

use tokengate_auth::{DirectoryError, MembershipDirectory};
use tokengate_core::{DomainError, DomainResult, IssueId, ProjectId, UserId};

use crate::records::{
    HourlyCount, IssueKind, IssueRecord, NewUser, Page, Pagination, ProjectRecord, ProjectSummary, UserProfile,
    UserRecord,
};
use crate::store::{IssueStore, ProjectStore, UserStore};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    projects: BTreeMap<ProjectId, ProjectRecord>,
    members: HashMap<ProjectId, HashSet<UserId>>,
    issues: HashMap<ProjectId, Vec<IssueRecord>>,
}

impl Tables {
    fn summaries<'a>(&self, projects: impl Iterator<Item = &'a ProjectRecord>) -> Vec<ProjectSummary> {
        let mut out: Vec<ProjectSummary> = projects
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name.clone(),
                issue_count: self.issues.get(&p.id).map_or(0, Vec::len),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        out
    }

    fn issue_mut(&mut self, project_id: ProjectId, kind: IssueKind, issue_id: IssueId) -> DomainResult<&mut IssueRecord> {
        self.project_exists(project_id)?;
        self.issues
            .get_mut(&project_id)
            .and_then(|issues| issues.iter_mut().find(|i| i.id == issue_id && i.kind == kind))
            .ok_or(DomainError::not_found("issue"))
    }

    fn project_exists(&self, project_id: ProjectId) -> DomainResult<()> {
        if self.projects.contains_key(&project_id) {
            Ok(())
        } else {
            Err(DomainError::not_found("project"))
        }
    }
}

/// In-memory data collaborator for dev/test.
///
/// One lock over all tables keeps cross-table writes (e.g. deleting a user
/// and their memberships) atomic.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<Tables>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| DomainError::unavailable("directory lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| DomainError::unavailable("directory lock poisoned"))
    }
}

impl MembershipDirectory for InMemoryDirectory {
    fn project_users(&self, project_id: ProjectId) -> Result<HashSet<UserId>, DirectoryError> {
        let tables = self.read().map_err(|e| DirectoryError(e.to_string()))?;
        Ok(tables.members.get(&project_id).cloned().unwrap_or_default())
    }

    fn user_is_root(&self, user_id: UserId) -> Result<Option<bool>, DirectoryError> {
        let tables = self.read().map_err(|e| DirectoryError(e.to_string()))?;
        Ok(tables.users.get(&user_id).map(|u| u.is_root))
    }
}

impl UserStore for InMemoryDirectory {
    fn add_user(&self, user: NewUser) -> DomainResult<UserProfile> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(DomainError::conflict("email already registered"));
        }

        let record = UserRecord {
            id: UserId::new(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password_hash: user.password_hash,
            is_root: user.is_root,
        };
        let profile = record.profile();
        info!(user_id = %record.id, is_root = record.is_root, "user added");
        tables.users.insert(record.id, record);
        Ok(profile)
    }

    fn fetch_user_by_email(&self, email: &str) -> DomainResult<UserRecord> {
        self.read()?
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or(DomainError::not_found("user"))
    }

    fn fetch_all_users(&self) -> DomainResult<Vec<UserProfile>> {
        Ok(self.read()?.users.values().map(UserRecord::profile).collect())
    }

    fn delete_user(&self, user_id: UserId) -> DomainResult<()> {
        let mut tables = self.write()?;
        tables
            .users
            .remove(&user_id)
            .ok_or(DomainError::not_found("user"))?;
        for members in tables.members.values_mut() {
            members.remove(&user_id);
        }
        info!(%user_id, "user deleted");
        Ok(())
    }

    fn update_password(&self, user_id: UserId, password_hash: String) -> DomainResult<()> {
        let mut tables = self.write()?;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(DomainError::not_found("user"))?;
        user.password_hash = password_hash;
        info!(%user_id, "password updated");
        Ok(())
    }
}

impl ProjectStore for InMemoryDirectory {
    fn add_project(&self, name: &str) -> DomainResult<ProjectRecord> {
        let record = ProjectRecord {
            id: ProjectId::new(),
            name: name.to_string(),
        };
        self.write()?.projects.insert(record.id, record.clone());
        info!(project_id = %record.id, "project added");
        Ok(record)
    }

    fn fetch_projects(&self, page: Pagination) -> DomainResult<Page<ProjectSummary>> {
        let tables = self.read()?;
        Ok(page.apply(tables.summaries(tables.projects.values())))
    }

    fn fetch_projects_for_user(&self, user_id: UserId, page: Pagination) -> DomainResult<Page<ProjectSummary>> {
        let tables = self.read()?;
        let assigned = tables.projects.values().filter(|p| {
            tables
                .members
                .get(&p.id)
                .is_some_and(|members| members.contains(&user_id))
        });
        Ok(page.apply(tables.summaries(assigned)))
    }

    fn rename_project(&self, project_id: ProjectId, name: &str) -> DomainResult<ProjectRecord> {
        let mut tables = self.write()?;
        let project = tables
            .projects
            .get_mut(&project_id)
            .ok_or(DomainError::not_found("project"))?;
        project.name = name.to_string();
        Ok(project.clone())
    }

    fn delete_project(&self, project_id: ProjectId) -> DomainResult<()> {
        let mut tables = self.write()?;
        tables
            .projects
            .remove(&project_id)
            .ok_or(DomainError::not_found("project"))?;
        tables.members.remove(&project_id);
        tables.issues.remove(&project_id);
        info!(%project_id, "project deleted");
        Ok(())
    }

    fn fetch_project_members(&self, project_id: ProjectId) -> DomainResult<Vec<UserProfile>> {
        let tables = self.read()?;
        tables.project_exists(project_id)?;
        let Some(members) = tables.members.get(&project_id) else {
            return Ok(Vec::new());
        };
        Ok(tables
            .users
            .values()
            .filter(|u| members.contains(&u.id))
            .map(UserRecord::profile)
            .collect())
    }

    fn add_project_member(&self, project_id: ProjectId, user_id: UserId) -> DomainResult<()> {
        let mut tables = self.write()?;
        tables.project_exists(project_id)?;
        if !tables.users.contains_key(&user_id) {
            return Err(DomainError::not_found("user"));
        }
        if !tables.members.entry(project_id).or_default().insert(user_id) {
            return Err(DomainError::conflict("user is already a member of this project"));
        }
        debug!(%project_id, %user_id, "member added");
        Ok(())
    }

    fn remove_project_member(&self, project_id: ProjectId, user_id: UserId) -> DomainResult<()> {
        let mut tables = self.write()?;
        tables.project_exists(project_id)?;
        let removed = tables
            .members
            .get_mut(&project_id)
            .is_some_and(|members| members.remove(&user_id));
        if !removed {
            return Err(DomainError::not_found("project member"));
        }
        debug!(%project_id, %user_id, "member removed");
        Ok(())
    }
}

impl IssueStore for InMemoryDirectory {
    fn record_issue(&self, project_id: ProjectId, kind: IssueKind, message: &str) -> DomainResult<IssueRecord> {
        let mut tables = self.write()?;
        tables.project_exists(project_id)?;
        let issue = IssueRecord {
            id: IssueId::new(),
            project_id,
            kind,
            message: message.to_string(),
            resolved: false,
            created_at: Utc::now(),
        };
        tables.issues.entry(project_id).or_default().push(issue.clone());
        Ok(issue)
    }

    fn fetch_issues(&self, project_id: ProjectId, page: Pagination) -> DomainResult<Page<IssueRecord>> {
        let tables = self.read()?;
        tables.project_exists(project_id)?;
        let mut issues = tables.issues.get(&project_id).cloned().unwrap_or_default();
        issues.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page.apply(issues))
    }

    fn fetch_issue(&self, project_id: ProjectId, kind: IssueKind, issue_id: IssueId) -> DomainResult<IssueRecord> {
        let tables = self.read()?;
        tables.project_exists(project_id)?;
        tables
            .issues
            .get(&project_id)
            .and_then(|issues| issues.iter().find(|i| i.id == issue_id && i.kind == kind))
            .cloned()
            .ok_or(DomainError::not_found("issue"))
    }

    fn set_issue_resolved(
        &self,
        project_id: ProjectId,
        kind: IssueKind,
        issue_id: IssueId,
        resolved: bool,
    ) -> DomainResult<IssueRecord> {
        let mut tables = self.write()?;
        let issue = tables.issue_mut(project_id, kind, issue_id)?;
        issue.resolved = resolved;
        debug!(%project_id, %issue_id, resolved, "issue updated");
        Ok(issue.clone())
    }

    fn delete_issue(&self, project_id: ProjectId, kind: IssueKind, issue_id: IssueId) -> DomainResult<()> {
        let mut tables = self.write()?;
        tables.issue_mut(project_id, kind, issue_id)?;
        if let Some(issues) = tables.issues.get_mut(&project_id) {
            issues.retain(|i| i.id != issue_id);
        }
        debug!(%project_id, %issue_id, "issue deleted");
        Ok(())
    }

    fn issue_summary(&self, project_id: ProjectId, now: DateTime<Utc>) -> DomainResult<Vec<HourlyCount>> {
        let tables = self.read()?;
        tables.project_exists(project_id)?;
        let mut counts = [0usize; 24];
        let today = now.date_naive();
        for issue in tables.issues.get(&project_id).into_iter().flatten() {
            if issue.created_at.date_naive() == today {
                counts[issue.created_at.hour() as usize] += 1;
            }
        }
        Ok((0u32..)
            .zip(counts)
            .map(|(hour, count)| HourlyCount { hour, count })
            .collect())
    }

    fn delete_issues(&self, project_id: ProjectId) -> DomainResult<usize> {
        let mut tables = self.write()?;
        tables.project_exists(project_id)?;
        Ok(tables.issues.remove(&project_id).map_or(0, |issues| issues.len()))
    }
}
