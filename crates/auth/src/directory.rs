use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use tokengate_core::{ProjectId, UserId};

/// The membership lookup could not be answered.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("membership directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// Read-only view of the data layer that authorization depends on.
///
/// The auth layer never mutates membership, and never caches answers: every
/// call goes to the owning store so a membership change is visible on the very
/// next request.
pub trait MembershipDirectory: Send + Sync {
    /// Users allowed to act on `project_id`. Unknown projects have no members.
    fn project_users(&self, project_id: ProjectId) -> Result<HashSet<UserId>, DirectoryError>;

    /// Current root status of `user_id`, or `None` when the user does not exist.
    fn user_is_root(&self, user_id: UserId) -> Result<Option<bool>, DirectoryError>;
}

impl<S> MembershipDirectory for Arc<S>
where
    S: MembershipDirectory + ?Sized,
{
    fn project_users(&self, project_id: ProjectId) -> Result<HashSet<UserId>, DirectoryError> {
        (**self).project_users(project_id)
    }

    fn user_is_root(&self, user_id: UserId) -> Result<Option<bool>, DirectoryError> {
        (**self).user_is_root(user_id)
    }
}
