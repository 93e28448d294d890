//! Authorization requirements and the single engine that evaluates them.

use std::sync::Arc;

use thiserror::Error;

use tokengate_core::{ProjectId, UserId};

use crate::claims::SessionClaims;
use crate::directory::{DirectoryError, MembershipDirectory};

// ─────────────────────────────────────────────────────────────────────────────
// Requirement
// ─────────────────────────────────────────────────────────────────────────────

/// What a protected operation demands of its caller.
///
/// Exactly one requirement is attached to each operation. `Authenticated` is
/// implied by all of them: the guard only evaluates a requirement after the
/// token has decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any valid session.
    Authenticated,
    /// The session must belong to a root user.
    RootOnly,
    /// Root, or a member of the project named in the request path.
    ProjectMember,
    /// The subject must be the user named in the request path.
    ///
    /// `root_may_view` lets root through regardless of the path user. Only the
    /// "list a user's projects" operation sets it.
    SelfOnly { root_may_view: bool },
}

impl Requirement {
    pub const fn self_only() -> Self {
        Self::SelfOnly { root_may_view: false }
    }

    pub const fn self_or_root_viewer() -> Self {
        Self::SelfOnly { root_may_view: true }
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Authenticated => f.write_str("authenticated"),
            Requirement::RootOnly => f.write_str("root_only"),
            Requirement::ProjectMember => f.write_str("project_member"),
            Requirement::SelfOnly { root_may_view: false } => f.write_str("self_only"),
            Requirement::SelfOnly { root_may_view: true } => f.write_str("self_or_root_viewer"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Path-derived facts about the request being authorized.
///
/// Built per request and dropped with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorizationContext {
    project_id: Option<ProjectId>,
    user_id: Option<UserId>,
}

impl AuthorizationContext {
    pub const PROJECT_PARAM: &'static str = "project_id";
    pub const USER_PARAM: &'static str = "user_id";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_id(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Pick `project_id` / `user_id` out of matched path parameters.
    ///
    /// Values that are not valid identifiers are dropped, which makes the
    /// corresponding checks deny rather than error.
    pub fn from_path_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut ctx = Self::new();
        for (name, value) in params {
            match name {
                Self::PROJECT_PARAM => ctx.project_id = value.parse().ok(),
                Self::USER_PARAM => ctx.user_id = value.parse().ok(),
                _ => {}
            }
        }
        ctx
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        self.project_id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("root privileges required")]
    NotRoot,

    #[error("not a member of this project")]
    NotProjectMember,

    #[error("operation is restricted to the user themself")]
    NotSelf,

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Evaluates a [`Requirement`] against decoded claims and the request context.
///
/// One instance per process, with the membership directory injected.
#[derive(Clone)]
pub struct AuthorizationPolicy {
    directory: Arc<dyn MembershipDirectory>,
}

impl AuthorizationPolicy {
    pub fn new(directory: Arc<dyn MembershipDirectory>) -> Self {
        Self { directory }
    }

    /// Allow or deny. No IO except the membership lookup for `ProjectMember`.
    pub fn evaluate(
        &self,
        requirement: Requirement,
        claims: &SessionClaims,
        ctx: &AuthorizationContext,
    ) -> Result<(), AuthzError> {
        match requirement {
            Requirement::Authenticated => Ok(()),

            Requirement::RootOnly if claims.is_root => Ok(()),
            Requirement::RootOnly => Err(AuthzError::NotRoot),

            Requirement::ProjectMember if claims.is_root => Ok(()),
            Requirement::ProjectMember => {
                let Some(project_id) = ctx.project_id() else {
                    return Err(AuthzError::NotProjectMember);
                };
                if self.directory.project_users(project_id)?.contains(&claims.sub) {
                    Ok(())
                } else {
                    Err(AuthzError::NotProjectMember)
                }
            }

            Requirement::SelfOnly { root_may_view: true } if claims.is_root => Ok(()),
            Requirement::SelfOnly { .. } => {
                if ctx.user_id() == Some(claims.sub) {
                    Ok(())
                } else {
                    Err(AuthzError::NotSelf)
                }
            }
        }
    }
}

impl core::fmt::Debug for AuthorizationPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthorizationPolicy").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use chrono::{Duration, Utc};

    use crate::claims::TokenKind;

    /// Directory backed by a fixed membership map; counts lookups.
    #[derive(Default)]
    pub(crate) struct StaticDirectory {
        pub members: HashMap<ProjectId, HashSet<UserId>>,
        pub roots: HashSet<UserId>,
        pub lookups: Mutex<usize>,
        pub fail: bool,
    }

    impl StaticDirectory {
        pub fn with_member(mut self, project_id: ProjectId, user_id: UserId) -> Self {
            self.members.entry(project_id).or_default().insert(user_id);
            self
        }
    }

    impl MembershipDirectory for StaticDirectory {
        fn project_users(&self, project_id: ProjectId) -> Result<HashSet<UserId>, DirectoryError> {
            *self.lookups.lock().unwrap() += 1;
            if self.fail {
                return Err(DirectoryError("store offline".to_string()));
            }
            Ok(self.members.get(&project_id).cloned().unwrap_or_default())
        }

        fn user_is_root(&self, user_id: UserId) -> Result<Option<bool>, DirectoryError> {
            Ok(Some(self.roots.contains(&user_id)))
        }
    }

    fn claims(sub: UserId, is_root: bool) -> SessionClaims {
        SessionClaims::new(sub, is_root, TokenKind::Access, Utc::now(), Duration::seconds(20))
    }

    fn policy(dir: StaticDirectory) -> (AuthorizationPolicy, Arc<StaticDirectory>) {
        let dir = Arc::new(dir);
        (AuthorizationPolicy::new(dir.clone()), dir)
    }

    #[test]
    fn member_is_allowed_and_lookup_is_not_cached() {
        let project = ProjectId::new();
        let user = UserId::new();
        let (policy, dir) = policy(StaticDirectory::default().with_member(project, user));
        let ctx = AuthorizationContext::new().with_project_id(project);

        for _ in 0..3 {
            assert_eq!(policy.evaluate(Requirement::ProjectMember, &claims(user, false), &ctx), Ok(()));
        }
        assert_eq!(*dir.lookups.lock().unwrap(), 3);
    }

    #[test]
    fn root_skips_membership_lookup() {
        let (policy, dir) = policy(StaticDirectory::default());
        let ctx = AuthorizationContext::new().with_project_id(ProjectId::new());

        assert_eq!(policy.evaluate(Requirement::ProjectMember, &claims(UserId::new(), true), &ctx), Ok(()));
        assert_eq!(*dir.lookups.lock().unwrap(), 0);
    }

    #[test]
    fn project_member_without_project_in_path_is_denied() {
        let (policy, _) = policy(StaticDirectory::default());
        assert_eq!(
            policy.evaluate(Requirement::ProjectMember, &claims(UserId::new(), false), &AuthorizationContext::new()),
            Err(AuthzError::NotProjectMember)
        );
    }

    #[test]
    fn directory_failure_is_not_an_allow() {
        let (policy, _) = policy(StaticDirectory { fail: true, ..Default::default() });
        let ctx = AuthorizationContext::new().with_project_id(ProjectId::new());

        assert!(matches!(
            policy.evaluate(Requirement::ProjectMember, &claims(UserId::new(), false), &ctx),
            Err(AuthzError::Directory(_))
        ));
    }

    #[test]
    fn root_does_not_bypass_strict_self_only() {
        let (policy, _) = policy(StaticDirectory::default());
        let ctx = AuthorizationContext::new().with_user_id(UserId::new());

        assert_eq!(
            policy.evaluate(Requirement::self_only(), &claims(UserId::new(), true), &ctx),
            Err(AuthzError::NotSelf)
        );
        assert_eq!(
            policy.evaluate(Requirement::self_or_root_viewer(), &claims(UserId::new(), true), &ctx),
            Ok(())
        );
    }

    #[test]
    fn self_only_allows_own_path() {
        let (policy, _) = policy(StaticDirectory::default());
        let me = UserId::new();
        let ctx = AuthorizationContext::new().with_user_id(me);

        assert_eq!(policy.evaluate(Requirement::self_only(), &claims(me, false), &ctx), Ok(()));
        assert_eq!(policy.evaluate(Requirement::self_or_root_viewer(), &claims(me, false), &ctx), Ok(()));
    }

    #[test]
    fn context_from_path_params_ignores_unparsable_values() {
        let project = ProjectId::new();
        let project_str = project.to_string();
        let ctx = AuthorizationContext::from_path_params([
            ("project_id", project_str.as_str()),
            ("user_id", "not-a-uuid"),
            ("issue_id", "whatever"),
        ]);

        assert_eq!(ctx.project_id(), Some(project));
        assert_eq!(ctx.user_id(), None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_user() -> impl Strategy<Value = UserId> {
            any::<u128>().prop_map(|raw| UserId::from_uuid(uuid::Uuid::from_u128(raw)))
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: RootOnly allows exactly the root subjects.
            #[test]
            fn root_only_tracks_root_flag(sub in arb_user(), is_root in any::<bool>()) {
                let (policy, _) = policy(StaticDirectory::default());
                let decision = policy.evaluate(Requirement::RootOnly, &claims(sub, is_root), &AuthorizationContext::new());
                prop_assert_eq!(decision.is_ok(), is_root);
            }

            /// Property: a non-root subject passes ProjectMember iff it is in the membership set.
            #[test]
            fn project_member_tracks_membership(
                sub in arb_user(),
                others in proptest::collection::vec(arb_user(), 0..8),
                is_member in any::<bool>(),
            ) {
                let project = ProjectId::new();
                let mut dir = StaticDirectory::default();
                for other in &others {
                    dir = dir.with_member(project, *other);
                }
                if is_member {
                    dir = dir.with_member(project, sub);
                }
                let expected = is_member || others.contains(&sub);
                let (policy, _) = policy(dir);
                let ctx = AuthorizationContext::new().with_project_id(project);

                prop_assert_eq!(policy.evaluate(Requirement::ProjectMember, &claims(sub, false), &ctx).is_ok(), expected);
                prop_assert!(policy.evaluate(Requirement::ProjectMember, &claims(sub, true), &ctx).is_ok());
            }

            /// Property: SelfOnly denies a non-root subject acting on another user, in either scope.
            #[test]
            fn self_only_denies_other_users(sub in arb_user(), path_user in arb_user(), root_may_view in any::<bool>()) {
                prop_assume!(sub != path_user);
                let (policy, _) = policy(StaticDirectory::default());
                let ctx = AuthorizationContext::new().with_user_id(path_user);

                prop_assert_eq!(
                    policy.evaluate(Requirement::SelfOnly { root_may_view }, &claims(sub, false), &ctx),
                    Err(AuthzError::NotSelf)
                );
            }
        }
    }
}
