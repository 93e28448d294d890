//! Service wiring shared by every route: the guard, the issuer and the data
//! collaborator behind its store traits.

use std::sync::Arc;

use tracing::info;

use tokengate_auth::{
    AuthorizationPolicy, MembershipDirectory, RequestGuard, SessionIssuer, SessionTtl,
    SigningSecret, TokenCodec,
};
use tokengate_core::{DomainError, DomainResult};
use tokengate_infra::{
    InMemoryDirectory, IssueStore, NewUser, ProjectStore, UserStore, hash_password,
};

use crate::config::{AppConfig, CookieSettings};

#[derive(Clone)]
pub struct AppServices {
    pub issuer: Arc<SessionIssuer>,
    pub guard: Arc<RequestGuard>,
    pub directory: Arc<dyn MembershipDirectory>,
    pub users: Arc<dyn UserStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub issues: Arc<dyn IssueStore>,
    pub cookies: CookieSettings,
}

impl AppServices {
    /// Wire everything over one in-memory store.
    pub fn in_memory(
        store: Arc<InMemoryDirectory>,
        secret: &SigningSecret,
        ttl: SessionTtl,
        cookies: CookieSettings,
    ) -> Self {
        let issuer = Arc::new(SessionIssuer::new(TokenCodec::new(secret), ttl));
        let directory: Arc<dyn MembershipDirectory> = store.clone();
        let guard = Arc::new(RequestGuard::new(
            issuer.clone(),
            AuthorizationPolicy::new(directory.clone()),
        ));

        Self {
            issuer,
            guard,
            directory,
            users: store.clone(),
            projects: store.clone(),
            issues: store,
            cookies,
        }
    }
}

/// Build services from configuration, creating the configured root account.
pub fn build_services(config: &AppConfig) -> DomainResult<AppServices> {
    let store = Arc::new(InMemoryDirectory::new());
    let services = AppServices::in_memory(
        store,
        &config.signing_secret(),
        config.session_ttl(),
        config.cookie,
    );

    if let (Some(email), Some(password)) = (&config.root_email, &config.root_password) {
        bootstrap_root(services.users.as_ref(), email, password)?;
    }

    Ok(services)
}

fn bootstrap_root(users: &dyn UserStore, email: &str, password: &str) -> DomainResult<()> {
    if users.fetch_user_by_email(email).is_ok() {
        return Ok(());
    }

    let password_hash =
        hash_password(password).map_err(|e| DomainError::validation(e.to_string()))?;
    let root = users.add_user(NewUser {
        first_name: "Root".to_string(),
        last_name: "User".to_string(),
        email: email.to_string(),
        password_hash,
        is_root: true,
    })?;
    info!(user_id = %root.id, "root user created");
    Ok(())
}
