//! Request guard: authenticate → authorize → handle.
//!
//! The guard is an explicit pipeline rather than nested wrappers so that every
//! decision it makes is visible as a list of [`GuardState`]s. Transport layers
//! turn headers/cookies into [`Credentials`] and path parameters into an
//! [`AuthorizationContext`], call [`RequestGuard::check`], and map a
//! [`Rejection`] to a status code.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::claims::{SessionClaims, TokenKind};
use crate::codec::TokenError;
use crate::directory::DirectoryError;
use crate::issuer::{RefreshError, SessionIssuer};
use crate::policy::{AuthorizationContext, AuthorizationPolicy, AuthzError, Requirement};

/// States the guard moves through for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    TokenMissing,
    Decoding,
    Valid,
    Expired,
    Malformed,
    Authorizing,
    Allowed,
    Denied,
}

/// Raw credentials presented with a request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer access token, if any.
    pub access: Option<String>,
    /// Refresh token, if any. Only consulted when the access token has expired.
    pub refresh: Option<String>,
}

impl Credentials {
    pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
        Self { access, refresh }
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &self.access.as_ref().map(|_| "<redacted>"))
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Every way a guarded request can be turned away.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("token is missing")]
    CredentialMissing,

    #[error("invalid token: {0}")]
    CredentialMalformed(String),

    /// Only surfaces when the token minted by the refresh has itself expired.
    #[error("token expired")]
    CredentialExpired,

    #[error("refresh token is missing")]
    RefreshMissing,

    #[error("refresh token expired or invalid; log in again")]
    RefreshInvalidOrExpired,

    #[error("forbidden: {0}")]
    AuthorizationDenied(String),

    #[error(transparent)]
    DirectoryUnavailable(#[from] DirectoryError),

    #[error("token could not be issued: {0}")]
    Issue(String),
}

impl From<RefreshError> for AuthError {
    fn from(value: RefreshError) -> Self {
        match value {
            RefreshError::Missing => AuthError::RefreshMissing,
            RefreshError::InvalidOrExpired(_) => AuthError::RefreshInvalidOrExpired,
            RefreshError::SubjectMismatch => AuthError::CredentialMalformed(
                "access and refresh tokens belong to different subjects".to_string(),
            ),
            RefreshError::Issue(e) => AuthError::Issue(e.to_string()),
        }
    }
}

impl From<AuthzError> for AuthError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Directory(e) => AuthError::DirectoryUnavailable(e),
            denied => AuthError::AuthorizationDenied(denied.to_string()),
        }
    }
}

/// A request the guard let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub claims: SessionClaims,
    /// Set when the presented access token had expired and was replaced.
    pub renewed_access_token: Option<String>,
    pub transitions: Vec<GuardState>,
}

/// A request the guard turned away, with the path that led there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct Rejection {
    pub error: AuthError,
    pub transitions: Vec<GuardState>,
}

/// Handler output together with a renewed access token, if one was minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guarded<T> {
    pub output: T,
    pub renewed_access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestGuard {
    issuer: Arc<SessionIssuer>,
    policy: AuthorizationPolicy,
}

impl RequestGuard {
    pub fn new(issuer: Arc<SessionIssuer>, policy: AuthorizationPolicy) -> Self {
        Self { issuer, policy }
    }

    pub fn issuer(&self) -> &Arc<SessionIssuer> {
        &self.issuer
    }

    /// Run authentication then authorization for one request.
    pub fn check(
        &self,
        credentials: &Credentials,
        requirement: Requirement,
        ctx: &AuthorizationContext,
        now: DateTime<Utc>,
    ) -> Result<Admission, Rejection> {
        let mut trail = Vec::with_capacity(6);

        let outcome = self
            .authenticate(credentials, now, &mut trail)
            .and_then(|(claims, renewed)| {
                self.authorize(&claims, requirement, ctx, &mut trail)?;
                Ok((claims, renewed))
            });

        match outcome {
            Ok((claims, renewed_access_token)) => {
                debug!(
                    subject = %claims.sub,
                    %requirement,
                    refreshed = renewed_access_token.is_some(),
                    transitions = ?trail,
                    "request admitted"
                );
                Ok(Admission {
                    claims,
                    renewed_access_token,
                    transitions: trail,
                })
            }
            Err(error) => {
                warn!(%requirement, %error, transitions = ?trail, "request rejected");
                Err(Rejection {
                    error,
                    transitions: trail,
                })
            }
        }
    }

    /// Check, then hand the admitted claims to `handler`.
    ///
    /// The handler runs only on admission and its output is returned untouched.
    pub fn run<T, F>(
        &self,
        credentials: &Credentials,
        requirement: Requirement,
        ctx: &AuthorizationContext,
        now: DateTime<Utc>,
        handler: F,
    ) -> Result<Guarded<T>, Rejection>
    where
        F: FnOnce(&SessionClaims) -> T,
    {
        let admission = self.check(credentials, requirement, ctx, now)?;
        Ok(Guarded {
            output: handler(&admission.claims),
            renewed_access_token: admission.renewed_access_token,
        })
    }

    fn authenticate(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
        trail: &mut Vec<GuardState>,
    ) -> Result<(SessionClaims, Option<String>), AuthError> {
        let Some(token) = credentials.access.as_deref().filter(|t| !t.is_empty()) else {
            trail.push(GuardState::TokenMissing);
            return Err(AuthError::CredentialMissing);
        };

        match self.decode(token, now, trail) {
            Ok(claims) => Ok((claims, None)),
            Err(TokenError::Expired) => {
                // One refresh, one retry. A second expiry is returned as-is.
                let expired = self
                    .issuer
                    .codec()
                    .verify(token, TokenKind::Access)
                    .map_err(|e| AuthError::CredentialMalformed(e.to_string()))?;
                let fresh = self
                    .issuer
                    .renew(expired.sub, credentials.refresh.as_deref(), now)?;
                match self.decode(&fresh, now, trail) {
                    Ok(claims) => Ok((claims, Some(fresh))),
                    Err(TokenError::Expired) => Err(AuthError::CredentialExpired),
                    Err(e) => Err(AuthError::CredentialMalformed(e.to_string())),
                }
            }
            Err(e) => Err(AuthError::CredentialMalformed(e.to_string())),
        }
    }

    fn decode(
        &self,
        token: &str,
        now: DateTime<Utc>,
        trail: &mut Vec<GuardState>,
    ) -> Result<SessionClaims, TokenError> {
        trail.push(GuardState::Decoding);
        let decoded = self.issuer.codec().decode(token, TokenKind::Access, now);
        trail.push(match &decoded {
            Ok(_) => GuardState::Valid,
            Err(TokenError::Expired) => GuardState::Expired,
            Err(_) => GuardState::Malformed,
        });
        decoded
    }

    fn authorize(
        &self,
        claims: &SessionClaims,
        requirement: Requirement,
        ctx: &AuthorizationContext,
        trail: &mut Vec<GuardState>,
    ) -> Result<(), AuthError> {
        trail.push(GuardState::Authorizing);
        match self.policy.evaluate(requirement, claims, ctx) {
            Ok(()) => {
                trail.push(GuardState::Allowed);
                Ok(())
            }
            Err(e) => {
                trail.push(GuardState::Denied);
                Err(e.into())
            }
        }
    }
}
