//! Minting of access/refresh token pairs.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

use tokengate_core::UserId;

use crate::claims::{SessionClaims, TokenKind};
use crate::codec::{TokenCodec, TokenError};

/// Lifetimes of the two token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtl {
    pub access: Duration,
    pub refresh: Duration,
}

impl SessionTtl {
    pub const DEFAULT_ACCESS_SECS: i64 = 20;
    pub const DEFAULT_REFRESH_DAYS: i64 = 7;
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self {
            access: Duration::seconds(Self::DEFAULT_ACCESS_SECS),
            refresh: Duration::days(Self::DEFAULT_REFRESH_DAYS),
        }
    }
}

/// Both halves of a freshly issued session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The client did not present a refresh token at all.
    #[error("no refresh token presented")]
    Missing,

    /// The refresh token failed verification or has expired; log in again.
    #[error("refresh token rejected: {0}")]
    InvalidOrExpired(TokenError),

    /// The refresh token belongs to someone other than the expired access token.
    #[error("refresh token was issued to a different subject")]
    SubjectMismatch,

    /// The refresh token was fine but the new access token could not be signed.
    #[error("access token could not be issued: {0}")]
    Issue(TokenError),
}

/// Issues and refreshes session tokens.
///
/// Stateless: nothing about an issued token is remembered, so there is no
/// revocation short of the token's own expiry.
#[derive(Debug, Clone)]
pub struct SessionIssuer {
    codec: TokenCodec,
    ttl: SessionTtl,
}

impl SessionIssuer {
    pub fn new(codec: TokenCodec, ttl: SessionTtl) -> Self {
        Self { codec, ttl }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn ttl(&self) -> SessionTtl {
        self.ttl
    }

    pub fn issue_access_token(
        &self,
        user_id: UserId,
        is_root: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims::new(user_id, is_root, TokenKind::Access, now, self.ttl.access);
        self.codec.encode(&claims)
    }

    pub fn issue_refresh_token(
        &self,
        user_id: UserId,
        is_root: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = SessionClaims::new(user_id, is_root, TokenKind::Refresh, now, self.ttl.refresh);
        self.codec.encode(&claims)
    }

    /// Issue the access/refresh pair handed out at login.
    pub fn issue_pair(
        &self,
        user_id: UserId,
        is_root: bool,
        now: DateTime<Utc>,
    ) -> Result<SessionTokens, TokenError> {
        Ok(SessionTokens {
            access_token: self.issue_access_token(user_id, is_root, now)?,
            refresh_token: self.issue_refresh_token(user_id, is_root, now)?,
        })
    }

    /// Exchange a refresh token for a new access token with the same subject
    /// and root flag.
    pub fn refresh(
        &self,
        refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, RefreshError> {
        let claims = self.verify_refresh(refresh_token, now)?;
        self.mint_from(&claims, now)
    }

    /// Like [`refresh`](Self::refresh), but only for the subject of the expired
    /// access token being replaced.
    pub fn renew(
        &self,
        expired_subject: UserId,
        refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, RefreshError> {
        let claims = self.verify_refresh(refresh_token, now)?;
        if claims.sub != expired_subject {
            return Err(RefreshError::SubjectMismatch);
        }
        self.mint_from(&claims, now)
    }

    fn verify_refresh(
        &self,
        refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, RefreshError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(RefreshError::Missing)?;

        self.codec
            .decode(token, TokenKind::Refresh, now)
            .map_err(RefreshError::InvalidOrExpired)
    }

    fn mint_from(&self, claims: &SessionClaims, now: DateTime<Utc>) -> Result<String, RefreshError> {
        debug!(subject = %claims.sub, "minting access token from refresh token");

        self.issue_access_token(claims.sub, claims.is_root, now)
            .map_err(RefreshError::Issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SigningSecret;
    use chrono::TimeZone;

    fn issuer() -> SessionIssuer {
        SessionIssuer::new(TokenCodec::new(&SigningSecret::from("issuer-secret")), SessionTtl::default())
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn pair_carries_subject_and_root_flag() {
        let issuer = issuer();
        let user = UserId::new();
        let pair = issuer.issue_pair(user, true, t0()).unwrap();

        let access = issuer.codec().decode(&pair.access_token, TokenKind::Access, t0()).unwrap();
        let refresh = issuer.codec().decode(&pair.refresh_token, TokenKind::Refresh, t0()).unwrap();

        assert_eq!(access.sub, user);
        assert!(access.is_root);
        assert_eq!(access.expires_at - access.issued_at, Duration::seconds(20));
        assert_eq!(refresh.sub, user);
        assert!(refresh.is_root);
        assert_eq!(refresh.expires_at - refresh.issued_at, Duration::days(7));
    }

    #[test]
    fn refresh_mints_access_token_for_same_subject() {
        let issuer = issuer();
        let user = UserId::new();
        let refresh = issuer.issue_refresh_token(user, false, t0()).unwrap();

        let later = t0() + Duration::hours(30);
        let access = issuer.refresh(Some(&refresh), later).unwrap();
        let claims = issuer.codec().decode(&access, TokenKind::Access, later).unwrap();

        assert_eq!(claims.sub, user);
        assert!(!claims.is_root);
        assert_eq!(claims.issued_at, later);
    }

    #[test]
    fn refresh_without_token_is_missing() {
        let issuer = issuer();
        assert_eq!(issuer.refresh(None, t0()), Err(RefreshError::Missing));
        assert_eq!(issuer.refresh(Some(""), t0()), Err(RefreshError::Missing));
    }

    #[test]
    fn expired_refresh_token_is_rejected() {
        let issuer = issuer();
        let refresh = issuer.issue_refresh_token(UserId::new(), false, t0()).unwrap();

        let after = t0() + Duration::days(7) + Duration::seconds(1);
        assert_eq!(
            issuer.refresh(Some(&refresh), after),
            Err(RefreshError::InvalidOrExpired(TokenError::Expired))
        );
    }

    #[test]
    fn access_token_cannot_be_used_to_refresh() {
        let issuer = issuer();
        let access = issuer.issue_access_token(UserId::new(), false, t0()).unwrap();

        assert!(matches!(
            issuer.refresh(Some(&access), t0()),
            Err(RefreshError::InvalidOrExpired(TokenError::Malformed(_)))
        ));
    }

    #[test]
    fn renew_requires_matching_subject() {
        let issuer = issuer();
        let owner = UserId::new();
        let refresh = issuer.issue_refresh_token(owner, false, t0()).unwrap();

        assert_eq!(
            issuer.renew(UserId::new(), Some(&refresh), t0()),
            Err(RefreshError::SubjectMismatch)
        );
        let access = issuer.renew(owner, Some(&refresh), t0()).unwrap();
        assert_eq!(issuer.codec().decode(&access, TokenKind::Access, t0()).unwrap().sub, owner);
    }
}
