//! `tokengate-auth`: session tokens and authorization guards.
//!
//! This crate is intentionally decoupled from HTTP and storage: credentials come
//! in as plain strings, membership comes from a [`MembershipDirectory`] the
//! caller supplies, and every time-dependent call takes `now` explicitly.

pub mod claims;
pub mod codec;
pub mod directory;
pub mod guard;
pub mod issuer;
pub mod policy;

pub use claims::{SessionClaims, TokenKind, TokenValidationError, validate_claims};
pub use codec::{SigningSecret, TokenCodec, TokenError};
pub use directory::{DirectoryError, MembershipDirectory};
pub use guard::{Admission, AuthError, Credentials, GuardState, Guarded, Rejection, RequestGuard};
pub use issuer::{RefreshError, SessionIssuer, SessionTokens, SessionTtl};
pub use policy::{AuthorizationContext, AuthorizationPolicy, AuthzError, Requirement};
