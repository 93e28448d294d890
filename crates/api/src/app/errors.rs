use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use tokengate_auth::{AuthError, RefreshError, TokenError};
use tokengate_core::DomainError;
use tokengate_infra::PasswordError;

/// Failure of a route handler, rendered as a JSON error body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Invalid(#[from] validator::ValidationErrors),

    #[error("invalid password")]
    InvalidCredentials,
}

impl From<RefreshError> for ApiError {
    fn from(value: RefreshError) -> Self {
        ApiError::Auth(value.into())
    }
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        ApiError::Auth(AuthError::Issue(value.to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Auth(e) => auth_error_to_response(&e),
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::Password(PasswordError::Empty) => {
                json_error(StatusCode::BAD_REQUEST, "validation_error", "password must not be empty")
            }
            ApiError::Password(PasswordError::Hash(msg)) => {
                tracing::error!(error = %msg, "password hashing failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
            }
            ApiError::Invalid(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
            ApiError::InvalidCredentials => {
                json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid password")
            }
        }
    }
}

pub fn auth_error_to_response(err: &AuthError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        AuthError::CredentialMissing => json_error(StatusCode::UNAUTHORIZED, "token_missing", message),
        AuthError::CredentialMalformed(_) => json_error(StatusCode::UNAUTHORIZED, "invalid_token", message),
        AuthError::CredentialExpired => json_error(StatusCode::UNAUTHORIZED, "token_expired", message),
        AuthError::RefreshMissing => {
            json_error(StatusCode::UNAUTHORIZED, "refresh_token_missing", message)
        }
        AuthError::RefreshInvalidOrExpired => {
            json_error(StatusCode::FORBIDDEN, "refresh_token_invalid", message)
        }
        AuthError::AuthorizationDenied(_) => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        AuthError::DirectoryUnavailable(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "directory_unavailable", message)
        }
        AuthError::Issue(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "token_issue_failed", message),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Unavailable(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_unavailable", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
