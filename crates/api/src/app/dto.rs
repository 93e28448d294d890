use serde::{Deserialize, Serialize};
use validator::Validate;

use tokengate_core::{DomainError, DomainResult, UserId};
use tokengate_infra::Pagination;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirmed_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNameRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveIssueRequest {
    pub resolved: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl PageQuery {
    pub fn pagination(&self) -> DomainResult<Pagination> {
        Pagination::new(
            self.page.unwrap_or(Pagination::DEFAULT_PAGE),
            self.limit.unwrap_or(Pagination::DEFAULT_LIMIT),
        )
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// `{ "status": "success", "data": ... }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub user_id: UserId,
    pub is_root: bool,
}

// -------------------------
// Validation helpers
// -------------------------

/// Trimmed, non-empty value of a required field.
pub fn required<'a>(value: &'a Option<String>, field: &str) -> DomainResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("missing {field}")))
}

/// Required password, taken exactly as sent. Only the empty string is missing.
pub fn required_password<'a>(value: &'a Option<String>, field: &str) -> DomainResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("missing {field}")))
}
