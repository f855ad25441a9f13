//! Data models for LoanLink backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

pub mod application;
pub mod loan;
pub use application::*;
pub use loan::*;

/// User model
#[derive(Debug, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    /// Absent for users created through passwordless login
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub suspend_reason: Option<String>,
    pub suspend_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_suspended(&self) -> bool {
        self.status == UserStatus::Suspended
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            role: user.role,
            status: user.status,
            suspend_reason: user.suspend_reason,
            suspend_feedback: user.suspend_feedback,
            created_at: user.created_at,
        }
    }
}

/// User roles
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Borrower,
    Manager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Borrower => "borrower",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borrower" => Ok(UserRole::Borrower),
            "manager" => Ok(UserRole::Manager),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Account status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub password_hash: Option<String>,
    pub role: UserRole,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub photo_url: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Registration payload
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub photo_url: Option<String>,
}

/// Login payload; omitting the password selects the passwordless path
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    pub password: Option<String>,
    pub name: Option<String>,
    pub photo_url: Option<String>,
}

/// Issued session token
#[derive(Debug, Serialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Admin role change
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Admin suspension note
#[derive(Debug, Default, Deserialize)]
pub struct SuspendRequest {
    pub reason: Option<String>,
    pub feedback: Option<String>,
}

/// Query for the admin user listing
#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

/// Generic message body
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination parameters
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalised page window: `limit == None` means everything from `offset`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: Option<i64>,
}

impl PageRequest {
    /// Pages are 1-based; a missing or non-positive limit disables paging.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let limit = limit.filter(|l| *l > 0);
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let offset = match limit {
            Some(l) => (page - 1).saturating_mul(l),
            None => 0,
        };
        Self { offset, limit }
    }

    /// Apply the window to an already ordered in-memory sequence
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset.max(0) as usize);
        match self.limit {
            Some(l) => skipped.take(l as usize).collect(),
            None => skipped.collect(),
        }
    }
}

impl From<PaginationParams> for PageRequest {
    fn from(params: PaginationParams) -> Self {
        PageRequest::new(params.page, params.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::Borrower, UserRole::Manager, UserRole::Admin] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_page_request_defaults_to_everything() {
        let page = PageRequest::new(None, None);
        assert_eq!(page, PageRequest { offset: 0, limit: None });
        assert_eq!(page.apply(1..=5), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_page_request_windows() {
        let page = PageRequest::new(Some(2), Some(2));
        assert_eq!(page.offset, 2);
        assert_eq!(page.apply(1..=5), vec![3, 4]);

        // Bogus values fall back to page 1 / unlimited
        let page = PageRequest::new(Some(0), Some(-3));
        assert_eq!(page, PageRequest { offset: 0, limit: None });
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            name: "Rahim".to_string(),
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
            photo_url: None,
        };
        assert!(req.validate().is_err());
    }
}
