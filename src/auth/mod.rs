//! Authentication module for LoanLink
//!
//! - Password (bcrypt) and passwordless login
//! - JWT session token generation and validation
//! - Registration with a configurable duplicate-email policy

mod jwt;
mod password;
mod service;

use serde::Serialize;
use uuid::Uuid;

use crate::models::UserRole;

pub use jwt::{generate_token, verify_token, Claims, JwtError, TOKEN_TTL_DAYS, TOKEN_TTL_SECONDS};
pub use password::{hash_password, verify_password};
pub use service::{normalize_email, AuthService};

/// Verified identity of a caller, as carried by their session token.
///
/// `role` is the login-time snapshot; a role change takes effect at the next
/// login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}
