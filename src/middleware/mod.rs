//! Middleware for the LoanLink API
//!
//! Request tracing, security headers, and session extraction.

pub mod auth;
mod security;
mod tracing;

pub use auth::{MaybePrincipal, SESSION_COOKIE};
pub use security::{hsts_header, security_headers};
pub use self::tracing::request_tracing;
