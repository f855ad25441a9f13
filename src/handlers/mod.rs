//! API handlers for the LoanLink backend

pub mod application;
pub mod auth;
pub mod loan;
pub mod system;
pub mod user;

pub use crate::middleware::MaybePrincipal;
