//! LoanLink Backend Library
//!
//! Core modules for the LoanLink loan-management server: authentication,
//! role-based authorization, the loan catalog and the loan application
//! lifecycle.

pub mod app;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

pub use app::build_router;
pub use state::AppState;
