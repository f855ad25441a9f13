//! Route definitions for the LoanLink API

mod application;
mod auth;
mod loan;
mod user;

use axum::{routing::post, Router};

use crate::handlers::system;
use crate::state::AppState;

pub use application::application_routes;
pub use auth::auth_routes;
pub use loan::loan_routes;
pub use user::user_routes;

pub fn emi_routes() -> Router<AppState> {
    Router::new().route("/emi/calculate", post(system::calculate_emi))
}

/// Everything mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(loan_routes())
        .merge(application_routes())
        .merge(emi_routes())
        .fallback(system::api_not_found)
}
