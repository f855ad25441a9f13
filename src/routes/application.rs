//! Loan application routes

use axum::{
    routing::{get, patch},
    Router,
};

use crate::handlers::application;
use crate::state::AppState;

pub fn application_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            get(application::list_applications).post(application::create_application),
        )
        .route("/applications/mine", get(application::my_applications))
        .route("/applications/:id", get(application::get_application))
        .route(
            "/applications/:id/approve",
            patch(application::approve_application),
        )
        .route(
            "/applications/:id/reject",
            patch(application::reject_application),
        )
        .route(
            "/applications/:id/cancel",
            patch(application::cancel_application),
        )
        .route(
            "/applications/:id/pay",
            patch(application::pay_application_fee),
        )
}
