//! User administration routes

use axum::{
    routing::{delete, get, patch},
    Router,
};

use crate::handlers::user;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(user::list_users))
        .route("/users/email/:email", get(user::get_user_by_email))
        .route("/users/:id", delete(user::delete_user))
        .route("/users/:id/role", patch(user::update_role))
        .route("/users/:id/suspend", patch(user::suspend_user))
        .route("/users/:id/activate", patch(user::activate_user))
}
