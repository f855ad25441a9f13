//! Loan catalog routes

use axum::{
    routing::{get, patch},
    Router,
};

use crate::handlers::loan;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(loan::list_loans).post(loan::create_loan))
        .route("/loans/home", get(loan::home_loans))
        .route("/loans/mine", get(loan::my_loans))
        .route("/loans/all", get(loan::all_loans))
        .route(
            "/loans/:id",
            get(loan::get_loan)
                .patch(loan::update_loan)
                .delete(loan::delete_loan),
        )
        .route("/loans/:id/show-on-home", patch(loan::set_show_on_home))
}
