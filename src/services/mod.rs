//! Business logic services for LoanLink

pub mod applications;
pub mod emi;
mod loans;
mod users;

pub use applications::ApplicationService;
pub use loans::LoanService;
pub use users::UserService;
