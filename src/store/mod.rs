//! Persistence seams for LoanLink
//!
//! Every service talks to the store through these traits. Each mutating
//! method maps onto one atomic store operation; the conditional ones
//! (`transition`, `record_fee_payment`, owner-scoped offer updates) only apply
//! when the record still matches the expected prior state, and report a miss
//! as `Ok(None)` / `Ok(false)` without touching the record.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ApplicationStatus, FeePayment, LoanApplication, LoanOffer, LoanOfferPatch, NewApplication,
    NewLoanOffer, NewUser, PageRequest, StatusTransition, User, UserRole, UserStatus,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Store call timed out")]
    Timeout,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter for loan offer listings
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    pub created_by: Option<String>,
    pub show_on_home: Option<bool>,
    pub page: PageRequest,
}

/// Filter for application listings
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub applicant_email: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub page: PageRequest,
}

/// Suspension bookkeeping written together with a status change
#[derive(Debug, Clone, Default)]
pub struct StatusNote {
    pub reason: Option<String>,
    pub feedback: Option<String>,
}

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; `Conflict` when the email is taken
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Case-insensitive substring match on name or email, newest first
    async fn search_users(&self, search: Option<&str>) -> StoreResult<Vec<User>>;

    async fn set_user_role(&self, id: Uuid, role: UserRole) -> StoreResult<Option<User>>;

    async fn set_user_status(
        &self,
        id: Uuid,
        status: UserStatus,
        note: StatusNote,
    ) -> StoreResult<Option<User>>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;
}

/// Loan catalog store
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn insert_offer(&self, offer: NewLoanOffer) -> StoreResult<LoanOffer>;

    async fn find_offer(&self, id: Uuid) -> StoreResult<Option<LoanOffer>>;

    /// Newest first
    async fn list_offers(&self, filter: LoanFilter) -> StoreResult<Vec<LoanOffer>>;

    /// Apply `patch` when the offer exists, belongs to `owner` if set, and
    /// keeps `min_amount <= max_amount` afterwards
    async fn update_offer(
        &self,
        id: Uuid,
        patch: LoanOfferPatch,
        owner: Option<&str>,
    ) -> StoreResult<Option<LoanOffer>>;

    async fn set_show_on_home(&self, id: Uuid, show: bool) -> StoreResult<Option<LoanOffer>>;

    /// Delete when the offer exists and, if `owner` is set, belongs to them
    async fn delete_offer(&self, id: Uuid, owner: Option<&str>) -> StoreResult<bool>;
}

/// Loan application store
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert with status `Pending` and fee `Unpaid`
    async fn insert_application(&self, application: NewApplication)
        -> StoreResult<LoanApplication>;

    async fn find_application(&self, id: Uuid) -> StoreResult<Option<LoanApplication>>;

    /// Newest first
    async fn list_applications(
        &self,
        filter: ApplicationFilter,
    ) -> StoreResult<Vec<LoanApplication>>;

    /// Compare-and-set on `status` (and owner, when given)
    async fn transition(
        &self,
        id: Uuid,
        transition: StatusTransition,
    ) -> StoreResult<Option<LoanApplication>>;

    /// Compare-and-set `Unpaid → Paid` for the owning applicant
    async fn record_fee_payment(
        &self,
        id: Uuid,
        payment: FeePayment,
    ) -> StoreResult<Option<LoanApplication>>;
}

/// Liveness probe used by `/health`
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Everything the services need from one backend
pub trait Store: UserStore + LoanStore + ApplicationStore + HealthCheck {}

impl<T> Store for T where T: UserStore + LoanStore + ApplicationStore + HealthCheck {}
