//! Loan application lifecycle
//!
//! ```text
//!            approve            (manager, admin)
//!          ┌─────────▶ Approved
//! Pending ─┼─────────▶ Rejected   (manager, admin)
//!          └─────────▶ Cancelled  (owning borrower)
//!
//! fee: Unpaid ──pay──▶ Paid       (owning borrower)
//! ```
//!
//! Every edge is one compare-and-set store call. When it misses, the record
//! is read back to tell the caller why.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::authz::{Action, Authorizer};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ApplicationStatus, CreateApplicationRequest, FeePayment, ListApplicationsQuery,
    LoanApplication, NewApplication, PageRequest, PaginationParams, PayFeeRequest,
    StatusTransition, UserRole,
};
use crate::store::{ApplicationFilter, ApplicationStore, LoanStore};

/// Loan application service
#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationStore>,
    loans: Arc<dyn LoanStore>,
    authz: Authorizer,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        loans: Arc<dyn LoanStore>,
        authz: Authorizer,
    ) -> Self {
        Self {
            applications,
            loans,
            authz,
        }
    }

    /// Open a new application for the calling borrower
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        req: CreateApplicationRequest,
    ) -> ApiResult<LoanApplication> {
        let principal = self
            .authz
            .authorize(principal, Action::CreateApplication)
            .await?;
        req.validate()?;

        if let Some(loan_id) = req.loan_id {
            let offer = self
                .loans
                .find_offer(loan_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Loan offer {}", loan_id)))?;
            if !offer.accepts_amount(req.requested_amount) {
                return Err(ApiError::ValidationError(format!(
                    "Requested amount must be between {} and {}",
                    offer.min_amount, offer.max_amount
                )));
            }
        }

        let application = self
            .applications
            .insert_application(NewApplication {
                applicant_email: principal.email.clone(),
                applicant_name: req.applicant_name,
                loan_id: req.loan_id,
                requested_amount: req.requested_amount,
                purpose: req.purpose,
            })
            .await?;

        tracing::info!(
            application_id = %application.id,
            applicant = %application.applicant_email,
            amount = application.requested_amount,
            "Application created"
        );

        Ok(application)
    }

    /// Fetch one application. Borrowers only see their own.
    pub async fn get(&self, principal: Option<&Principal>, id: Uuid) -> ApiResult<LoanApplication> {
        let principal = self
            .authz
            .authorize(principal, Action::ViewApplication)
            .await?;

        let application = self
            .applications
            .find_application(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if principal.role == UserRole::Borrower && application.applicant_email != principal.email {
            return Err(ApiError::Forbidden(
                "Application belongs to another applicant".to_string(),
            ));
        }

        Ok(application)
    }

    /// The calling borrower's applications, newest first
    pub async fn mine(
        &self,
        principal: Option<&Principal>,
        pagination: PaginationParams,
    ) -> ApiResult<Vec<LoanApplication>> {
        let principal = self
            .authz
            .authorize(principal, Action::ListOwnApplications)
            .await?;

        Ok(self
            .applications
            .list_applications(ApplicationFilter {
                applicant_email: Some(principal.email.clone()),
                status: None,
                page: pagination.into(),
            })
            .await?)
    }

    /// Review listing for managers and admins
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        query: ListApplicationsQuery,
    ) -> ApiResult<Vec<LoanApplication>> {
        self.authz
            .authorize(principal, Action::ReviewApplications)
            .await?;

        Ok(self
            .applications
            .list_applications(ApplicationFilter {
                applicant_email: query.email.clone().filter(|e| !e.is_empty()),
                status: query.status,
                page: PageRequest::from(query.pagination()),
            })
            .await?)
    }

    pub async fn approve(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
    ) -> ApiResult<LoanApplication> {
        self.decide(principal, id, ApplicationStatus::Approved).await
    }

    pub async fn reject(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
    ) -> ApiResult<LoanApplication> {
        self.decide(principal, id, ApplicationStatus::Rejected).await
    }

    async fn decide(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        to: ApplicationStatus,
    ) -> ApiResult<LoanApplication> {
        let principal = self
            .authz
            .authorize(principal, Action::DecideApplication)
            .await?;

        self.transition(principal, id, to, None).await
    }

    /// Withdraw a pending application; owner only
    pub async fn cancel(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
    ) -> ApiResult<LoanApplication> {
        let principal = self
            .authz
            .authorize(principal, Action::CancelApplication)
            .await?;

        self.transition(
            principal,
            id,
            ApplicationStatus::Cancelled,
            Some(principal.email.clone()),
        )
        .await
    }

    async fn transition(
        &self,
        principal: &Principal,
        id: Uuid,
        to: ApplicationStatus,
        owner: Option<String>,
    ) -> ApiResult<LoanApplication> {
        let transition =
            StatusTransition::new(ApplicationStatus::Pending, to, owner.clone(), Utc::now())
                .ok_or_else(|| {
                    ApiError::InvalidTransition(format!("Pending cannot move to {}", to))
                })?;

        match self.applications.transition(id, transition).await? {
            Some(application) => {
                tracing::info!(
                    application_id = %id,
                    actor = %principal.email,
                    status = %to,
                    "Application status changed"
                );
                Ok(application)
            }
            None => {
                let current = self.classify_miss(id, owner.as_deref()).await?;
                if current.status.is_terminal() {
                    Err(ApiError::InvalidTransition(format!(
                        "Application is {}; cannot move to {}",
                        current.status, to
                    )))
                } else {
                    Err(ApiError::Conflict(format!(
                        "Application {} changed concurrently",
                        id
                    )))
                }
            }
        }
    }

    /// Record the application fee; owner only, once
    pub async fn pay_fee(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        req: PayFeeRequest,
    ) -> ApiResult<LoanApplication> {
        let principal = self
            .authz
            .authorize(principal, Action::PayApplicationFee)
            .await?;
        req.validate()?;

        let payment = FeePayment {
            applicant_email: principal.email.clone(),
            transaction_id: req.transaction_id,
            paid_at: Utc::now(),
        };

        match self.applications.record_fee_payment(id, payment).await? {
            Some(application) => {
                tracing::info!(
                    application_id = %id,
                    transaction_id = ?application.transaction_id,
                    "Application fee paid"
                );
                Ok(application)
            }
            None => {
                self.classify_miss(id, Some(&principal.email)).await?;
                Err(ApiError::InvalidTransition(
                    "Application fee is already paid".to_string(),
                ))
            }
        }
    }

    /// Re-read after a compare-and-set miss. Returns the record when the
    /// miss was a genuine state conflict, otherwise the matching error.
    async fn classify_miss(&self, id: Uuid, owner: Option<&str>) -> ApiResult<LoanApplication> {
        let current = self
            .applications
            .find_application(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        if let Some(owner) = owner {
            if current.applicant_email != owner {
                return Err(ApiError::Forbidden(
                    "Application belongs to another applicant".to_string(),
                ));
            }
        }

        Ok(current)
    }
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Application {}", id))
}
