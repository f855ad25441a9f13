//! Loan catalog service

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::Principal;
use crate::authz::{Action, Authorizer};
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateLoanOfferRequest, LoanOffer, LoanOfferPatch, NewLoanOffer, PaginationParams, UserRole,
};
use crate::store::{LoanFilter, LoanStore};

/// Loan catalog service
#[derive(Clone)]
pub struct LoanService {
    store: Arc<dyn LoanStore>,
    authz: Authorizer,
}

impl LoanService {
    pub fn new(store: Arc<dyn LoanStore>, authz: Authorizer) -> Self {
        Self { store, authz }
    }

    /// Public catalog, newest first
    pub async fn list(&self, pagination: PaginationParams) -> ApiResult<Vec<LoanOffer>> {
        Ok(self
            .store
            .list_offers(LoanFilter {
                page: pagination.into(),
                ..Default::default()
            })
            .await?)
    }

    /// Offers flagged for the home page
    pub async fn home(&self) -> ApiResult<Vec<LoanOffer>> {
        Ok(self
            .store
            .list_offers(LoanFilter {
                show_on_home: Some(true),
                ..Default::default()
            })
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<LoanOffer> {
        self.store
            .find_offer(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(
        &self,
        principal: Option<&Principal>,
        req: CreateLoanOfferRequest,
    ) -> ApiResult<LoanOffer> {
        let principal = self
            .authz
            .authorize(principal, Action::CreateLoanOffer)
            .await?;
        req.validate()?;

        let offer = self
            .store
            .insert_offer(NewLoanOffer {
                title: req.title,
                description: req.description,
                category: req.category,
                interest_rate: req.interest_rate,
                min_amount: req.min_amount,
                max_amount: req.max_amount,
                created_by: principal.email.clone(),
                show_on_home: req.show_on_home,
            })
            .await?;

        tracing::info!(loan_id = %offer.id, created_by = %offer.created_by, "Loan offer created");
        Ok(offer)
    }

    /// The calling manager's own offers
    pub async fn mine(
        &self,
        principal: Option<&Principal>,
        pagination: PaginationParams,
    ) -> ApiResult<Vec<LoanOffer>> {
        let principal = self
            .authz
            .authorize(principal, Action::ListOwnLoanOffers)
            .await?;

        Ok(self
            .store
            .list_offers(LoanFilter {
                created_by: Some(principal.email.clone()),
                show_on_home: None,
                page: pagination.into(),
            })
            .await?)
    }

    /// Every offer, for admins
    pub async fn all(
        &self,
        principal: Option<&Principal>,
        pagination: PaginationParams,
    ) -> ApiResult<Vec<LoanOffer>> {
        self.authz
            .authorize(principal, Action::ListAllLoanOffers)
            .await?;

        Ok(self
            .store
            .list_offers(LoanFilter {
                page: pagination.into(),
                ..Default::default()
            })
            .await?)
    }

    /// Managers may only edit their own offers; admins may edit any
    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        patch: LoanOfferPatch,
    ) -> ApiResult<LoanOffer> {
        let principal = self
            .authz
            .authorize(principal, Action::UpdateLoanOffer)
            .await?;
        patch.validate()?;

        let owner = owner_scope(principal);
        match self.store.update_offer(id, patch.clone(), owner).await? {
            Some(offer) => {
                tracing::info!(loan_id = %id, actor = %principal.email, "Loan offer updated");
                Ok(offer)
            }
            None => match self.owned_offer(id, owner).await {
                Err(e) => Err(e),
                Ok(current) if !patch.keeps_bounds(&current) => Err(ApiError::ValidationError(
                    "minimum amount cannot exceed maximum amount".to_string(),
                )),
                Ok(_) => Err(changed_concurrently(id)),
            },
        }
    }

    pub async fn set_show_on_home(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        show: bool,
    ) -> ApiResult<LoanOffer> {
        self.authz
            .authorize(principal, Action::ToggleLoanOfferVisibility)
            .await?;

        let offer = self
            .store
            .set_show_on_home(id, show)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(loan_id = %id, show_on_home = show, "Loan offer visibility changed");
        Ok(offer)
    }

    pub async fn delete(&self, principal: Option<&Principal>, id: Uuid) -> ApiResult<()> {
        let principal = self
            .authz
            .authorize(principal, Action::DeleteLoanOffer)
            .await?;

        let owner = owner_scope(principal);
        if self.store.delete_offer(id, owner).await? {
            tracing::info!(loan_id = %id, actor = %principal.email, "Loan offer deleted");
            Ok(())
        } else {
            Err(self.classify_miss(id, owner).await)
        }
    }

    async fn owned_offer(&self, id: Uuid, owner: Option<&str>) -> ApiResult<LoanOffer> {
        let offer = self.get(id).await?;
        match owner {
            Some(owner) if offer.created_by != owner => Err(not_owner()),
            _ => Ok(offer),
        }
    }

    /// Explain why an owner-scoped write touched nothing
    async fn classify_miss(&self, id: Uuid, owner: Option<&str>) -> ApiError {
        match self.owned_offer(id, owner).await {
            Err(e) => e,
            Ok(_) => changed_concurrently(id),
        }
    }
}

/// Managers are confined to their own offers
fn owner_scope(principal: &Principal) -> Option<&str> {
    match principal.role {
        UserRole::Admin => None,
        _ => Some(principal.email.as_str()),
    }
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Loan offer {}", id))
}

fn changed_concurrently(id: Uuid) -> ApiError {
    ApiError::Conflict(format!("Loan offer {} changed concurrently", id))
}

fn not_owner() -> ApiError {
    ApiError::Forbidden("Loan offer belongs to another manager".to_string())
}
