//! Role-based authorization
//!
//! Each [`Action`] declares the exact set of roles allowed to perform it.
//! [`Authorizer::authorize`] checks that set against the token's role and
//! then looks the user up live, so a suspension takes effect immediately
//! while a role change waits for the next login.

use std::sync::Arc;

use crate::auth::Principal;
use crate::error::{ApiError, ApiResult};
use crate::models::UserRole;
use crate::store::UserStore;

use UserRole::{Admin, Borrower, Manager};

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ViewProfile,
    ViewUser,
    ManageUsers,
    CreateLoanOffer,
    ListOwnLoanOffers,
    UpdateLoanOffer,
    DeleteLoanOffer,
    ToggleLoanOfferVisibility,
    ListAllLoanOffers,
    CreateApplication,
    ListOwnApplications,
    CancelApplication,
    PayApplicationFee,
    ViewApplication,
    ReviewApplications,
    DecideApplication,
}

impl Action {
    /// Roles allowed to perform this action. Ownership restrictions
    /// (a manager's own offers, a borrower's own application) are enforced
    /// by the operation itself.
    pub fn allowed_roles(&self) -> &'static [UserRole] {
        match self {
            Action::ViewProfile | Action::ViewUser => &[Borrower, Manager, Admin],
            Action::ManageUsers => &[Admin],
            Action::CreateLoanOffer | Action::ListOwnLoanOffers => &[Manager],
            Action::UpdateLoanOffer | Action::DeleteLoanOffer => &[Manager, Admin],
            Action::ToggleLoanOfferVisibility | Action::ListAllLoanOffers => &[Admin],
            Action::CreateApplication
            | Action::ListOwnApplications
            | Action::CancelApplication
            | Action::PayApplicationFee => &[Borrower],
            Action::ViewApplication => &[Borrower, Manager, Admin],
            Action::ReviewApplications | Action::DecideApplication => &[Manager, Admin],
        }
    }

    pub fn permits(&self, role: UserRole) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// Gatekeeper consulted by every protected operation
#[derive(Clone)]
pub struct Authorizer {
    users: Arc<dyn UserStore>,
}

impl Authorizer {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Allow `principal` to perform `action`, or say why not.
    ///
    /// * no principal → `Unauthorized`
    /// * role not in the action's set → `Forbidden`
    /// * user suspended → `Forbidden`
    /// * user no longer exists → `Unauthorized`
    pub async fn authorize<'a>(
        &self,
        principal: Option<&'a Principal>,
        action: Action,
    ) -> ApiResult<&'a Principal> {
        let principal = principal.ok_or_else(|| {
            ApiError::Unauthorized("Authentication required".to_string())
        })?;

        if !action.permits(principal.role) {
            tracing::debug!(
                user_id = %principal.id,
                role = %principal.role,
                action = ?action,
                "Role not permitted"
            );
            return Err(ApiError::Forbidden(format!(
                "Role {} may not perform {:?}",
                principal.role, action
            )));
        }

        let user = self
            .users
            .find_user_by_id(principal.id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

        if user.is_suspended() {
            tracing::debug!(user_id = %principal.id, action = ?action, "Suspended user denied");
            return Err(ApiError::Forbidden("Account is suspended".to_string()));
        }

        Ok(principal)
    }
}
