//! User administration

use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{normalize_email, Principal};
use crate::authz::{Action, Authorizer};
use crate::error::{ApiError, ApiResult};
use crate::models::{SuspendRequest, User, UserRole, UserStatus};
use crate::store::{StatusNote, UserStore};

/// User service
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    authz: Authorizer,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, authz: Authorizer) -> Self {
        Self { users, authz }
    }

    /// The caller's own record
    pub async fn profile(&self, principal: Option<&Principal>) -> ApiResult<User> {
        let principal = self.authz.authorize(principal, Action::ViewProfile).await?;
        self.find(principal.id).await
    }

    pub async fn get_by_email(&self, principal: Option<&Principal>, email: &str) -> ApiResult<User> {
        self.authz.authorize(principal, Action::ViewUser).await?;

        let email = normalize_email(email);
        self.users
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("User {}", email)))
    }

    /// Admin listing with optional case-insensitive name/email search
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        search: Option<&str>,
    ) -> ApiResult<Vec<User>> {
        self.authz.authorize(principal, Action::ManageUsers).await?;
        Ok(self.users.search_users(search.map(str::trim)).await?)
    }

    pub async fn set_role(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        role: UserRole,
    ) -> ApiResult<User> {
        let principal = self.authz.authorize(principal, Action::ManageUsers).await?;
        if principal.id == id && role != UserRole::Admin {
            return Err(self_lockout("demote"));
        }

        let user = self
            .users
            .set_user_role(id, role)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(user_id = %id, role = %role, actor = %principal.email, "User role changed");
        Ok(user)
    }

    pub async fn suspend(
        &self,
        principal: Option<&Principal>,
        id: Uuid,
        req: SuspendRequest,
    ) -> ApiResult<User> {
        let principal = self.authz.authorize(principal, Action::ManageUsers).await?;
        if principal.id == id {
            return Err(self_lockout("suspend"));
        }

        let note = StatusNote {
            reason: req.reason,
            feedback: req.feedback,
        };
        let user = self
            .users
            .set_user_status(id, UserStatus::Suspended, note)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(user_id = %id, actor = %principal.email, "User suspended");
        Ok(user)
    }

    /// Lift a suspension and clear its reason
    pub async fn activate(&self, principal: Option<&Principal>, id: Uuid) -> ApiResult<User> {
        let principal = self.authz.authorize(principal, Action::ManageUsers).await?;

        let user = self
            .users
            .set_user_status(id, UserStatus::Active, StatusNote::default())
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(user_id = %id, actor = %principal.email, "User activated");
        Ok(user)
    }

    pub async fn delete(&self, principal: Option<&Principal>, id: Uuid) -> ApiResult<()> {
        let principal = self.authz.authorize(principal, Action::ManageUsers).await?;
        if principal.id == id {
            return Err(self_lockout("delete"));
        }

        if !self.users.delete_user(id).await? {
            return Err(not_found(id));
        }

        tracing::info!(user_id = %id, actor = %principal.email, "User deleted");
        Ok(())
    }

    async fn find(&self, id: Uuid) -> ApiResult<User> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("User {}", id))
}

fn self_lockout(what: &str) -> ApiError {
    ApiError::Forbidden(format!("Admins cannot {} themselves", what))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::MemoryStore;

    async fn setup() -> (UserService, Principal, User) {
        let store = Arc::new(MemoryStore::new());
        let admin = store
            .insert_user(NewUser {
                email: "admin@example.com".to_string(),
                name: Some("Admin".to_string()),
                photo_url: None,
                password_hash: None,
                role: UserRole::Admin,
            })
            .await
            .unwrap();
        let borrower = store
            .insert_user(NewUser {
                email: "bo@example.com".to_string(),
                name: Some("Bo".to_string()),
                photo_url: None,
                password_hash: None,
                role: UserRole::Borrower,
            })
            .await
            .unwrap();
        let principal = Principal {
            id: admin.id,
            email: admin.email,
            role: UserRole::Admin,
        };
        let service = UserService::new(store.clone(), Authorizer::new(store));
        (service, principal, borrower)
    }

    #[tokio::test]
    async fn test_admin_cannot_lock_themselves_out() {
        let (service, admin, _) = setup().await;

        for result in [
            service
                .suspend(Some(&admin), admin.id, SuspendRequest::default())
                .await
                .map(|_| ()),
            service
                .set_role(Some(&admin), admin.id, UserRole::Borrower)
                .await
                .map(|_| ()),
            service.delete(Some(&admin), admin.id).await,
        ] {
            assert!(matches!(result, Err(ApiError::Forbidden(_))));
        }
    }

    #[tokio::test]
    async fn test_suspend_and_activate() {
        let (service, admin, borrower) = setup().await;

        let suspended = service
            .suspend(
                Some(&admin),
                borrower.id,
                SuspendRequest {
                    reason: Some("fraud".to_string()),
                    feedback: None,
                },
            )
            .await
            .unwrap();
        assert!(suspended.is_suspended());
        assert_eq!(suspended.suspend_reason.as_deref(), Some("fraud"));

        let active = service.activate(Some(&admin), borrower.id).await.unwrap();
        assert!(!active.is_suspended());
        assert!(active.suspend_reason.is_none());
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let (service, admin, _) = setup().await;
        assert!(matches!(
            service.delete(Some(&admin), Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_email_matches_case_exactly() {
        let (service, admin, borrower) = setup().await;
        let found = service
            .get_by_email(Some(&admin), " bo@example.com")
            .await
            .unwrap();
        assert_eq!(found.id, borrower.id);

        assert!(matches!(
            service.get_by_email(Some(&admin), "BO@example.com").await,
            Err(ApiError::NotFound(_))
        ));
    }
}
