//! Authentication service
//!
//! Registration, password and passwordless login, and token verification.

use std::sync::Arc;
use validator::Validate;

use crate::config::DuplicateEmailPolicy;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, NewUser, RegisterRequest, User, UserRole};
use crate::store::{StoreError, UserStore};

use super::jwt::{generate_token, verify_token};
use super::password::{hash_password, verify_password};
use super::Principal;

/// Email as stored: surrounding whitespace dropped, case kept
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    bcrypt_cost: u32,
    duplicate_email_policy: DuplicateEmailPolicy,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        users: Arc<dyn UserStore>,
        jwt_secret: String,
        bcrypt_cost: u32,
        duplicate_email_policy: DuplicateEmailPolicy,
    ) -> Self {
        Self {
            users,
            jwt_secret,
            bcrypt_cost,
            duplicate_email_policy,
        }
    }

    /// Create a borrower account with a password
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<User> {
        req.validate()?;
        let email = normalize_email(&req.email);

        if self.duplicate_email_policy == DuplicateEmailPolicy::ReturnExisting {
            if let Some(existing) = self.users.find_user_by_email(&email).await? {
                tracing::debug!(email = %email, "Registration for existing email, returning stored user");
                return Ok(existing);
            }
        }

        let password_hash = hash_password(req.password, self.bcrypt_cost).await?;
        let new_user = NewUser {
            email: email.clone(),
            name: Some(req.name),
            photo_url: req.photo_url,
            password_hash: Some(password_hash),
            role: UserRole::Borrower,
        };

        match self.users.insert_user(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %user.email, "User registered");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => match self.duplicate_email_policy {
                DuplicateEmailPolicy::Conflict => Err(ApiError::Conflict(format!(
                    "Email {} is already registered",
                    email
                ))),
                // Lost an insert race; the winner's record is the answer
                DuplicateEmailPolicy::ReturnExisting => self
                    .users
                    .find_user_by_email(&email)
                    .await?
                    .ok_or_else(|| {
                        ApiError::InternalError("User vanished after conflict".to_string())
                    }),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Log in and issue a session token.
    ///
    /// With a password the stored bcrypt hash must match. Without one the
    /// user is fetched or created as a borrower (federated sign-in).
    pub async fn login(&self, req: LoginRequest) -> ApiResult<(User, String)> {
        req.validate()?;
        let email = normalize_email(&req.email);

        let user = match req.password {
            Some(password) => {
                let user = self
                    .users
                    .find_user_by_email(&email)
                    .await?
                    .ok_or(ApiError::InvalidCredentials)?;
                let hash = user
                    .password_hash
                    .clone()
                    .ok_or(ApiError::InvalidCredentials)?;
                if !verify_password(password, hash).await? {
                    tracing::debug!(email = %email, "Password mismatch");
                    return Err(ApiError::InvalidCredentials);
                }
                user
            }
            None => self.upsert_passwordless(&email, req.name, req.photo_url).await?,
        };

        let token = generate_token(&user, &self.jwt_secret)?;
        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok((user, token))
    }

    async fn upsert_passwordless(
        &self,
        email: &str,
        name: Option<String>,
        photo_url: Option<String>,
    ) -> ApiResult<User> {
        if let Some(user) = self.users.find_user_by_email(email).await? {
            return Ok(user);
        }

        let new_user = NewUser {
            email: email.to_string(),
            name,
            photo_url,
            password_hash: None,
            role: UserRole::Borrower,
        };

        match self.users.insert_user(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, email = %user.email, "User created on first login");
                Ok(user)
            }
            Err(StoreError::Conflict(_)) => self
                .users
                .find_user_by_email(email)
                .await?
                .ok_or_else(|| ApiError::InternalError("User vanished after conflict".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Verify a session token. Does not touch the store.
    pub fn authenticate(&self, token: &str) -> ApiResult<Principal> {
        let claims = verify_token(token, &self.jwt_secret)?;
        Ok(claims.principal()?)
    }
}
