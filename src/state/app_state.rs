//! Application state shared across handlers

use std::sync::Arc;

use crate::auth::AuthService;
use crate::authz::Authorizer;
use crate::config::Config;
use crate::services::{ApplicationService, LoanService, UserService};
use crate::store::{HealthCheck, Store};

use axum::extract::FromRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub loan_service: Arc<LoanService>,
    pub application_service: Arc<ApplicationService>,
    pub health: Arc<dyn HealthCheck>,
    /// Set the session cookie `Secure` flag
    pub secure_cookies: bool,
}

impl AppState {
    /// Wire every service onto one store backend
    pub fn new<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: Store + 'static,
    {
        let authz = Authorizer::new(store.clone());

        Self {
            auth_service: Arc::new(AuthService::new(
                store.clone(),
                config.jwt_secret.clone(),
                config.bcrypt_cost,
                config.duplicate_email_policy,
            )),
            user_service: Arc::new(UserService::new(store.clone(), authz.clone())),
            loan_service: Arc::new(LoanService::new(store.clone(), authz.clone())),
            application_service: Arc::new(ApplicationService::new(
                store.clone(),
                store.clone(),
                authz,
            )),
            health: store,
            secure_cookies: config.environment.is_production(),
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
