//! JWT token generation and validation
//!
//! Session tokens are HS256 JWTs carrying the user's id, email and the role
//! they held at login.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::Principal;
use crate::models::{User, UserRole};

/// Session lifetime
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Session lifetime in seconds, as reported to clients
pub const TOKEN_TTL_SECONDS: i64 = TOKEN_TTL_DAYS * 24 * 60 * 60;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims for session tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Role at login time
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Identity carried by the token
    pub fn principal(&self) -> Result<Principal, JwtError> {
        let id = Uuid::parse_str(&self.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        let role = self
            .role
            .parse::<UserRole>()
            .map_err(JwtError::InvalidToken)?;

        Ok(Principal {
            id,
            email: self.email.clone(),
            role,
        })
    }
}

/// Generate a session token for a user
pub fn generate_token(user: &User, secret: &str) -> Result<String, JwtError> {
    issue_token(user, secret, Duration::days(TOKEN_TTL_DAYS))
}

fn issue_token(user: &User, secret: &str, ttl: Duration) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + ttl;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.as_str().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify and decode a JWT token
///
/// # Returns
/// * `Ok(Claims)` if token is valid
/// * `Err(JwtError::TokenExpired)` past `exp`
/// * `Err(JwtError::DecodingFailed)` for anything malformed or badly signed
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;

    fn create_test_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            name: Some("Test User".to_string()),
            photo_url: None,
            password_hash: None,
            role,
            status: UserStatus::Active,
            suspend_reason: None,
            suspend_feedback: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_token() {
        let user = create_test_user(UserRole::Manager);
        let secret = "test-secret-key";

        let token = generate_token(&user, secret).unwrap();
        assert!(!token.is_empty());

        let claims = verify_token(&token, secret).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECONDS);

        let principal = claims.principal().unwrap();
        assert_eq!(principal.id, user.id);
        assert_eq!(principal.role, UserRole::Manager);
    }

    #[test]
    fn test_invalid_token() {
        let secret = "test-secret-key";
        let result = verify_token("invalid.token.here", secret);
        assert!(matches!(result, Err(JwtError::DecodingFailed(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let user = create_test_user(UserRole::Borrower);

        let token = generate_token(&user, "secret1").unwrap();
        let result = verify_token(&token, "secret2");
        assert!(result.is_err());
    }

    #[test]
    fn test_expired_token() {
        let user = create_test_user(UserRole::Borrower);
        let token = issue_token(&user, "secret", Duration::hours(-1)).unwrap();

        assert!(matches!(
            verify_token(&token, "secret"),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_unknown_role_claim_is_invalid() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "x@example.com".to_string(),
            role: "superuser".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(matches!(claims.principal(), Err(JwtError::InvalidToken(_))));
    }
}
