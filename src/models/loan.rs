//! Loan catalog models
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A loan product a manager publishes to the catalog
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanOffer {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub interest_rate: f64, // annual, percent
    pub min_amount: i64,
    pub max_amount: i64,
    pub created_by: String, // manager email
    pub show_on_home: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LoanOffer {
    pub fn accepts_amount(&self, amount: i64) -> bool {
        (self.min_amount..=self.max_amount).contains(&amount)
    }
}

/// Fields needed to insert an offer
#[derive(Debug, Clone)]
pub struct NewLoanOffer {
    pub title: String,
    pub description: String,
    pub category: String,
    pub interest_rate: f64,
    pub min_amount: i64,
    pub max_amount: i64,
    pub created_by: String,
    pub show_on_home: bool,
}

/// Request to create a loan offer
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_offer_bounds", skip_on_field_errors = false))]
pub struct CreateLoanOfferRequest {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 0.0, max = 100.0, message = "interest rate must be 0-100"))]
    pub interest_rate: f64,
    #[validate(range(min = 1, message = "minimum amount must be positive"))]
    pub min_amount: i64,
    #[validate(range(min = 1, message = "maximum amount must be positive"))]
    pub max_amount: i64,
    #[serde(default)]
    pub show_on_home: bool,
}

fn validate_offer_bounds(req: &CreateLoanOfferRequest) -> Result<(), ValidationError> {
    if req.min_amount > req.max_amount {
        return Err(ValidationError::new("min_amount_exceeds_max_amount"));
    }
    Ok(())
}

/// Partial update of an offer; absent fields stay as they are
#[derive(Debug, Default, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoanOfferPatch {
    #[validate(length(min = 1, message = "title cannot be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "interest rate must be 0-100"))]
    pub interest_rate: Option<f64>,
    #[validate(range(min = 1, message = "minimum amount must be positive"))]
    pub min_amount: Option<i64>,
    #[validate(range(min = 1, message = "maximum amount must be positive"))]
    pub max_amount: Option<i64>,
}

impl LoanOfferPatch {
    /// Whether `min <= max` still holds once the patch lands on `offer`
    pub fn keeps_bounds(&self, offer: &LoanOffer) -> bool {
        self.min_amount.unwrap_or(offer.min_amount) <= self.max_amount.unwrap_or(offer.max_amount)
    }

    /// Apply the patch onto an existing offer
    pub fn apply_to(&self, offer: &mut LoanOffer) {
        if let Some(title) = &self.title {
            offer.title = title.clone();
        }
        if let Some(description) = &self.description {
            offer.description = description.clone();
        }
        if let Some(category) = &self.category {
            offer.category = category.clone();
        }
        if let Some(rate) = self.interest_rate {
            offer.interest_rate = rate;
        }
        if let Some(min) = self.min_amount {
            offer.min_amount = min;
        }
        if let Some(max) = self.max_amount {
            offer.max_amount = max;
        }
    }
}

/// Visibility toggle payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowOnHomeRequest {
    pub show_on_home: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(min: i64, max: i64) -> CreateLoanOfferRequest {
        CreateLoanOfferRequest {
            title: "Small business".to_string(),
            description: String::new(),
            category: "business".to_string(),
            interest_rate: 9.5,
            min_amount: min,
            max_amount: max,
            show_on_home: false,
        }
    }

    #[test]
    fn test_offer_bounds_validation() {
        assert!(request(1_000, 50_000).validate().is_ok());
        assert!(request(50_000, 1_000).validate().is_err());
        assert!(request(0, 1_000).validate().is_err());
    }
}
