//! Loan application models and the status machine that governs them
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use super::PaginationParams;

/// Loan application model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LoanApplication {
    pub id: Uuid,
    pub applicant_email: String,
    pub applicant_name: Option<String>,
    pub loan_id: Option<Uuid>,
    pub requested_amount: i64,
    pub purpose: String,
    pub status: ApplicationStatus,
    pub fee_status: FeeStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application status.
///
/// `Pending` is the only non-terminal state; every other state has no
/// outgoing transition.
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "rejected")]
    Rejected,
    #[serde(alias = "cancelled")]
    Cancelled,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    /// Whether `self → next` is an edge of the status machine
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (
                ApplicationStatus::Pending,
                ApplicationStatus::Approved
                    | ApplicationStatus::Rejected
                    | ApplicationStatus::Cancelled
            )
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application fee status
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Default)]
#[sqlx(type_name = "fee_status", rename_all = "lowercase")]
pub enum FeeStatus {
    #[default]
    Unpaid,
    Paid,
}

/// A compare-and-set status change: applied only while the record is still
/// in `from` (and, when set, still owned by `applicant_email`).
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    pub applicant_email: Option<String>,
    pub at: DateTime<Utc>,
}

impl StatusTransition {
    /// A transition along an edge of the status machine; `None` otherwise
    pub fn new(
        from: ApplicationStatus,
        to: ApplicationStatus,
        applicant_email: Option<String>,
        at: DateTime<Utc>,
    ) -> Option<Self> {
        from.can_transition_to(to).then_some(Self {
            from,
            to,
            applicant_email,
            at,
        })
    }

    /// `approved_at` value written alongside the status
    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        (self.to == ApplicationStatus::Approved).then_some(self.at)
    }
}

/// Payment info recorded when the fee is settled
#[derive(Debug, Clone)]
pub struct FeePayment {
    pub applicant_email: String,
    pub transaction_id: String,
    pub paid_at: DateTime<Utc>,
}

/// Fields needed to insert an application
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub applicant_email: String,
    pub applicant_name: Option<String>,
    pub loan_id: Option<Uuid>,
    pub requested_amount: i64,
    pub purpose: String,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to open a new application
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub loan_id: Option<Uuid>,
    #[validate(range(min = 1, message = "requested amount must be positive"))]
    pub requested_amount: i64,
    #[validate(length(min = 1, max = 2000, message = "purpose is required"))]
    pub purpose: String,
    pub applicant_name: Option<String>,
}

/// Fee confirmation forwarded by the payment flow
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayFeeRequest {
    #[validate(length(min = 1, message = "transaction id is required"))]
    pub transaction_id: String,
}

/// Query for listing applications
#[derive(Debug, Default, Deserialize)]
pub struct ListApplicationsQuery {
    pub email: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListApplicationsQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}
