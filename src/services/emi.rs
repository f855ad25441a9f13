//! Equated monthly installment calculator
//!
//! `EMI = P·R·(1+R)^N / ((1+R)^N − 1)` with `R` the monthly rate.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiResult;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmiRequest {
    #[validate(range(min = 0.01, message = "principal must be positive"))]
    pub principal: f64,
    /// Annual rate, percent
    #[validate(range(min = 0.0, message = "interest rate cannot be negative"))]
    pub interest_rate: f64,
    #[validate(range(min = 1, message = "months must be at least 1"))]
    pub months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmiBreakdown {
    pub emi: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

pub fn calculate(req: &EmiRequest) -> ApiResult<EmiBreakdown> {
    req.validate()?;

    let p = req.principal;
    let n = f64::from(req.months);
    let r = req.interest_rate / 12.0 / 100.0;

    let emi = if r == 0.0 {
        p / n
    } else {
        let growth = (1.0 + r).powf(n);
        p * r * growth / (growth - 1.0)
    };
    let total_payment = emi * n;

    Ok(EmiBreakdown {
        emi: round2(emi),
        total_payment: round2(total_payment),
        total_interest: round2(total_payment - p),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    fn req(principal: f64, interest_rate: f64, months: u32) -> EmiRequest {
        EmiRequest {
            principal,
            interest_rate,
            months,
        }
    }

    #[test]
    fn test_standard_schedule() {
        let out = calculate(&req(100_000.0, 12.0, 12)).unwrap();
        assert_eq!(out.emi, 8884.88);
        assert_eq!(out.total_payment, 106_618.55);
        assert_eq!(out.total_interest, 6618.55);
    }

    #[test]
    fn test_zero_rate_splits_evenly() {
        let out = calculate(&req(1200.0, 0.0, 12)).unwrap();
        assert_eq!(out.emi, 100.0);
        assert_eq!(out.total_interest, 0.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            calculate(&req(0.0, 10.0, 12)),
            Err(ApiError::ValidationError(_))
        ));
        assert!(calculate(&req(1000.0, -1.0, 12)).is_err());
        assert!(calculate(&req(1000.0, 10.0, 0)).is_err());
    }
}
