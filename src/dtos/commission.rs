use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::commission::CommissionPayout;
use crate::services::commission::CommissionKind;
use crate::services::validation::{require_non_blank, require_non_negative, validate_date_range};

#[derive(Debug, Deserialize)]
pub struct CommissionRuleRequest {
    pub name: String,
    pub seller_id: Option<i64>,
    pub kind: String,
    pub value: f64,
    pub active: Option<bool>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

impl CommissionRuleRequest {
    pub fn validate(&self) -> Result<CommissionKind, AppError> {
        require_non_blank("Rule name", &self.name)?;
        let kind: CommissionKind = self.kind.parse().map_err(AppError::validation)?;
        require_non_negative("Commission value", self.value)?;
        if kind == CommissionKind::Percentage && self.value > 100.0 {
            return Err(AppError::validation("Percentage commission cannot exceed 100"));
        }
        validate_date_range(self.starts_on, self.ends_on)?;
        Ok(kind)
    }
}

#[derive(Debug, Deserialize)]
pub struct PayoffRequest {
    pub seller_id: i64,
    pub until: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct PayoutQuery {
    pub seller_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PayoffResponse {
    pub payout: CommissionPayout,
    pub expense_id: i64,
    pub sale_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(kind: &str, value: f64) -> CommissionRuleRequest {
        CommissionRuleRequest {
            name: "Padrão".into(),
            seller_id: None,
            kind: kind.into(),
            value,
            active: None,
            starts_on: None,
            ends_on: None,
        }
    }

    #[test]
    fn percentage_is_bounded() {
        assert_eq!(rule("percentage", 10.0).validate().unwrap(), CommissionKind::Percentage);
        assert!(rule("percentage", 100.5).validate().is_err());
        assert!(rule("fixed", 150.0).validate().is_ok());
        assert!(rule("fixed", -1.0).validate().is_err());
        assert!(rule("tiered", 1.0).validate().is_err());
    }

    #[test]
    fn window_must_be_ordered() {
        let mut r = rule("fixed", 5.0);
        r.starts_on = NaiveDate::from_ymd_opt(2024, 2, 1);
        r.ends_on = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(r.validate().is_err());
    }
}
