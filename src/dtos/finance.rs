use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dtos::report::CashFlowDay;
use crate::error::AppError;
use crate::services::finance::CashFlowKind;
use crate::services::format::deserialize_amount;
use crate::services::validation::{clean_optional, require_non_blank, require_positive, validate_date_range};

#[derive(Debug, Deserialize)]
pub struct RevenueRequest {
    pub description: String,
    pub category: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    pub received_on: NaiveDate,
}

impl RevenueRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Description", &self.description)?;
        require_non_blank("Category", &self.category)?;
        require_positive("Amount", self.amount)
    }
}

#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    pub description: String,
    pub category: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    pub incurred_on: NaiveDate,
    #[serde(default)]
    pub paid: bool,
    pub notes: Option<String>,
}

impl ExpenseRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Description", &self.description)?;
        require_non_blank("Category", &self.category)?;
        require_positive("Amount", self.amount)
    }

    pub fn normalized(mut self) -> Self {
        self.description = self.description.trim().to_string();
        self.category = self.category.trim().to_lowercase();
        self.notes = clean_optional(self.notes);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct PayExpenseRequest {
    pub paid_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CashFlowRequest {
    pub kind: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    pub occurred_on: NaiveDate,
    pub description: String,
}

impl CashFlowRequest {
    pub fn validate(&self) -> Result<CashFlowKind, AppError> {
        require_non_blank("Description", &self.description)?;
        require_positive("Amount", self.amount)?;
        self.kind.parse().map_err(AppError::validation)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<String>,
}

impl DateRangeQuery {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_date_range(self.from, self.to)
    }
}

#[derive(Debug, Deserialize)]
pub struct CashFlowSummaryQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct CashFlowSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub opening_balance: f64,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net: f64,
    pub closing_balance: f64,
    pub days: Vec<CashFlowDay>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_category_is_lowercased() {
        let req = ExpenseRequest {
            description: " Aluguel ".into(),
            category: " Fixas ".into(),
            amount: 1500.0,
            incurred_on: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            paid: false,
            notes: Some("".into()),
        };
        assert!(req.validate().is_ok());
        let req = req.normalized();
        assert_eq!(req.category, "fixas");
        assert_eq!(req.description, "Aluguel");
        assert!(req.notes.is_none());
    }

    #[test]
    fn cash_flow_entry_needs_positive_amount_and_known_kind() {
        let mut req = CashFlowRequest {
            kind: "outflow".into(),
            amount: 20.0,
            occurred_on: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            description: "Troco".into(),
        };
        assert_eq!(req.validate().unwrap(), CashFlowKind::Outflow);
        req.amount = 0.0;
        assert!(req.validate().is_err());
        req.amount = 1.0;
        req.kind = "transfer".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn revenue_rejects_zero_amount() {
        let req = RevenueRequest {
            description: "Bazar".into(),
            category: "eventos".into(),
            amount: 0.0,
            received_on: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn amounts_accept_brl_text() {
        let req: ExpenseRequest = serde_json::from_value(serde_json::json!({
            "description": "Aluguel",
            "category": "fixas",
            "amount": "R$ 1.234,56",
            "incurred_on": "2024-03-05"
        }))
        .unwrap();
        assert_eq!(req.amount, 1234.56);

        let req: RevenueRequest = serde_json::from_value(serde_json::json!({
            "description": "Bazar",
            "category": "eventos",
            "amount": 80.5,
            "received_on": "2024-03-05"
        }))
        .unwrap();
        assert_eq!(req.amount, 80.5);

        let bad = serde_json::from_value::<CashFlowRequest>(serde_json::json!({
            "kind": "inflow",
            "amount": "dez reais",
            "occurred_on": "2024-03-05",
            "description": "Troco"
        }));
        assert!(bad.is_err());
    }
}
