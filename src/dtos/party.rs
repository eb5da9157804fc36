use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::loyalty::PointsLedgerEntry;
use crate::services::validation::{
    clean_optional, normalize_cpf, require_non_blank, validate_cpf, validate_optional_contact,
};

#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl CustomerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Customer name", &self.name)?;
        validate_optional_contact(self.email.as_deref(), self.phone.as_deref())?;
        if let Some(cpf) = self.cpf.as_deref().filter(|c| !c.trim().is_empty()) {
            validate_cpf(cpf.trim())?;
        }
        if let Some(birth) = self.birth_date {
            if birth > Utc::now().date_naive() {
                return Err(AppError::validation("Birth date cannot be in the future"));
            }
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = clean_optional(self.email);
        self.phone = clean_optional(self.phone);
        self.cpf = clean_optional(self.cpf).map(|c| normalize_cpf(&c));
        self.notes = clean_optional(self.notes);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct SellerRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub active: Option<bool>,
    pub user_id: Option<i64>,
}

impl SellerRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Seller name", &self.name)?;
        validate_optional_contact(self.email.as_deref(), self.phone.as_deref())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = clean_optional(self.email);
        self.phone = clean_optional(self.phone);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SellerPerformance {
    pub seller_id: i64,
    pub seller_name: String,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub sales_count: i64,
    pub revenue: f64,
    pub commission_accrued: f64,
    pub commission_paid: f64,
    pub commission_pending: f64,
}

#[derive(Debug, Serialize)]
pub struct CustomerPoints {
    pub customer_id: i64,
    pub balance: i64,
    pub entries: Vec<PointsLedgerEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerRequest {
        CustomerRequest {
            name: "Joana".into(),
            email: None,
            phone: Some("(21) 99999-0000".into()),
            cpf: Some("529.982.247-25".into()),
            birth_date: NaiveDate::from_ymd_opt(1990, 4, 2),
            notes: None,
        }
    }

    #[test]
    fn customer_cpf_is_checked_and_normalized() {
        let req = customer();
        assert!(req.validate().is_ok());
        assert_eq!(req.normalized().cpf.as_deref(), Some("52998224725"));

        let mut bad = customer();
        bad.cpf = Some("123.456.789-00".into());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let mut req = customer();
        req.birth_date = Some(Utc::now().date_naive() + chrono::Duration::days(2));
        assert!(req.validate().is_err());
    }

    #[test]
    fn seller_requires_name() {
        let req = SellerRequest { name: "".into(), email: None, phone: None, active: None, user_id: None };
        assert!(req.validate().is_err());
    }
}
