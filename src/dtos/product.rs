// src/dtos/product.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::inventory::{ProductCondition, ProductStatus};
use crate::services::validation::{clean_optional, require_non_blank, require_non_negative};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub cost_price: Option<f64>,
    pub sale_price: f64,
    pub acquired_on: Option<NaiveDate>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Product name", &self.name)?;
        require_non_negative("Sale price", self.sale_price)?;
        if let Some(cost) = self.cost_price {
            require_non_negative("Cost price", cost)?;
        }
        if let Some(condition) = &self.condition {
            condition.parse::<ProductCondition>().map_err(AppError::validation)?;
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.sku = clean_optional(self.sku);
        self.description = clean_optional(self.description);
        self.brand = clean_optional(self.brand);
        self.size = clean_optional(self.size);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub condition: Option<String>,
    pub cost_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub acquired_on: Option<NaiveDate>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_non_blank("Product name", name)?;
        }
        if let Some(price) = self.sale_price {
            require_non_negative("Sale price", price)?;
        }
        if let Some(cost) = self.cost_price {
            require_non_negative("Cost price", cost)?;
        }
        if let Some(condition) = &self.condition {
            condition.parse::<ProductCondition>().map_err(AppError::validation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductStatusRequest {
    pub status: String,
}

impl UpdateProductStatusRequest {
    pub fn parsed(&self) -> Result<ProductStatus, AppError> {
        self.status.parse().map_err(AppError::validation)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub status: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StockSummary {
    pub available: i64,
    pub reserved: i64,
    pub sold: i64,
    pub inactive: i64,
    pub stock_cost_value: f64,
    pub stock_sale_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> CreateProductRequest {
        CreateProductRequest {
            sku: Some(" VST-001 ".into()),
            name: " Vestido floral ".into(),
            description: Some("".into()),
            category_id: None,
            supplier_id: None,
            brand: None,
            size: Some("M".into()),
            condition: Some("like_new".into()),
            cost_price: Some(20.0),
            sale_price: 59.9,
            acquired_on: None,
        }
    }

    #[test]
    fn valid_product_passes_and_is_trimmed() {
        let req = create();
        assert!(req.validate().is_ok());
        let req = req.normalized();
        assert_eq!(req.name, "Vestido floral");
        assert_eq!(req.sku.as_deref(), Some("VST-001"));
        assert_eq!(req.description, None);
    }

    #[test]
    fn negative_price_and_unknown_condition_are_rejected() {
        let mut req = create();
        req.sale_price = -1.0;
        assert!(req.validate().is_err());

        let mut req = create();
        req.condition = Some("mint".into());
        assert!(req.validate().is_err());
    }

    #[test]
    fn status_request_parses_known_values() {
        let ok = UpdateProductStatusRequest { status: "reserved".into() };
        assert_eq!(ok.parsed().unwrap(), ProductStatus::Reserved);
        let bad = UpdateProductStatusRequest { status: "lost".into() };
        assert!(bad.parsed().is_err());
    }
}
