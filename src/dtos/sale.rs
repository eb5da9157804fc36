use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::format::round_money;
use crate::services::validation::require_non_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Pix,
    Debit,
    Credit,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
            PaymentMethod::Other => "other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "pix" => Ok(PaymentMethod::Pix),
            "debit" => Ok(PaymentMethod::Debit),
            "credit" => Ok(PaymentMethod::Credit),
            "other" => Ok(PaymentMethod::Other),
            other => Err(format!("Invalid payment method: {other}")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub sale_date: NaiveDate,
    pub payment_method: String,
    pub discount: Option<f64>,
    pub notes: Option<String>,
    pub items: Vec<SaleItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: i64,
    pub unit_price: Option<f64>, // Optional - uses the product's sale_price if not provided
}

impl CreateSaleRequest {
    /// Checks that do not need the database.
    pub fn validate(&self) -> Result<PaymentMethod, AppError> {
        if self.items.is_empty() {
            return Err(AppError::validation("Sale must contain at least one item"));
        }
        let mut seen = HashSet::new();
        for item in &self.items {
            if !seen.insert(item.product_id) {
                return Err(AppError::validation(format!(
                    "Product {} appears more than once in the sale",
                    item.product_id
                )));
            }
            if let Some(price) = item.unit_price {
                require_non_negative("Unit price", price)?;
            }
        }
        if let Some(discount) = self.discount {
            require_non_negative("Discount", discount)?;
        }
        self.payment_method.parse().map_err(AppError::validation)
    }
}

/// Subtotal and total for resolved unit prices; the discount cannot exceed the subtotal.
pub fn sale_totals(unit_prices: &[f64], discount: f64) -> Result<(f64, f64), AppError> {
    let subtotal = round_money(unit_prices.iter().sum());
    let discount = round_money(discount);
    if discount > subtotal {
        return Err(AppError::validation("Discount cannot exceed the sale subtotal"));
    }
    Ok((subtotal, round_money(subtotal - discount)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub seller_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct SaleResponse {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub seller_id: Option<i64>,
    pub seller_name: Option<String>,
    pub sale_date: NaiveDate,
    pub payment_method: String,
    pub subtotal: f64,
    pub discount: f64,
    pub total_amount: f64,
    pub commission_amount: f64,
    pub commission_status: String,
    pub points_earned: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub items: Vec<SaleItemResponse>,
    pub summary: SaleSummary,
}

#[derive(Serialize)]
pub struct SaleItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: Option<String>,
    pub unit_price: f64,
    pub cost_price: f64,
}

#[derive(Serialize)]
pub struct SaleSummary {
    pub total_items: i64,
    pub gross_margin: f64,
    pub total_formatted: String,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct SaleListItem {
    pub id: i64,
    pub sale_date: NaiveDate,
    pub customer_name: Option<String>,
    pub seller_name: Option<String>,
    pub payment_method: String,
    pub total_amount: f64,
    pub commission_amount: f64,
    pub status: String,
    pub total_items: i64,
}
