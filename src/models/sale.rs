use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Sale {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub user_id: i64,
    pub sale_date: NaiveDate,
    pub payment_method: String,
    pub subtotal: f64,
    pub discount: f64,
    pub total_amount: f64,
    pub commission_rule_id: Option<i64>,
    pub commission_amount: f64,
    pub commission_status: String,
    pub points_earned: i64,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

pub const SALE_COLUMNS: &str = "id, customer_id, seller_id, user_id, sale_date, payment_method,
    subtotal::FLOAT8 AS subtotal, discount::FLOAT8 AS discount, total_amount::FLOAT8 AS total_amount,
    commission_rule_id, commission_amount::FLOAT8 AS commission_amount, commission_status,
    points_earned, status, notes, created_at, cancelled_at";

#[derive(Debug, FromRow)]
pub struct SaleItemRow {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub sku: Option<String>,
    pub unit_price: f64,
    pub cost_price: f64,
}
