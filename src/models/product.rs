use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub sku: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub condition: String,
    pub cost_price: f64,
    pub sale_price: f64,
    pub status: String,
    pub acquired_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching `Product`, with NUMERIC money cast for `f64` decoding.
pub const PRODUCT_COLUMNS: &str = "id, sku, name, description, category_id, supplier_id, brand, size, condition,
    cost_price::FLOAT8 AS cost_price, sale_price::FLOAT8 AS sale_price,
    status, acquired_on, created_at, updated_at";
