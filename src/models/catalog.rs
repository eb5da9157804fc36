use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub consignment: bool,
    pub consignment_rate: f64,
    pub created_at: DateTime<Utc>,
}

pub const SUPPLIER_COLUMNS: &str = "id, name, document, email, phone, notes, consignment,
    consignment_rate::FLOAT8 AS consignment_rate, created_at";
