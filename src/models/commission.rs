use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommissionRule {
    pub id: i64,
    pub name: String,
    pub seller_id: Option<i64>,
    pub kind: String,
    pub value: f64,
    pub active: bool,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

pub const COMMISSION_RULE_COLUMNS: &str = "id, name, seller_id, kind, value::FLOAT8 AS value,
    active, starts_on, ends_on, created_at";

#[derive(Debug, FromRow, Serialize)]
pub struct CommissionPayout {
    pub id: i64,
    pub seller_id: i64,
    pub amount: f64,
    pub period_until: NaiveDate,
    pub sales_count: i32,
    pub paid_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub const PAYOUT_COLUMNS: &str = "id, seller_id, amount::FLOAT8 AS amount, period_until,
    sales_count, paid_by, created_at";
