use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize)]
pub struct Revenue {
    pub id: i64,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub received_on: NaiveDate,
    pub sale_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub const REVENUE_COLUMNS: &str = "id, description, category, amount::FLOAT8 AS amount,
    received_on, sale_id, created_at";

#[derive(Debug, FromRow, Serialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub category: String,
    pub amount: f64,
    pub incurred_on: NaiveDate,
    pub paid: bool,
    pub paid_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const EXPENSE_COLUMNS: &str = "id, description, category, amount::FLOAT8 AS amount,
    incurred_on, paid, paid_on, notes, created_at";

#[derive(Debug, FromRow, Serialize)]
pub struct CashFlowEntry {
    pub id: i64,
    pub kind: String,
    pub amount: f64,
    pub occurred_on: NaiveDate,
    pub description: String,
    pub sale_id: Option<i64>,
    pub expense_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub const CASH_FLOW_COLUMNS: &str = "id, kind, amount::FLOAT8 AS amount, occurred_on,
    description, sale_id, expense_id, created_at";
