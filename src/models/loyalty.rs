use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize)]
pub struct RedemptionRequest {
    pub id: i64,
    pub customer_id: i64,
    pub points: i64,
    pub reward: String,
    pub status: String,
    pub reason: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow, Serialize)]
pub struct PointsLedgerEntry {
    pub id: i64,
    pub delta: i64,
    pub reason: String,
    pub sale_id: Option<i64>,
    pub redemption_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
