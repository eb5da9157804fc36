use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize)]
pub struct Goal {
    pub id: i64,
    pub title: String,
    pub metric: String,
    pub target: f64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub seller_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

pub const GOAL_COLUMNS: &str = "id, title, metric, target::FLOAT8 AS target, starts_on, ends_on,
    seller_id, created_at";
