use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::report::{BalanceSheet, BalanceSheetQuery, Dashboard, MonthlyQuery, MonthlyReport};
use crate::error::AppError;
use crate::handlers::goal::goal_progress;
use crate::handlers::product::stock_summary;
use crate::models::goal::{Goal, GOAL_COLUMNS};
use crate::services::finance::{balance_sheet, monthly_profitability};
use crate::services::format::month_bounds;
use crate::state::AppState;

// GET /reports/balance-sheet?date=
#[instrument(skip(state))]
pub async fn get_balance_sheet(
    State(state): State<AppState>,
    Query(query): Query<BalanceSheetQuery>,
) -> Result<Json<BalanceSheet>, AppError> {
    let as_of = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let revenues: Vec<f64> = sqlx::query_scalar("SELECT amount::FLOAT8 FROM revenues WHERE received_on <= $1")
        .bind(as_of)
        .fetch_all(&state.db_pool)
        .await?;
    let expenses: Vec<f64> = sqlx::query_scalar("SELECT amount::FLOAT8 FROM expenses WHERE incurred_on <= $1")
        .bind(as_of)
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(balance_sheet(as_of, revenues, expenses)))
}

// GET /reports/monthly?year=&month=
#[instrument(skip(state))]
pub async fn get_monthly_report(
    State(state): State<AppState>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<MonthlyReport>, AppError> {
    let report = monthly_report(&state.db_pool, query.year, query.month).await?;
    Ok(Json(report))
}

async fn monthly_report(pool: &PgPool, year: i32, month: u32) -> Result<MonthlyReport, AppError> {
    let (start, end) = month_bounds(year, month)
        .ok_or_else(|| AppError::validation(format!("Invalid month: {year}-{month}")))?;

    let revenue: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0)::FLOAT8 FROM revenues WHERE received_on BETWEEN $1 AND $2"
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    let (cost_of_goods, sales_count): (f64, i64) = sqlx::query_as(
        "SELECT
            COALESCE((SELECT SUM(i.cost_price) FROM sale_items i
                      JOIN sales s ON s.id = i.sale_id
                      WHERE s.status = 'completed' AND s.sale_date BETWEEN $1 AND $2), 0)::FLOAT8,
            (SELECT COUNT(*) FROM sales
             WHERE status = 'completed' AND sale_date BETWEEN $1 AND $2)"
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    let expenses: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount), 0)::FLOAT8 FROM expenses WHERE incurred_on BETWEEN $1 AND $2"
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    Ok(monthly_profitability(year, month, revenue, cost_of_goods, expenses, sales_count))
}

// GET /reports/dashboard
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, AppError> {
    let today = Utc::now().date_naive();
    let month = monthly_report(&state.db_pool, today.year(), today.month()).await?;
    let stock = stock_summary(&state.db_pool).await?;

    let (pending_redemptions, new_leads): (i64, i64) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM redemption_requests WHERE status = 'pending'),
            (SELECT COUNT(*) FROM leads WHERE status = 'new')"
    )
    .fetch_one(&state.db_pool)
    .await?;

    let goals = active_goals(&state.db_pool, today).await?;
    let mut progress = Vec::with_capacity(goals.len());
    for goal in &goals {
        progress.push(goal_progress(&state.db_pool, goal).await?);
    }

    Ok(Json(Dashboard {
        month,
        stock,
        pending_redemptions,
        new_leads,
        goals: progress,
    }))
}

async fn active_goals(pool: &PgPool, today: NaiveDate) -> Result<Vec<Goal>, sqlx::Error> {
    sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE starts_on <= $1 AND ends_on >= $1 ORDER BY ends_on"
    ))
    .bind(today)
    .fetch_all(pool)
    .await
}
