use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{Postgres, QueryBuilder};
use tracing::instrument;

use crate::dtos::finance::{DateRangeQuery, RevenueRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::finance::{Revenue, REVENUE_COLUMNS};
use crate::services::format::round_money;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_revenues(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Revenue>>, AppError> {
    query.validate()?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {REVENUE_COLUMNS} FROM revenues WHERE 1=1"));
    if let Some(from) = query.from {
        qb.push(" AND received_on >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        qb.push(" AND received_on <= ").push_bind(to);
    }
    if let Some(category) = query.category {
        qb.push(" AND category = ").push_bind(category.trim().to_lowercase());
    }
    qb.push(" ORDER BY received_on DESC, id DESC");

    let revenues = qb.build_query_as::<Revenue>().fetch_all(&state.db_pool).await?;
    Ok(Json(revenues))
}

#[instrument(skip(state))]
pub async fn get_revenue(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Revenue>, AppError> {
    let revenue = sqlx::query_as::<_, Revenue>(&format!("SELECT {REVENUE_COLUMNS} FROM revenues WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Revenue not found"))?;

    Ok(Json(revenue))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_revenue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RevenueRequest>,
) -> Result<(StatusCode, Json<Revenue>), AppError> {
    auth.require_manager("record revenues")?;
    payload.validate()?;

    let revenue = sqlx::query_as::<_, Revenue>(&format!(
        "INSERT INTO revenues (description, category, amount, received_on)
         VALUES ($1, $2, $3::FLOAT8, $4)
         RETURNING {REVENUE_COLUMNS}"
    ))
    .bind(payload.description.trim())
    .bind(payload.category.trim().to_lowercase())
    .bind(round_money(payload.amount))
    .bind(payload.received_on)
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(revenue)))
}

/// Sale revenues are owned by the sale and only change through it.
#[instrument(skip(state, auth, payload))]
pub async fn update_revenue(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<RevenueRequest>,
) -> Result<Json<Revenue>, AppError> {
    auth.require_manager("edit revenues")?;
    payload.validate()?;
    ensure_manual(&state, id).await?;

    let revenue = sqlx::query_as::<_, Revenue>(&format!(
        "UPDATE revenues SET description = $1, category = $2, amount = $3::FLOAT8, received_on = $4
         WHERE id = $5
         RETURNING {REVENUE_COLUMNS}"
    ))
    .bind(payload.description.trim())
    .bind(payload.category.trim().to_lowercase())
    .bind(round_money(payload.amount))
    .bind(payload.received_on)
    .bind(id)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(revenue))
}

#[instrument(skip(state, auth))]
pub async fn delete_revenue(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete revenues")?;
    ensure_manual(&state, id).await?;

    sqlx::query("DELETE FROM revenues WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_manual(state: &AppState, id: i64) -> Result<(), AppError> {
    let sale_id: Option<i64> = sqlx::query_scalar("SELECT sale_id FROM revenues WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Revenue not found"))?;

    if let Some(sale_id) = sale_id {
        return Err(AppError::validation(format!(
            "Revenue belongs to sale #{sale_id}; cancel the sale instead"
        )));
    }
    Ok(())
}
