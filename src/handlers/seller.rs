use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use crate::dtos::party::{PeriodQuery, SellerPerformance, SellerRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::party::Seller;
use crate::services::format::round_money;
use crate::services::validation::validate_date_range;
use crate::state::AppState;

const SELLER_COLUMNS: &str = "id, name, email, phone, active, user_id, created_at";
const IN_USE: &str = "Seller has sales or payouts; deactivate instead of deleting";

#[instrument(skip(state))]
pub async fn list_sellers(State(state): State<AppState>) -> Result<Json<Vec<Seller>>, AppError> {
    let sellers = sqlx::query_as::<_, Seller>(&format!(
        "SELECT {SELLER_COLUMNS} FROM sellers ORDER BY active DESC, name"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(sellers))
}

#[instrument(skip(state))]
pub async fn get_seller(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Seller>, AppError> {
    let seller = fetch_seller(&state, id).await?;
    Ok(Json(seller))
}

async fn fetch_seller(state: &AppState, id: i64) -> Result<Seller, AppError> {
    sqlx::query_as::<_, Seller>(&format!("SELECT {SELLER_COLUMNS} FROM sellers WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Seller not found"))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_seller(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<SellerRequest>,
) -> Result<(StatusCode, Json<Seller>), AppError> {
    auth.require_manager("create sellers")?;
    payload.validate()?;
    let payload = payload.normalized();

    let seller = sqlx::query_as::<_, Seller>(&format!(
        "INSERT INTO sellers (name, email, phone, active, user_id)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {SELLER_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.active.unwrap_or(true))
    .bind(payload.user_id)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Seller already exists", "Linked user does not exist"))?;

    Ok((StatusCode::CREATED, Json(seller)))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_seller(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<SellerRequest>,
) -> Result<Json<Seller>, AppError> {
    auth.require_manager("update sellers")?;
    payload.validate()?;
    let payload = payload.normalized();

    let seller = sqlx::query_as::<_, Seller>(&format!(
        "UPDATE sellers SET name = $1, email = $2, phone = $3,
             active = COALESCE($4, active), user_id = $5
         WHERE id = $6
         RETURNING {SELLER_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(payload.active)
    .bind(payload.user_id)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Seller already exists", "Linked user does not exist"))?
    .ok_or_else(|| AppError::not_found("Seller not found"))?;

    Ok(Json(seller))
}

#[instrument(skip(state, auth))]
pub async fn delete_seller(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete sellers")?;

    let result = sqlx::query("DELETE FROM sellers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_constraint_violation(e, IN_USE, IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Seller not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /sellers/:id/performance?from=&to=
#[instrument(skip(state))]
pub async fn get_seller_performance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Query(period): Query<PeriodQuery>,
) -> Result<Json<SellerPerformance>, AppError> {
    validate_date_range(period.from, period.to)?;
    let seller = fetch_seller(&state, id).await?;

    let (sales_count, revenue, accrued, paid, pending): (i64, f64, f64, f64, f64) = sqlx::query_as(
        "SELECT
            COUNT(*),
            COALESCE(SUM(total_amount), 0)::FLOAT8,
            COALESCE(SUM(commission_amount), 0)::FLOAT8,
            COALESCE(SUM(commission_amount) FILTER (WHERE commission_status = 'paid'), 0)::FLOAT8,
            COALESCE(SUM(commission_amount) FILTER (WHERE commission_status = 'pending'), 0)::FLOAT8
         FROM sales
         WHERE seller_id = $1 AND status = 'completed'
           AND ($2::DATE IS NULL OR sale_date >= $2)
           AND ($3::DATE IS NULL OR sale_date <= $3)"
    )
    .bind(id)
    .bind(period.from)
    .bind(period.to)
    .fetch_one(&state.db_pool)
    .await?;

    Ok(Json(SellerPerformance {
        seller_id: seller.id,
        seller_name: seller.name,
        from: period.from,
        to: period.to,
        sales_count,
        revenue: round_money(revenue),
        commission_accrued: round_money(accrued),
        commission_paid: round_money(paid),
        commission_pending: round_money(pending),
    }))
}
