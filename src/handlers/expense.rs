use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use sqlx::{Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::dtos::finance::{DateRangeQuery, ExpenseRequest, PayExpenseRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::finance::{Expense, EXPENSE_COLUMNS};
use crate::services::format::round_money;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Expense>>, AppError> {
    query.validate()?;

    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE 1=1"));
    if let Some(from) = query.from {
        qb.push(" AND incurred_on >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        qb.push(" AND incurred_on <= ").push_bind(to);
    }
    if let Some(category) = query.category {
        qb.push(" AND category = ").push_bind(category.trim().to_lowercase());
    }
    qb.push(" ORDER BY incurred_on DESC, id DESC");

    let expenses = qb.build_query_as::<Expense>().fetch_all(&state.db_pool).await?;
    Ok(Json(expenses))
}

#[instrument(skip(state))]
pub async fn get_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Expense>, AppError> {
    let expense = sqlx::query_as::<_, Expense>(&format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"))
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    Ok(Json(expense))
}

/// An expense created as already paid also records its cash outflow.
#[instrument(skip(state, auth, payload))]
pub async fn create_expense(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    auth.require_manager("record expenses")?;
    payload.validate()?;
    let payload = payload.normalized();

    let mut tx = state.db_pool.begin().await?;

    let expense = sqlx::query_as::<_, Expense>(&format!(
        "INSERT INTO expenses (description, category, amount, incurred_on, paid, paid_on, notes)
         VALUES ($1, $2, $3::FLOAT8, $4, $5, CASE WHEN $5 THEN $4 END, $6)
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(round_money(payload.amount))
    .bind(payload.incurred_on)
    .bind(payload.paid)
    .bind(&payload.notes)
    .fetch_one(&mut *tx)
    .await?;

    if expense.paid {
        record_outflow(&mut tx, &expense).await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    auth.require_manager("edit expenses")?;
    payload.validate()?;
    let payload = payload.normalized();

    let mut tx = state.db_pool.begin().await?;

    let paid: bool = sqlx::query_scalar("SELECT paid FROM expenses WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;
    if paid {
        return Err(AppError::validation("Paid expenses cannot be edited"));
    }

    let expense = sqlx::query_as::<_, Expense>(&format!(
        "UPDATE expenses SET description = $1, category = $2, amount = $3::FLOAT8, incurred_on = $4, notes = $5
         WHERE id = $6
         RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(round_money(payload.amount))
    .bind(payload.incurred_on)
    .bind(&payload.notes)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(expense))
}

// POST /expenses/:id/pay
#[instrument(skip(state, auth, payload))]
pub async fn pay_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Option<Json<PayExpenseRequest>>,
) -> Result<Json<Expense>, AppError> {
    auth.require_manager("pay expenses")?;
    let paid_on = payload
        .and_then(|Json(p)| p.paid_on)
        .unwrap_or_else(|| Utc::now().date_naive());

    let mut tx = state.db_pool.begin().await?;

    let paid: bool = sqlx::query_scalar("SELECT paid FROM expenses WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;
    if paid {
        return Err(AppError::validation("Expense is already paid"));
    }

    let expense = sqlx::query_as::<_, Expense>(&format!(
        "UPDATE expenses SET paid = TRUE, paid_on = $1 WHERE id = $2 RETURNING {EXPENSE_COLUMNS}"
    ))
    .bind(paid_on)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    record_outflow(&mut tx, &expense).await?;

    tx.commit().await?;

    info!(expense_id = id, amount = expense.amount, "Expense paid");
    Ok(Json(expense))
}

#[instrument(skip(state, auth))]
pub async fn delete_expense(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete expenses")?;

    let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND NOT paid")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM expenses WHERE id = $1)")
            .bind(id)
            .fetch_one(&state.db_pool)
            .await?;
        return Err(if exists {
            AppError::validation("Paid expenses cannot be deleted")
        } else {
            AppError::not_found("Expense not found")
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn record_outflow(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    expense: &Expense,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO cash_flow_entries (kind, amount, occurred_on, description, expense_id)
         VALUES ('outflow', $1::FLOAT8, $2, $3, $4)"
    )
    .bind(expense.amount)
    .bind(expense.paid_on.unwrap_or(expense.incurred_on))
    .bind(&expense.description)
    .bind(expense.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
