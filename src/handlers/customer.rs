use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use crate::dtos::party::{CustomerPoints, CustomerRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::handlers::redemption::points_balance;
use crate::middleware::auth::AuthContext;
use crate::models::loyalty::PointsLedgerEntry;
use crate::models::party::Customer;
use crate::state::AppState;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, cpf, birth_date, notes, created_at";
const DUPLICATE_CPF: &str = "A customer with this CPF already exists";
const IN_USE: &str = "Customer has sales or redemption requests and cannot be deleted";

#[instrument(skip(state))]
pub async fn list_customers(State(state): State<AppState>) -> Result<Json<Vec<Customer>>, AppError> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(customers))
}

#[instrument(skip(state))]
pub async fn get_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Customer>, AppError> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(customer))
}

#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let customer = sqlx::query_as::<_, Customer>(&format!(
        "INSERT INTO customers (name, email, phone, cpf, birth_date, notes)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.cpf)
    .bind(payload.birth_date)
    .bind(&payload.notes)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_CPF, IN_USE))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

#[instrument(skip(state, payload))]
pub async fn update_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<CustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let customer = sqlx::query_as::<_, Customer>(&format!(
        "UPDATE customers SET name = $1, email = $2, phone = $3, cpf = $4, birth_date = $5, notes = $6
         WHERE id = $7
         RETURNING {CUSTOMER_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.cpf)
    .bind(payload.birth_date)
    .bind(&payload.notes)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_CPF, IN_USE))?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(customer))
}

#[instrument(skip(state, auth))]
pub async fn delete_customer(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete customers")?;

    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_constraint_violation(e, DUPLICATE_CPF, IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /customers/:id/points - Balance plus ledger, newest first
#[instrument(skip(state))]
pub async fn get_customer_points(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CustomerPoints>, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
        .bind(id)
        .fetch_one(&state.db_pool)
        .await?;
    if !exists {
        return Err(AppError::not_found("Customer not found"));
    }

    let balance = points_balance(&state.db_pool, id).await?;
    let entries = sqlx::query_as::<_, PointsLedgerEntry>(
        "SELECT id, delta, reason, sale_id, redemption_id, created_at
         FROM points_ledger WHERE customer_id = $1
         ORDER BY created_at DESC, id DESC"
    )
    .bind(id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(CustomerPoints { customer_id: id, balance, entries }))
}
