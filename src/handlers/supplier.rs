use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use crate::dtos::catalog::SupplierRequest;
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::catalog::{Supplier, SUPPLIER_COLUMNS};
use crate::state::AppState;

const IN_USE: &str = "Supplier still has products";

#[instrument(skip(state))]
pub async fn list_suppliers(State(state): State<AppState>) -> Result<Json<Vec<Supplier>>, AppError> {
    let suppliers = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(suppliers))
}

#[instrument(skip(state))]
pub async fn get_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Supplier>, AppError> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(supplier))
}

#[instrument(skip(state, payload))]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<SupplierRequest>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "INSERT INTO suppliers (name, document, email, phone, notes, consignment, consignment_rate)
         VALUES ($1, $2, $3, $4, $5, $6, $7::FLOAT8)
         RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.document)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.notes)
    .bind(payload.consignment)
    .bind(payload.consignment_rate.unwrap_or(0.0))
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Full replacement of the supplier record.
#[instrument(skip(state, payload))]
pub async fn update_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<SupplierRequest>,
) -> Result<Json<Supplier>, AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "UPDATE suppliers SET name = $1, document = $2, email = $3, phone = $4, notes = $5,
             consignment = $6, consignment_rate = $7::FLOAT8
         WHERE id = $8
         RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.document)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.notes)
    .bind(payload.consignment)
    .bind(payload.consignment_rate.unwrap_or(0.0))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(supplier))
}

#[instrument(skip(state, auth))]
pub async fn delete_supplier(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete suppliers")?;

    let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_constraint_violation(e, IN_USE, IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Supplier not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
