// src/handlers/product.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::{error, info, instrument};

use crate::dtos::product::{
    CreateProductRequest, ProductFilter, StockSummary, UpdateProductRequest, UpdateProductStatusRequest,
};
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::product::{Product, PRODUCT_COLUMNS};
use crate::services::format::round_money;
use crate::services::inventory::{ProductCondition, ProductStatus};
use crate::services::validation::clean_optional;
use crate::state::AppState;

const DUPLICATE_SKU: &str = "Product SKU already exists";
const BAD_REFERENCE: &str = "Category or supplier does not exist";

// GET /products - List products, optionally filtered
#[instrument(skip(state))]
pub async fn get_products(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1"));

    if let Some(status) = &filter.status {
        let status: ProductStatus = status.parse().map_err(AppError::validation)?;
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(supplier_id) = filter.supplier_id {
        qb.push(" AND supplier_id = ").push_bind(supplier_id);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR sku ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" ORDER BY created_at DESC, id DESC");

    match qb.build_query_as::<Product>().fetch_all(&state.db_pool).await {
        Ok(products) => Ok(Json(products)),
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/:id - Get single product
#[instrument(skip(state))]
pub async fn get_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Product>, AppError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(product))
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload.validate()?;
    let payload = payload.normalized();
    let condition = payload
        .condition
        .as_deref()
        .map(str::parse::<ProductCondition>)
        .transpose()
        .map_err(AppError::validation)?
        .unwrap_or(ProductCondition::Good);

    let product = sqlx::query_as::<_, Product>(&format!(
        "INSERT INTO products (sku, name, description, category_id, supplier_id, brand, size,
                               condition, cost_price, sale_price, acquired_on)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9::FLOAT8, $10::FLOAT8, $11)
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&payload.sku)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.category_id)
    .bind(payload.supplier_id)
    .bind(&payload.brand)
    .bind(&payload.size)
    .bind(condition.as_str())
    .bind(round_money(payload.cost_price.unwrap_or(0.0)))
    .bind(round_money(payload.sale_price))
    .bind(payload.acquired_on)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_SKU, BAD_REFERENCE))?;

    info!(product_id = product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

// PUT /products/:id - Update product
#[instrument(skip(state, payload))]
pub async fn update_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET
         sku = COALESCE($1, sku),
         name = COALESCE($2, name),
         description = COALESCE($3, description),
         category_id = COALESCE($4, category_id),
         supplier_id = COALESCE($5, supplier_id),
         brand = COALESCE($6, brand),
         size = COALESCE($7, size),
         condition = COALESCE($8, condition),
         cost_price = COALESCE($9::FLOAT8, cost_price),
         sale_price = COALESCE($10::FLOAT8, sale_price),
         acquired_on = COALESCE($11, acquired_on),
         updated_at = NOW()
         WHERE id = $12
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(clean_optional(payload.sku))
    .bind(payload.name.map(|n| n.trim().to_string()))
    .bind(clean_optional(payload.description))
    .bind(payload.category_id)
    .bind(payload.supplier_id)
    .bind(clean_optional(payload.brand))
    .bind(clean_optional(payload.size))
    .bind(payload.condition)
    .bind(payload.cost_price.map(round_money))
    .bind(payload.sale_price.map(round_money))
    .bind(payload.acquired_on)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE_SKU, BAD_REFERENCE))?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(product))
}

// PATCH /products/:id/status - Manual status change
#[instrument(skip(state, payload))]
pub async fn update_product_status(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductStatusRequest>,
) -> Result<Json<Product>, AppError> {
    let next = payload.parsed()?;

    let mut tx = state.db_pool.begin().await?;

    let current: String = sqlx::query_scalar("SELECT status FROM products WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    let current: ProductStatus = current.parse().map_err(AppError::internal)?;

    if !current.can_transition_to(next) {
        return Err(AppError::validation(format!(
            "Cannot change product status from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let product = sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(next.as_str())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(product))
}

// DELETE /products/:id - Delete product
#[instrument(skip(state, auth))]
pub async fn delete_product(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete products")?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_constraint_violation(e, DUPLICATE_SKU, "Product has sales and cannot be deleted; mark it inactive instead"))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /products/stock-summary
#[instrument(skip(state))]
pub async fn get_stock_summary(State(state): State<AppState>) -> Result<Json<StockSummary>, AppError> {
    stock_summary(&state.db_pool).await.map(Json)
}

pub(crate) async fn stock_summary<'e>(db: impl PgExecutor<'e>) -> Result<StockSummary, AppError> {
    let row: (i64, i64, i64, i64, f64, f64) = sqlx::query_as(
        "SELECT
            COUNT(*) FILTER (WHERE status = 'available'),
            COUNT(*) FILTER (WHERE status = 'reserved'),
            COUNT(*) FILTER (WHERE status = 'sold'),
            COUNT(*) FILTER (WHERE status = 'inactive'),
            COALESCE(SUM(cost_price) FILTER (WHERE status IN ('available', 'reserved')), 0)::FLOAT8,
            COALESCE(SUM(sale_price) FILTER (WHERE status IN ('available', 'reserved')), 0)::FLOAT8
         FROM products"
    )
    .fetch_one(db)
    .await?;

    Ok(StockSummary {
        available: row.0,
        reserved: row.1,
        sold: row.2,
        inactive: row.3,
        stock_cost_value: round_money(row.4),
        stock_sale_value: round_money(row.5),
    })
}
