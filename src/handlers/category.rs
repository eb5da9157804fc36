use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{error, instrument};

use crate::dtos::catalog::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::catalog::Category;
use crate::services::validation::clean_optional;
use crate::state::AppState;

const DUPLICATE: &str = "Category name already exists";
const IN_USE: &str = "Category still has products";

// GET /categories
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    match sqlx::query_as::<_, Category>(
        "SELECT id, name, description, created_at FROM categories ORDER BY name"
    )
        .fetch_all(&state.db_pool)
        .await {
        Ok(categories) => Ok(Json(categories)),
        Err(e) => {
            error!(?e, "Failed to fetch categories");
            Err(e.into())
        }
    }
}

// GET /categories/:id
#[instrument(skip(state))]
pub async fn get_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Category>, AppError> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, description, created_at FROM categories WHERE id = $1"
    )
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    Ok(Json(category))
}

// POST /categories
#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name, description) VALUES ($1, $2)
         RETURNING id, name, description, created_at"
    )
    .bind(payload.name.trim())
    .bind(clean_optional(payload.description))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE, IN_USE))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// PUT /categories/:id
#[instrument(skip(state, payload))]
pub async fn update_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET
         name = COALESCE($1, name),
         description = COALESCE($2, description)
         WHERE id = $3
         RETURNING id, name, description, created_at"
    )
    .bind(payload.name.map(|n| n.trim().to_string()))
    .bind(clean_optional(payload.description))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, DUPLICATE, IN_USE))?
    .ok_or_else(|| AppError::not_found("Category not found"))?;

    Ok(Json(category))
}

// DELETE /categories/:id
#[instrument(skip(state, auth))]
pub async fn delete_category(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("delete categories")?;

    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| map_constraint_violation(e, DUPLICATE, IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Category not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
