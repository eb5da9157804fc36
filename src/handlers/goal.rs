use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::goal::{GoalProgress, GoalRequest};
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::goal::{Goal, GOAL_COLUMNS};
use crate::services::format::round_money;
use crate::services::goals::{progress_percent, GoalMetric};
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_goals(State(state): State<AppState>) -> Result<Json<Vec<Goal>>, AppError> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals ORDER BY starts_on DESC, id DESC"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(goals))
}

#[instrument(skip(state))]
pub async fn get_goal(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Goal>, AppError> {
    Ok(Json(fetch_goal(&state.db_pool, id).await?))
}

async fn fetch_goal(pool: &PgPool, id: i64) -> Result<Goal, AppError> {
    sqlx::query_as::<_, Goal>(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Goal not found"))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<GoalRequest>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    auth.require_manager("manage goals")?;
    let metric = payload.validate()?;

    let goal = sqlx::query_as::<_, Goal>(&format!(
        "INSERT INTO goals (title, metric, target, starts_on, ends_on, seller_id)
         VALUES ($1, $2, $3::FLOAT8, $4, $5, $6)
         RETURNING {GOAL_COLUMNS}"
    ))
    .bind(payload.title.trim())
    .bind(metric.as_str())
    .bind(round_money(payload.target))
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .bind(payload.seller_id)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Goal already exists", "Seller does not exist"))?;

    Ok((StatusCode::CREATED, Json(goal)))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_goal(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<GoalRequest>,
) -> Result<Json<Goal>, AppError> {
    auth.require_manager("manage goals")?;
    let metric = payload.validate()?;

    let goal = sqlx::query_as::<_, Goal>(&format!(
        "UPDATE goals SET title = $1, metric = $2, target = $3::FLOAT8, starts_on = $4, ends_on = $5,
             seller_id = $6
         WHERE id = $7
         RETURNING {GOAL_COLUMNS}"
    ))
    .bind(payload.title.trim())
    .bind(metric.as_str())
    .bind(round_money(payload.target))
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .bind(payload.seller_id)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Goal already exists", "Seller does not exist"))?
    .ok_or_else(|| AppError::not_found("Goal not found"))?;

    Ok(Json(goal))
}

#[instrument(skip(state, auth))]
pub async fn delete_goal(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("manage goals")?;

    let result = sqlx::query("DELETE FROM goals WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Goal not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

// GET /goals/:id/progress
#[instrument(skip(state))]
pub async fn get_goal_progress(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<GoalProgress>, AppError> {
    let goal = fetch_goal(&state.db_pool, id).await?;
    Ok(Json(goal_progress(&state.db_pool, &goal).await?))
}

/// Measures a goal against completed sales inside its window.
pub(crate) async fn goal_progress(pool: &PgPool, goal: &Goal) -> Result<GoalProgress, AppError> {
    let metric: GoalMetric = goal.metric.parse().map_err(AppError::internal)?;

    let sql = match metric {
        GoalMetric::Revenue => {
            "SELECT COALESCE(SUM(s.total_amount), 0)::FLOAT8 FROM sales s
             WHERE s.status = 'completed' AND s.sale_date BETWEEN $1 AND $2
               AND ($3::BIGINT IS NULL OR s.seller_id = $3)"
        }
        GoalMetric::SalesCount => {
            "SELECT COUNT(*)::FLOAT8 FROM sales s
             WHERE s.status = 'completed' AND s.sale_date BETWEEN $1 AND $2
               AND ($3::BIGINT IS NULL OR s.seller_id = $3)"
        }
        GoalMetric::ItemsSold => {
            "SELECT COUNT(i.id)::FLOAT8 FROM sale_items i
             JOIN sales s ON s.id = i.sale_id
             WHERE s.status = 'completed' AND s.sale_date BETWEEN $1 AND $2
               AND ($3::BIGINT IS NULL OR s.seller_id = $3)"
        }
    };

    let current: f64 = sqlx::query_scalar(sql)
        .bind(goal.starts_on)
        .bind(goal.ends_on)
        .bind(goal.seller_id)
        .fetch_one(pool)
        .await?;

    Ok(progress_of(goal, current))
}

fn progress_of(goal: &Goal, current: f64) -> GoalProgress {
    let current = round_money(current);
    GoalProgress {
        goal_id: goal.id,
        title: goal.title.clone(),
        metric: goal.metric.clone(),
        seller_id: goal.seller_id,
        starts_on: goal.starts_on,
        ends_on: goal.ends_on,
        target: goal.target,
        current,
        percent: progress_percent(current, goal.target),
        achieved: goal.target > 0.0 && current >= goal.target,
    }
}
