use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, instrument};

use crate::dtos::lead::{LeadFilter, LeadStatus, SubmitLeadRequest, UpdateLeadRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::lead::Lead;
use crate::state::AppState;

const LEAD_COLUMNS: &str = "id, name, email, phone, message, source, status, created_at";

// POST /leads - public contact form
#[instrument(skip(state, payload))]
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(payload): Json<SubmitLeadRequest>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    payload.validate()?;
    let payload = payload.normalized();

    let lead = sqlx::query_as::<_, Lead>(&format!(
        "INSERT INTO leads (name, email, phone, message, source)
         VALUES ($1, $2, $3, $4, COALESCE($5, 'site'))
         RETURNING {LEAD_COLUMNS}"
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.message)
    .bind(&payload.source)
    .fetch_one(&state.db_pool)
    .await?;

    info!(lead_id = lead.id, source = %lead.source, "Lead received");
    Ok((StatusCode::CREATED, Json(lead)))
}

#[instrument(skip(state, auth))]
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(filter): Query<LeadFilter>,
) -> Result<Json<Vec<Lead>>, AppError> {
    auth.require_manager("view leads")?;
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<LeadStatus>)
        .transpose()
        .map_err(AppError::validation)?;

    let leads = sqlx::query_as::<_, Lead>(&format!(
        "SELECT {LEAD_COLUMNS} FROM leads
         WHERE ($1::TEXT IS NULL OR status = $1)
         ORDER BY created_at DESC"
    ))
    .bind(status.map(LeadStatus::as_str))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(leads))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_lead_status(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    auth.require_manager("update leads")?;
    let status: LeadStatus = payload.status.parse().map_err(AppError::validation)?;

    let lead = sqlx::query_as::<_, Lead>(&format!(
        "UPDATE leads SET status = $1 WHERE id = $2 RETURNING {LEAD_COLUMNS}"
    ))
    .bind(status.as_str())
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Lead not found"))?;

    Ok(Json(lead))
}
