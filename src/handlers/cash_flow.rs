use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use tracing::instrument;

use crate::dtos::finance::{CashFlowRequest, CashFlowSummary, CashFlowSummaryQuery, DateRangeQuery};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::finance::{CashFlowEntry, CASH_FLOW_COLUMNS};
use crate::services::finance::{cash_flow_series, CashFlowKind};
use crate::services::format::round_money;
use crate::services::validation::validate_date_range;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<CashFlowEntry>>, AppError> {
    query.validate()?;

    let entries = sqlx::query_as::<_, CashFlowEntry>(&format!(
        "SELECT {CASH_FLOW_COLUMNS} FROM cash_flow_entries
         WHERE ($1::DATE IS NULL OR occurred_on >= $1)
           AND ($2::DATE IS NULL OR occurred_on <= $2)
         ORDER BY occurred_on DESC, id DESC"
    ))
    .bind(query.from)
    .bind(query.to)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(entries))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CashFlowRequest>,
) -> Result<(StatusCode, Json<CashFlowEntry>), AppError> {
    auth.require_manager("record cash flow entries")?;
    let kind = payload.validate()?;

    let entry = sqlx::query_as::<_, CashFlowEntry>(&format!(
        "INSERT INTO cash_flow_entries (kind, amount, occurred_on, description)
         VALUES ($1, $2::FLOAT8, $3, $4)
         RETURNING {CASH_FLOW_COLUMNS}"
    ))
    .bind(kind.as_str())
    .bind(round_money(payload.amount))
    .bind(payload.occurred_on)
    .bind(payload.description.trim())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// GET /cash-flow/summary?from=&to=
#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<CashFlowSummaryQuery>,
) -> Result<Json<CashFlowSummary>, AppError> {
    validate_date_range(Some(query.from), Some(query.to))?;

    let opening: f64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(CASE WHEN kind = 'inflow' THEN amount ELSE -amount END), 0)::FLOAT8
         FROM cash_flow_entries WHERE occurred_on < $1"
    )
    .bind(query.from)
    .fetch_one(&state.db_pool)
    .await?;

    let rows: Vec<(NaiveDate, String, f64)> = sqlx::query_as(
        "SELECT occurred_on, kind, amount::FLOAT8 FROM cash_flow_entries
         WHERE occurred_on BETWEEN $1 AND $2
         ORDER BY occurred_on, id"
    )
    .bind(query.from)
    .bind(query.to)
    .fetch_all(&state.db_pool)
    .await?;

    let entries = rows
        .into_iter()
        .map(|(date, kind, amount)| {
            let kind: CashFlowKind = kind.parse().map_err(AppError::internal)?;
            Ok((date, kind, amount))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Json(summarize(query.from, query.to, opening, &entries)))
}

fn summarize(
    from: NaiveDate,
    to: NaiveDate,
    opening: f64,
    entries: &[(NaiveDate, CashFlowKind, f64)],
) -> CashFlowSummary {
    let total = |wanted: CashFlowKind| -> f64 {
        entries.iter().filter(|(_, kind, _)| *kind == wanted).map(|(_, _, amount)| amount).sum()
    };
    let inflow = total(CashFlowKind::Inflow);
    let outflow = total(CashFlowKind::Outflow);
    let net: f64 = entries.iter().map(|(_, kind, amount)| kind.signed(*amount)).sum();

    CashFlowSummary {
        from,
        to,
        opening_balance: round_money(opening),
        total_inflow: round_money(inflow),
        total_outflow: round_money(outflow),
        net: round_money(net),
        closing_balance: round_money(opening + net),
        days: cash_flow_series(opening, entries),
    }
}
