use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use tracing::{info, instrument};

use crate::dtos::commission::{CommissionRuleRequest, PayoffRequest, PayoffResponse, PayoutQuery};
use crate::error::{map_constraint_violation, AppError};
use crate::middleware::auth::AuthContext;
use crate::models::commission::{
    CommissionPayout, CommissionRule, COMMISSION_RULE_COLUMNS, PAYOUT_COLUMNS,
};
use crate::services::format::{format_date_br, round_money};
use crate::state::AppState;

const UNKNOWN_SELLER: &str = "Seller does not exist";

#[instrument(skip(state))]
pub async fn list_rules(State(state): State<AppState>) -> Result<Json<Vec<CommissionRule>>, AppError> {
    let rules = sqlx::query_as::<_, CommissionRule>(&format!(
        "SELECT {COMMISSION_RULE_COLUMNS} FROM commission_rules ORDER BY active DESC, created_at DESC"
    ))
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(rules))
}

#[instrument(skip(state))]
pub async fn get_rule(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CommissionRule>, AppError> {
    let rule = sqlx::query_as::<_, CommissionRule>(&format!(
        "SELECT {COMMISSION_RULE_COLUMNS} FROM commission_rules WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Commission rule not found"))?;

    Ok(Json(rule))
}

#[instrument(skip(state, auth, payload))]
pub async fn create_rule(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CommissionRuleRequest>,
) -> Result<(StatusCode, Json<CommissionRule>), AppError> {
    auth.require_manager("manage commission rules")?;
    let kind = payload.validate()?;

    let rule = sqlx::query_as::<_, CommissionRule>(&format!(
        "INSERT INTO commission_rules (name, seller_id, kind, value, active, starts_on, ends_on)
         VALUES ($1, $2, $3, $4::FLOAT8, $5, $6, $7)
         RETURNING {COMMISSION_RULE_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(payload.seller_id)
    .bind(kind.as_str())
    .bind(round_money(payload.value))
    .bind(payload.active.unwrap_or(true))
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Commission rule already exists", UNKNOWN_SELLER))?;

    info!(rule_id = rule.id, kind = kind.as_str(), "Commission rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

#[instrument(skip(state, auth, payload))]
pub async fn update_rule(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CommissionRuleRequest>,
) -> Result<Json<CommissionRule>, AppError> {
    auth.require_manager("manage commission rules")?;
    let kind = payload.validate()?;

    let rule = sqlx::query_as::<_, CommissionRule>(&format!(
        "UPDATE commission_rules SET name = $1, seller_id = $2, kind = $3, value = $4::FLOAT8,
             active = COALESCE($5, active), starts_on = $6, ends_on = $7
         WHERE id = $8
         RETURNING {COMMISSION_RULE_COLUMNS}"
    ))
    .bind(payload.name.trim())
    .bind(payload.seller_id)
    .bind(kind.as_str())
    .bind(round_money(payload.value))
    .bind(payload.active)
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .bind(id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_constraint_violation(e, "Commission rule already exists", UNKNOWN_SELLER))?
    .ok_or_else(|| AppError::not_found("Commission rule not found"))?;

    Ok(Json(rule))
}

#[instrument(skip(state, auth))]
pub async fn delete_rule(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    auth.require_manager("manage commission rules")?;

    let result = sqlx::query("DELETE FROM commission_rules WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Commission rule not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Rules that could apply to a seller's sale on `date`; selection happens in `select_rule`.
pub(crate) async fn candidate_rules(
    conn: &mut PgConnection,
    seller_id: i64,
    date: NaiveDate,
) -> Result<Vec<CommissionRule>, sqlx::Error> {
    sqlx::query_as::<_, CommissionRule>(&format!(
        "SELECT {COMMISSION_RULE_COLUMNS} FROM commission_rules
         WHERE active
           AND (seller_id IS NULL OR seller_id = $1)
           AND (starts_on IS NULL OR starts_on <= $2)
           AND (ends_on IS NULL OR ends_on >= $2)"
    ))
    .bind(seller_id)
    .bind(date)
    .fetch_all(conn)
    .await
}

// POST /commissions/payoff - Pay every pending commission of a seller up to a date
#[instrument(skip(state, auth, payload), fields(seller_id = payload.seller_id))]
pub async fn payoff(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<PayoffRequest>,
) -> Result<(StatusCode, Json<PayoffResponse>), AppError> {
    auth.require_manager("pay commissions")?;

    let mut tx = state.db_pool.begin().await?;

    let seller_name: String = sqlx::query_scalar("SELECT name FROM sellers WHERE id = $1")
        .bind(payload.seller_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Seller not found"))?;

    let pending: Vec<(i64, f64)> = sqlx::query_as(
        "SELECT id, commission_amount::FLOAT8 FROM sales
         WHERE seller_id = $1 AND status = 'completed' AND commission_status = 'pending'
           AND sale_date <= $2
         ORDER BY sale_date, id
         FOR UPDATE"
    )
    .bind(payload.seller_id)
    .bind(payload.until)
    .fetch_all(&mut *tx)
    .await?;

    let amount = round_money(pending.iter().map(|(_, c)| c).sum());
    if pending.is_empty() || amount <= 0.0 {
        return Err(AppError::validation("No pending commission to pay for this seller"));
    }
    let sale_ids: Vec<i64> = pending.iter().map(|(id, _)| *id).collect();
    let today = Utc::now().date_naive();

    let payout = sqlx::query_as::<_, CommissionPayout>(&format!(
        "INSERT INTO commission_payouts (seller_id, amount, period_until, sales_count, paid_by)
         VALUES ($1, $2::FLOAT8, $3, $4, $5)
         RETURNING {PAYOUT_COLUMNS}"
    ))
    .bind(payload.seller_id)
    .bind(amount)
    .bind(payload.until)
    .bind(sale_ids.len() as i32)
    .bind(auth.user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE sales SET commission_status = 'paid', commission_payout_id = $1 WHERE id = ANY($2)"
    )
    .bind(payout.id)
    .bind(&sale_ids)
    .execute(&mut *tx)
    .await?;

    let description = format!("Comissão {} até {}", seller_name, format_date_br(payload.until));
    let expense_id: i64 = sqlx::query_scalar(
        "INSERT INTO expenses (description, category, amount, incurred_on, paid, paid_on)
         VALUES ($1, 'commissions', $2::FLOAT8, $3, TRUE, $3)
         RETURNING id"
    )
    .bind(&description)
    .bind(amount)
    .bind(today)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO cash_flow_entries (kind, amount, occurred_on, description, expense_id)
         VALUES ('outflow', $1::FLOAT8, $2, $3, $4)"
    )
    .bind(amount)
    .bind(today)
    .bind(&description)
    .bind(expense_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(payout_id = payout.id, amount, sales = sale_ids.len(), "Commission paid");
    Ok((StatusCode::CREATED, Json(PayoffResponse { payout, expense_id, sale_ids })))
}

// GET /commissions/payouts?seller_id=
#[instrument(skip(state))]
pub async fn list_payouts(
    State(state): State<AppState>,
    Query(query): Query<PayoutQuery>,
) -> Result<Json<Vec<CommissionPayout>>, AppError> {
    let payouts = sqlx::query_as::<_, CommissionPayout>(&format!(
        "SELECT {PAYOUT_COLUMNS} FROM commission_payouts
         WHERE ($1::BIGINT IS NULL OR seller_id = $1)
         ORDER BY created_at DESC"
    ))
    .bind(query.seller_id)
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(payouts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::handlers::sale::{cancel_sale, create_sale};
    use crate::handlers::testing::{day, manager, sale_of, seed_product, seed_seller, seed_user, state};

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn payoff_settles_pending_commissions_once(pool: PgPool) {
        let user_id = seed_user(&pool, "ana").await;
        let seller_id = seed_seller(&pool, "Caio", 10.0).await;
        let coat = seed_product(&pool, "Casaco de lã", 100.0).await;
        let boots = seed_product(&pool, "Bota couro", 50.5).await;
        let late = seed_product(&pool, "Cinto", 20.0).await;

        let mut sale_ids = Vec::new();
        for (product, date) in [(coat, day(2024, 5, 10)), (boots, day(2024, 5, 20)), (late, day(2024, 6, 2))] {
            let (_, Json(sale)) = create_sale(
                State(state(pool.clone())),
                Extension(manager(user_id)),
                Json(sale_of(&[product], None, Some(seller_id), date)),
            )
            .await
            .unwrap();
            sale_ids.push(sale.id);
        }

        let request = || PayoffRequest { seller_id, until: day(2024, 5, 31) };
        let (status, Json(paid)) =
            payoff(State(state(pool.clone())), Extension(manager(user_id)), Json(request()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(paid.payout.amount, 15.05);
        assert_eq!(paid.payout.sales_count, 2);
        assert_eq!(paid.sale_ids, sale_ids[..2].to_vec());

        let (expense_amount, expense_paid): (f64, bool) =
            sqlx::query_as("SELECT amount::FLOAT8, paid FROM expenses WHERE id = $1")
                .bind(paid.expense_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(expense_amount, 15.05);
        assert!(expense_paid);

        let outflow: f64 = sqlx::query_scalar(
            "SELECT amount::FLOAT8 FROM cash_flow_entries WHERE kind = 'outflow' AND expense_id = $1",
        )
        .bind(paid.expense_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(outflow, 15.05);

        let statuses: Vec<String> =
            sqlx::query_scalar("SELECT commission_status FROM sales ORDER BY id")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(statuses, ["paid", "paid", "pending"]);

        let again = payoff(State(state(pool.clone())), Extension(manager(user_id)), Json(request())).await;
        assert!(matches!(again, Err(AppError::ValidationError(_))));

        let cancel = cancel_sale(State(state(pool.clone())), Extension(manager(user_id)), Path(sale_ids[0])).await;
        assert!(matches!(cancel, Err(AppError::ValidationError(_))));
    }
}
