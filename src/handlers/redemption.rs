use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::dtos::redemption::{CreateRedemptionRequest, RedemptionFilter, ReviewRedemptionRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::loyalty::RedemptionRequest;
use crate::services::loyalty::RedemptionStatus;
use crate::services::validation::clean_optional;
use crate::state::AppState;

const REDEMPTION_COLUMNS: &str =
    "id, customer_id, points, reward, status, reason, reviewed_by, reviewed_at, created_at";

/// Current points balance of a customer: the sum of its ledger.
pub(crate) async fn points_balance<'e>(
    db: impl PgExecutor<'e>,
    customer_id: i64,
) -> Result<i64, AppError> {
    let balance: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM points_ledger WHERE customer_id = $1"
    )
    .bind(customer_id)
    .fetch_one(db)
    .await?;

    Ok(balance)
}

#[instrument(skip(state, payload), fields(customer_id = payload.customer_id))]
pub async fn create_redemption(
    State(state): State<AppState>,
    Json(payload): Json<CreateRedemptionRequest>,
) -> Result<(StatusCode, Json<RedemptionRequest>), AppError> {
    payload.validate()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
        .bind(payload.customer_id)
        .fetch_one(&state.db_pool)
        .await?;
    if !exists {
        return Err(AppError::not_found("Customer not found"));
    }

    let balance = points_balance(&state.db_pool, payload.customer_id).await?;
    if payload.points > balance {
        return Err(AppError::validation(format!(
            "Insufficient points: requested {}, available {}",
            payload.points, balance
        )));
    }

    let request = sqlx::query_as::<_, RedemptionRequest>(&format!(
        "INSERT INTO redemption_requests (customer_id, points, reward)
         VALUES ($1, $2, $3)
         RETURNING {REDEMPTION_COLUMNS}"
    ))
    .bind(payload.customer_id)
    .bind(payload.points)
    .bind(payload.reward.trim())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[instrument(skip(state))]
pub async fn list_redemptions(
    State(state): State<AppState>,
    Query(filter): Query<RedemptionFilter>,
) -> Result<Json<Vec<RedemptionRequest>>, AppError> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<RedemptionStatus>)
        .transpose()
        .map_err(AppError::validation)?;

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT {REDEMPTION_COLUMNS} FROM redemption_requests WHERE 1=1"
    ));
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id);
    }
    qb.push(" ORDER BY created_at DESC");

    let requests = qb
        .build_query_as::<RedemptionRequest>()
        .fetch_all(&state.db_pool)
        .await?;

    Ok(Json(requests))
}

// POST /redemptions/:id/approve
#[instrument(skip(state, auth))]
pub async fn approve_redemption(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<RedemptionRequest>, AppError> {
    auth.require_manager("approve redemptions")?;

    let mut tx = state.db_pool.begin().await?;

    let (customer_id, points, status): (i64, i64, String) = sqlx::query_as(
        "SELECT customer_id, points, status FROM redemption_requests WHERE id = $1 FOR UPDATE"
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Redemption request not found"))?;

    ensure_transition(&status, RedemptionStatus::Approved)?;

    // Serializes concurrent approvals for the same customer.
    sqlx::query("SELECT id FROM customers WHERE id = $1 FOR UPDATE")
        .bind(customer_id)
        .execute(&mut *tx)
        .await?;

    let balance = points_balance(&mut *tx, customer_id).await?;
    if points > balance {
        return Err(AppError::validation(format!(
            "Insufficient points: requested {points}, available {balance}"
        )));
    }

    let request = sqlx::query_as::<_, RedemptionRequest>(&format!(
        "UPDATE redemption_requests
         SET status = 'approved', reviewed_by = $1, reviewed_at = NOW()
         WHERE id = $2
         RETURNING {REDEMPTION_COLUMNS}"
    ))
    .bind(auth.user_id)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO points_ledger (customer_id, delta, reason, redemption_id)
         VALUES ($1, $2, 'redemption', $3)"
    )
    .bind(customer_id)
    .bind(-points)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(redemption_id = id, customer_id, points, "Redemption approved");
    Ok(Json(request))
}

// POST /redemptions/:id/reject
#[instrument(skip(state, auth, payload))]
pub async fn reject_redemption(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Option<Json<ReviewRedemptionRequest>>,
) -> Result<Json<RedemptionRequest>, AppError> {
    auth.require_manager("reject redemptions")?;
    let reason = payload.and_then(|Json(p)| clean_optional(p.reason));

    let request = close_request(&state, id, RedemptionStatus::Rejected, Some(auth.user_id), reason).await?;
    Ok(Json(request))
}

// POST /redemptions/:id/cancel
#[instrument(skip(state))]
pub async fn cancel_redemption(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<RedemptionRequest>, AppError> {
    let request = close_request(&state, id, RedemptionStatus::Cancelled, None, None).await?;
    Ok(Json(request))
}

async fn close_request(
    state: &AppState,
    id: i64,
    next: RedemptionStatus,
    reviewer: Option<i64>,
    reason: Option<String>,
) -> Result<RedemptionRequest, AppError> {
    let mut tx = state.db_pool.begin().await?;

    let status: String = sqlx::query_scalar("SELECT status FROM redemption_requests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Redemption request not found"))?;

    ensure_transition(&status, next)?;

    let request = sqlx::query_as::<_, RedemptionRequest>(&format!(
        "UPDATE redemption_requests
         SET status = $1, reason = $2, reviewed_by = $3,
             reviewed_at = CASE WHEN $3::BIGINT IS NULL THEN NULL ELSE NOW() END
         WHERE id = $4
         RETURNING {REDEMPTION_COLUMNS}"
    ))
    .bind(next.as_str())
    .bind(reason)
    .bind(reviewer)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(request)
}

fn ensure_transition(current: &str, next: RedemptionStatus) -> Result<(), AppError> {
    let current: RedemptionStatus = current.parse().map_err(AppError::internal)?;
    if !current.can_transition_to(next) {
        return Err(AppError::validation(format!(
            "Cannot move a {} request to {}",
            current.as_str(),
            next.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::handlers::testing::{manager, seed_customer, seed_user, state};

    #[test]
    fn only_pending_requests_can_be_closed() {
        assert!(ensure_transition("pending", RedemptionStatus::Approved).is_ok());
        assert!(ensure_transition("pending", RedemptionStatus::Cancelled).is_ok());
        let err = ensure_transition("approved", RedemptionStatus::Cancelled).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(ensure_transition("rejected", RedemptionStatus::Approved).is_err());
    }

    #[test]
    fn unknown_stored_status_is_internal() {
        let err = ensure_transition("archived", RedemptionStatus::Approved).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn approval_never_overdraws_points(pool: PgPool) {
        let user_id = seed_user(&pool, "ana").await;
        let customer_id = seed_customer(&pool, "Bia").await;
        sqlx::query("INSERT INTO points_ledger (customer_id, delta, reason) VALUES ($1, 100, 'adjustment')")
            .bind(customer_id)
            .execute(&pool)
            .await
            .unwrap();

        // Both requests fit the balance on their own, but not together.
        let mut ids = Vec::new();
        for reward in ["Vale-compra", "Bolsa de tecido"] {
            let (_, Json(request)) = create_redemption(
                State(state(pool.clone())),
                Json(CreateRedemptionRequest { customer_id, points: 80, reward: reward.to_string() }),
            )
            .await
            .unwrap();
            ids.push(request.id);
        }

        let Json(approved) =
            approve_redemption(Path(ids[0]), State(state(pool.clone())), Extension(manager(user_id)))
                .await
                .unwrap();
        assert_eq!(approved.status, "approved");

        let second =
            approve_redemption(Path(ids[1]), State(state(pool.clone())), Extension(manager(user_id))).await;
        assert!(matches!(second, Err(AppError::ValidationError(_))));

        assert_eq!(points_balance(&pool, customer_id).await.unwrap(), 20);
        let status: String = sqlx::query_scalar("SELECT status FROM redemption_requests WHERE id = $1")
            .bind(ids[1])
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(status, "pending");
    }
}
