use bcrypt::{hash, verify, DEFAULT_COST};
use crate::dtos::user::{RegisterUserRequest, UserResponse, LoginRequest, LoginResponse};
use crate::auth::jwt::{sign_token, TOKEN_TTL_HOURS};
use crate::error::AppError;
use crate::models::user::User;
use axum::{extract::State, http::{HeaderMap, StatusCode}, Json};
use crate::state::AppState;
use crate::middleware::auth::{context_from_headers, AuthContext};
use axum::extract::Extension;
use tracing::{info, instrument};

const USER_COLUMNS: &str = "id, username, password_hash, role, is_active, created_at";

/// The first account can register itself; after that only managers create users.
#[instrument(skip(db_pool, config, headers, payload), fields(username = %payload.username))]
pub async fn register_user(
    State(AppState { db_pool, config, .. }): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterUserRequest>
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Hash error: {e}")))?;

    // Held until commit: concurrent registrations see the first insert
    let mut tx = db_pool.begin().await?;
    sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let has_users: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users)")
        .fetch_one(&mut *tx)
        .await?;
    if has_users {
        let auth = context_from_headers(&headers, &config.jwt_secret)
            .map_err(|_| AppError::Unauthorized)?;
        auth.require_manager("register users")?;
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password_hash, role)
         VALUES ($1, $2, $3)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(payload.username.trim())
    .bind(password_hash)
    .bind(&payload.role)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return AppError::conflict("Username already exists");
            }
        }
        AppError::db(e)
    })?;

    tx.commit().await?;

    info!(user_id = user.id, role = %user.role, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login_user(
    State(AppState { db_pool, config, .. }): State<AppState>,
    Json(payload): Json<LoginRequest>
) -> Result<Json<LoginResponse>, AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::validation("Username required"));
    }
    if payload.password.is_empty() {
        return Err(AppError::validation("Password required"));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(payload.username.trim())
    .fetch_optional(&db_pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::forbidden("User inactive"));
    }

    let ok = verify(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal(format!("Password verify error: {e}")))?;

    if !ok {
        return Err(AppError::Unauthorized);
    }

    let token = sign_token(user.id, &user.role, &user.username, &config.jwt_secret)?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer",
        expires_in_seconds: (TOKEN_TTL_HOURS * 60 * 60) as usize,
    }))
}

// Authenticated endpoint: returns full user profile from DB using the id in AuthContext
pub async fn get_me(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>
) -> Result<Json<UserResponse>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(auth.user_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::handlers::testing::state;

    fn first_account(username: &str) -> Json<RegisterUserRequest> {
        Json(RegisterUserRequest {
            username: username.to_string(),
            password: "segredo123".to_string(),
            role: "manager".to_string(),
        })
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn only_one_concurrent_bootstrap_registration_succeeds(pool: PgPool) {
        let (a, b) = tokio::join!(
            register_user(State(state(pool.clone())), HeaderMap::new(), first_account("ana")),
            register_user(State(state(pool.clone())), HeaderMap::new(), first_account("bia")),
        );

        let created = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(created, 1);
        assert!(matches!(a, Err(AppError::Unauthorized)) || matches!(b, Err(AppError::Unauthorized)));

        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(users, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn later_registrations_need_a_manager_token(pool: PgPool) {
        register_user(State(state(pool.clone())), HeaderMap::new(), first_account("ana"))
            .await
            .unwrap();
        let second = register_user(State(state(pool.clone())), HeaderMap::new(), first_account("bia")).await;
        assert!(matches!(second, Err(AppError::Unauthorized)));
    }
}
