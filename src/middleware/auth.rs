use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::state::AppState;

pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_SELLER: &str = "seller";

#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: String,
    pub username: String,
}

impl AuthContext {
    pub fn is_manager(&self) -> bool {
        self.role == ROLE_MANAGER
    }

    pub fn require_manager(&self, action: &str) -> Result<(), AppError> {
        if self.is_manager() {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("Only managers can {action}")))
        }
    }
}

#[derive(Serialize)]
struct ErrorBody { error: String, code: &'static str }

/// Reads and verifies the bearer token of a request.
pub fn context_from_headers(headers: &HeaderMap, secret: &str) -> Result<AuthContext, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or("Missing Authorization header")?;

    // Expect "Bearer <token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or("Invalid Authorization format")?;

    let claims = verify_token(token, secret).map_err(|_| "Invalid or expired token")?;

    Ok(AuthContext {
        user_id: claims.sub,
        role: claims.role,
        username: claims.username,
    })
}

pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match context_from_headers(req.headers(), &state.config.jwt_secret) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(msg) => unauthorized(msg),
    }
}

fn unauthorized(msg: &str) -> Response {
    let body = axum::Json(ErrorBody { error: msg.to_string(), code: "unauthorized" });
    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: &str) -> AuthContext {
        AuthContext { user_id: 1, role: role.to_string(), username: "u".into() }
    }

    #[test]
    fn headers_without_bearer_prefix_are_rejected() {
        let mut headers = HeaderMap::new();
        assert_eq!(context_from_headers(&headers, "k").unwrap_err(), "Missing Authorization header");
        headers.insert(AUTHORIZATION, "Token abc".parse().unwrap());
        assert_eq!(context_from_headers(&headers, "k").unwrap_err(), "Invalid Authorization format");
    }

    #[test]
    fn valid_bearer_token_yields_context() {
        let token = crate::auth::jwt::sign_token(3, ROLE_SELLER, "caio", "k").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        let ctx = context_from_headers(&headers, "k").unwrap();
        assert_eq!(ctx.user_id, 3);
        assert!(!ctx.is_manager());
    }

    #[test]
    fn manager_passes_manager_gate() {
        assert!(ctx(ROLE_MANAGER).require_manager("delete products").is_ok());
    }

    #[test]
    fn seller_is_forbidden_with_action_in_message() {
        let err = ctx(ROLE_SELLER).require_manager("delete products").unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert_eq!(msg, "Only managers can delete products"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
