use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use crate::handlers::redemption::{
    approve_redemption, cancel_redemption, create_redemption, list_redemptions, reject_redemption,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/redemptions", get(list_redemptions).post(create_redemption))
        .route("/redemptions/{id}/approve", post(approve_redemption))
        .route("/redemptions/{id}/reject", post(reject_redemption))
        .route("/redemptions/{id}/cancel", post(cancel_redemption))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
