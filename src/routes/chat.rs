use axum::{middleware, routing::post, Router};
use crate::handlers::chat::send_message;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/chat", post(send_message))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
