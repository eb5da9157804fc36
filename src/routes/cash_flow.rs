use axum::{middleware, routing::get, Router};
use crate::handlers::cash_flow::{create_entry, get_summary, list_entries};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/cash-flow", get(list_entries).post(create_entry))
        .route("/cash-flow/summary", get(get_summary))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
