use axum::{middleware, routing::get, Router};
use crate::handlers::revenue::{
    create_revenue, delete_revenue, get_revenue, list_revenues, update_revenue,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/revenues", get(list_revenues).post(create_revenue))
        .route("/revenues/{id}", get(get_revenue).put(update_revenue).delete(delete_revenue))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
