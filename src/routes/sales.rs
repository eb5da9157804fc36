use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use crate::handlers::sale;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sales", get(sale::list_sales).post(sale::create_sale))
        .route("/sales/{id}", get(sale::get_sale))
        .route("/sales/{id}/cancel", post(sale::cancel_sale))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
