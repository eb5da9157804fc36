use axum::{middleware, routing::get, Router};
use crate::handlers::seller::{
    create_seller, delete_seller, get_seller, get_seller_performance, list_sellers, update_seller,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sellers", get(list_sellers).post(create_seller))
        .route("/sellers/{id}", get(get_seller).put(update_seller).delete(delete_seller))
        .route("/sellers/{id}/performance", get(get_seller_performance))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
