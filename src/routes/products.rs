use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use crate::handlers::product::{
    create_product, delete_product, get_product, get_products, get_stock_summary, update_product,
    update_product_status,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route("/products/stock-summary", get(get_stock_summary))
        .route("/products/{id}", get(get_product).put(update_product).delete(delete_product))
        .route("/products/{id}/status", patch(update_product_status))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
