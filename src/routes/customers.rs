use axum::{middleware, routing::get, Router};
use crate::handlers::customer::{
    create_customer, delete_customer, get_customer, get_customer_points, list_customers,
    update_customer,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/points", get(get_customer_points))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
