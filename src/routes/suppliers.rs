use axum::{middleware, routing::get, Router};
use crate::handlers::supplier::{
    create_supplier, delete_supplier, get_supplier, list_suppliers, update_supplier,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
