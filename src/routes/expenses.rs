use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use crate::handlers::expense::{
    create_expense, delete_expense, get_expense, list_expenses, pay_expense, update_expense,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/{id}", get(get_expense).put(update_expense).delete(delete_expense))
        .route("/expenses/{id}/pay", post(pay_expense))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
