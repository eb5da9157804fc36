use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use crate::handlers::commission;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/commission-rules", get(commission::list_rules).post(commission::create_rule))
        .route(
            "/commission-rules/{id}",
            get(commission::get_rule)
                .put(commission::update_rule)
                .delete(commission::delete_rule),
        )
        .route("/commissions/payoff", post(commission::payoff))
        .route("/commissions/payouts", get(commission::list_payouts))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
