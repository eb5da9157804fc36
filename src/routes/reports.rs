use axum::{middleware, routing::get, Router};
use crate::handlers::report::{get_balance_sheet, get_dashboard, get_monthly_report};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/reports/balance-sheet", get(get_balance_sheet))
        .route("/reports/monthly", get(get_monthly_report))
        .route("/reports/dashboard", get(get_dashboard))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
