use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use crate::handlers::lead::{list_leads, submit_lead, update_lead_status};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    // Site contact form, no login.
    let open = Router::new().route("/leads", post(submit_lead));

    let protected = Router::new()
        .route("/leads", get(list_leads))
        .route("/leads/{id}", patch(update_lead_status))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    open.merge(protected)
}
