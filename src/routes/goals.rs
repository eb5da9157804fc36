use axum::{middleware, routing::get, Router};
use crate::handlers::goal::{
    create_goal, delete_goal, get_goal, get_goal_progress, list_goals, update_goal,
};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/{id}", get(get_goal).put(update_goal).delete(delete_goal))
        .route("/goals/{id}/progress", get(get_goal_progress))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}
