pub mod cash_flow;
pub mod categories;
pub mod chat;
pub mod commissions;
pub mod customers;
pub mod expenses;
pub mod goals;
pub mod leads;
pub mod products;
pub mod redemptions;
pub mod reports;
pub mod revenues;
pub mod sales;
pub mod sellers;
pub mod suppliers;
pub mod users;

use axum::Router;
use crate::state::AppState;

pub fn create_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(users::routes(state.clone()))
        .merge(categories::routes(state.clone()))
        .merge(suppliers::routes(state.clone()))
        .merge(products::routes(state.clone()))
        .merge(customers::routes(state.clone()))
        .merge(sellers::routes(state.clone()))
        .merge(commissions::routes(state.clone()))
        .merge(sales::routes(state.clone()))
        .merge(revenues::routes(state.clone()))
        .merge(expenses::routes(state.clone()))
        .merge(cash_flow::routes(state.clone()))
        .merge(reports::routes(state.clone()))
        .merge(goals::routes(state.clone()))
        .merge(redemptions::routes(state.clone()))
        .merge(leads::routes(state.clone()))
        .merge(chat::routes(state.clone()))
}
