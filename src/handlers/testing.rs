//! Fixtures for handler tests that run against a migrated database.

use std::time::Duration;

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::dtos::sale::{CreateSaleRequest, SaleItemRequest};
use crate::middleware::auth::{AuthContext, ROLE_MANAGER};
use crate::services::chat::ChatClient;
use crate::state::AppState;

pub(crate) fn state(pool: PgPool) -> AppState {
    let config = AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap();
    let chat = ChatClient::new(None, Duration::from_secs(1)).unwrap();
    AppState::new(pool, config, chat)
}

pub(crate) fn manager(user_id: i64) -> AuthContext {
    AuthContext {
        user_id,
        role: ROLE_MANAGER.to_string(),
        username: "gerente".to_string(),
    }
}

pub(crate) fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) async fn seed_user(pool: &PgPool, username: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, role) VALUES ($1, 'x', 'manager') RETURNING id",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub(crate) async fn seed_product(pool: &PgPool, name: &str, sale_price: f64) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO products (name, sale_price, cost_price)
         VALUES ($1, $2::FLOAT8, ($2::FLOAT8 / 2)::NUMERIC(12,2)) RETURNING id",
    )
    .bind(name)
    .bind(sale_price)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub(crate) async fn seed_customer(pool: &PgPool, name: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO customers (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Seller with a percentage commission rule of their own.
pub(crate) async fn seed_seller(pool: &PgPool, name: &str, percent: f64) -> i64 {
    let seller_id: i64 = sqlx::query_scalar("INSERT INTO sellers (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO commission_rules (name, seller_id, kind, value)
         VALUES ($1, $2, 'percentage', $3::FLOAT8)",
    )
    .bind(format!("Regra {name}"))
    .bind(seller_id)
    .bind(percent)
    .execute(pool)
    .await
    .unwrap();
    seller_id
}

pub(crate) fn sale_of(
    product_ids: &[i64],
    customer_id: Option<i64>,
    seller_id: Option<i64>,
    sale_date: NaiveDate,
) -> CreateSaleRequest {
    CreateSaleRequest {
        customer_id,
        seller_id,
        sale_date,
        payment_method: "pix".to_string(),
        discount: None,
        notes: None,
        items: product_ids
            .iter()
            .map(|&product_id| SaleItemRequest { product_id, unit_price: None })
            .collect(),
    }
}
