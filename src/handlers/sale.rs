use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument};

use crate::dtos::sale::{
    sale_totals, CreateSaleRequest, SaleFilter, SaleItemResponse, SaleListItem, SaleResponse,
    SaleSummary,
};
use crate::error::AppError;
use crate::handlers::commission::candidate_rules;
use crate::middleware::auth::AuthContext;
use crate::models::sale::{Sale, SaleItemRow, SALE_COLUMNS};
use crate::services::commission::select_rule;
use crate::services::format::{format_brl, round_money};
use crate::services::inventory::ProductStatus;
use crate::services::loyalty::points_for;
use crate::services::validation::validate_date_range;
use crate::state::AppState;

#[derive(FromRow)]
struct LockedProduct {
    id: i64,
    name: String,
    status: String,
    sale_price: f64,
    cost_price: f64,
}

#[derive(FromRow)]
struct SaleHeader {
    #[sqlx(flatten)]
    sale: Sale,
    customer_name: Option<String>,
    seller_name: Option<String>,
}

pub async fn create_sale(
    State(AppState { db_pool, config, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    let payment_method = req.validate()?;

    // Start transaction: sale, items, stock, revenue, cash flow and points commit together
    let mut tx = db_pool.begin().await?;

    if let Some(customer_id) = req.customer_id {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE id = $1)")
            .bind(customer_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::not_found("Customer not found"));
        }
    }

    if let Some(seller_id) = req.seller_id {
        let active: bool = sqlx::query_scalar("SELECT active FROM sellers WHERE id = $1")
            .bind(seller_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Seller not found"))?;
        if !active {
            return Err(AppError::validation("Seller is not active"));
        }
    }

    // Lock every product so a concurrent sale cannot take the same piece.
    // Locks are taken in id order to avoid deadlocks between overlapping sales.
    let product_ids: Vec<i64> = req.items.iter().map(|i| i.product_id).collect();
    let products: HashMap<i64, LockedProduct> = sqlx::query_as::<_, LockedProduct>(
        "SELECT id, name, status, sale_price::FLOAT8 AS sale_price, cost_price::FLOAT8 AS cost_price
         FROM products WHERE id = ANY($1)
         ORDER BY id
         FOR UPDATE"
    )
    .bind(&product_ids)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

    let mut lines = Vec::with_capacity(req.items.len());
    for item in &req.items {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", item.product_id)))?;

        let status: ProductStatus = product.status.parse().map_err(AppError::internal)?;
        if !status.is_sellable() {
            return Err(AppError::validation(format!(
                "Product '{}' is {} and cannot be sold",
                product.name,
                status.as_str()
            )));
        }

        // Use provided unit_price or default to the product's sale_price
        let unit_price = round_money(item.unit_price.unwrap_or(product.sale_price));
        lines.push((product.id, unit_price, product.cost_price));
    }

    let unit_prices: Vec<f64> = lines.iter().map(|(_, price, _)| *price).collect();
    let discount = req.discount.unwrap_or(0.0);
    let (subtotal, total_amount) = sale_totals(&unit_prices, discount)?;

    let (rule_id, commission_amount) = match req.seller_id {
        Some(seller_id) => {
            let rules = candidate_rules(&mut *tx, seller_id, req.sale_date).await?;
            match select_rule(&rules, seller_id, req.sale_date) {
                Some(rule) => (Some(rule.id), rule.commission_for(total_amount)),
                None => (None, 0.0),
            }
        }
        None => (None, 0.0),
    };
    let commission_status = if commission_amount > 0.0 { "pending" } else { "none" };

    let points_earned = match req.customer_id {
        Some(_) => points_for(total_amount, config.points_per_currency_unit),
        None => 0,
    };

    let sale_id: i64 = sqlx::query_scalar(
        "INSERT INTO sales (customer_id, seller_id, user_id, sale_date, payment_method, subtotal, discount,
                            total_amount, commission_rule_id, commission_amount, commission_status,
                            points_earned, notes)
         VALUES ($1, $2, $3, $4, $5, $6::FLOAT8, $7::FLOAT8, $8::FLOAT8, $9, $10::FLOAT8, $11, $12, $13)
         RETURNING id"
    )
    .bind(req.customer_id)
    .bind(req.seller_id)
    .bind(auth.user_id)
    .bind(req.sale_date)
    .bind(payment_method.as_str())
    .bind(subtotal)
    .bind(round_money(subtotal - total_amount))
    .bind(total_amount)
    .bind(rule_id)
    .bind(commission_amount)
    .bind(commission_status)
    .bind(points_earned)
    .bind(req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .fetch_one(&mut *tx)
    .await?;

    for (product_id, unit_price, cost_price) in &lines {
        sqlx::query(
            "INSERT INTO sale_items (sale_id, product_id, unit_price, cost_price)
             VALUES ($1, $2, $3::FLOAT8, $4::FLOAT8)"
        )
        .bind(sale_id)
        .bind(product_id)
        .bind(unit_price)
        .bind(cost_price)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE products SET status = 'sold', updated_at = NOW() WHERE id = ANY($1)")
        .bind(&product_ids)
        .execute(&mut *tx)
        .await?;

    if total_amount > 0.0 {
        let description = format!("Venda #{sale_id}");
        sqlx::query(
            "INSERT INTO revenues (description, category, amount, received_on, sale_id)
             VALUES ($1, 'sales', $2::FLOAT8, $3, $4)"
        )
        .bind(&description)
        .bind(total_amount)
        .bind(req.sale_date)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO cash_flow_entries (kind, amount, occurred_on, description, sale_id)
             VALUES ('inflow', $1::FLOAT8, $2, $3, $4)"
        )
        .bind(total_amount)
        .bind(req.sale_date)
        .bind(&description)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(customer_id) = req.customer_id.filter(|_| points_earned > 0) {
        sqlx::query(
            "INSERT INTO points_ledger (customer_id, delta, reason, sale_id)
             VALUES ($1, $2, 'sale', $3)"
        )
        .bind(customer_id)
        .bind(points_earned)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;
    }

    // Commit transaction
    tx.commit().await?;

    info!(sale_id, total_amount, commission_amount, points_earned, "Sale created");

    let sale = fetch_sale_by_id(&db_pool, sale_id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

#[instrument(skip(db_pool))]
pub async fn get_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, AppError> {
    fetch_sale_by_id(&db_pool, id).await.map(Json)
}

pub async fn list_sales(
    State(AppState { db_pool, .. }): State<AppState>,
    Query(filter): Query<SaleFilter>,
) -> Result<Json<Vec<SaleListItem>>, AppError> {
    validate_date_range(filter.from, filter.to)?;

    let mut qb = QueryBuilder::<Postgres>::new(
        "SELECT
            s.id, s.sale_date,
            c.name AS customer_name,
            se.name AS seller_name,
            s.payment_method,
            (s.total_amount)::FLOAT8 AS total_amount,
            (s.commission_amount)::FLOAT8 AS commission_amount,
            s.status,
            COUNT(si.id) AS total_items
        FROM sales s
        LEFT JOIN customers c ON s.customer_id = c.id
        LEFT JOIN sellers se ON s.seller_id = se.id
        LEFT JOIN sale_items si ON s.id = si.sale_id
        WHERE 1=1"
    );

    if let Some(from) = filter.from {
        qb.push(" AND s.sale_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND s.sale_date <= ").push_bind(to);
    }
    if let Some(seller_id) = filter.seller_id {
        qb.push(" AND s.seller_id = ").push_bind(seller_id);
    }
    if let Some(customer_id) = filter.customer_id {
        qb.push(" AND s.customer_id = ").push_bind(customer_id);
    }
    if let Some(status) = filter.status {
        if status != "completed" && status != "cancelled" {
            return Err(AppError::validation(format!("Invalid sale status: {status}")));
        }
        qb.push(" AND s.status = ").push_bind(status);
    }

    qb.push(" GROUP BY s.id, c.name, se.name ORDER BY s.sale_date DESC, s.id DESC");

    let sales = qb.build_query_as::<SaleListItem>().fetch_all(&db_pool).await?;
    Ok(Json(sales))
}

// POST /sales/:id/cancel - Undo every effect of a completed sale
#[instrument(skip(db_pool, auth))]
pub async fn cancel_sale(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<SaleResponse>, AppError> {
    auth.require_manager("cancel sales")?;

    let mut tx = db_pool.begin().await?;

    let sale = sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE"))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))?;

    if sale.status != "completed" {
        return Err(AppError::validation("Only completed sales can be cancelled"));
    }
    if sale.commission_status == "paid" {
        return Err(AppError::validation(
            "Commission for this sale was already paid; it cannot be cancelled",
        ));
    }

    sqlx::query(
        "UPDATE sales SET status = 'cancelled', cancelled_at = NOW(),
             commission_status = CASE WHEN commission_status = 'pending' THEN 'void' ELSE commission_status END
         WHERE id = $1"
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE products SET status = 'available', updated_at = NOW()
         WHERE id IN (SELECT product_id FROM sale_items WHERE sale_id = $1)"
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM revenues WHERE sale_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if sale.total_amount > 0.0 {
        sqlx::query(
            "INSERT INTO cash_flow_entries (kind, amount, occurred_on, description, sale_id)
             VALUES ('outflow', $1::FLOAT8, CURRENT_DATE, $2, $3)"
        )
        .bind(sale.total_amount)
        .bind(format!("Estorno da venda #{id}"))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(customer_id) = sale.customer_id.filter(|_| sale.points_earned > 0) {
        sqlx::query(
            "INSERT INTO points_ledger (customer_id, delta, reason, sale_id)
             VALUES ($1, $2, 'sale_cancelled', $3)"
        )
        .bind(customer_id)
        .bind(-sale.points_earned)
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(sale_id = id, "Sale cancelled");
    fetch_sale_by_id(&db_pool, id).await.map(Json)
}

// Helper function to fetch full sale details
async fn fetch_sale_by_id(db_pool: &PgPool, id: i64) -> Result<SaleResponse, AppError> {
    let header = sqlx::query_as::<_, SaleHeader>(
        "SELECT
            s.id, s.customer_id, s.seller_id, s.user_id, s.sale_date, s.payment_method,
            s.subtotal::FLOAT8 AS subtotal, s.discount::FLOAT8 AS discount,
            s.total_amount::FLOAT8 AS total_amount, s.commission_rule_id,
            s.commission_amount::FLOAT8 AS commission_amount, s.commission_status,
            s.points_earned, s.status, s.notes, s.created_at, s.cancelled_at,
            c.name AS customer_name,
            se.name AS seller_name
        FROM sales s
        LEFT JOIN customers c ON s.customer_id = c.id
        LEFT JOIN sellers se ON s.seller_id = se.id
        WHERE s.id = $1"
    )
    .bind(id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Sale not found"))?;

    let items = sqlx::query_as::<_, SaleItemRow>(
        "SELECT si.id, si.product_id, p.name AS product_name, p.sku,
                si.unit_price::FLOAT8 AS unit_price, si.cost_price::FLOAT8 AS cost_price
         FROM sale_items si
         JOIN products p ON si.product_id = p.id
         WHERE si.sale_id = $1
         ORDER BY si.id"
    )
    .bind(id)
    .fetch_all(db_pool)
    .await?;

    let total_cost: f64 = items.iter().map(|i| i.cost_price).sum();
    let sale = header.sale;

    Ok(SaleResponse {
        id: sale.id,
        customer_id: sale.customer_id,
        customer_name: header.customer_name,
        seller_id: sale.seller_id,
        seller_name: header.seller_name,
        sale_date: sale.sale_date,
        payment_method: sale.payment_method,
        subtotal: sale.subtotal,
        discount: sale.discount,
        total_amount: sale.total_amount,
        commission_amount: sale.commission_amount,
        commission_status: sale.commission_status,
        points_earned: sale.points_earned,
        status: sale.status,
        notes: sale.notes,
        created_at: sale.created_at,
        cancelled_at: sale.cancelled_at,
        summary: SaleSummary {
            total_items: items.len() as i64,
            gross_margin: round_money(sale.total_amount - total_cost),
            total_formatted: format_brl(sale.total_amount),
        },
        items: items
            .into_iter()
            .map(|item| SaleItemResponse {
                id: item.id,
                product_id: item.product_id,
                product_name: item.product_name,
                sku: item.sku,
                unit_price: item.unit_price,
                cost_price: item.cost_price,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{day, manager, sale_of, seed_customer, seed_product, seed_seller, seed_user, state};

    async fn product_status(pool: &PgPool, id: i64) -> String {
        sqlx::query_scalar("SELECT status FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn product_cannot_be_sold_twice(pool: PgPool) {
        let user_id = seed_user(&pool, "ana").await;
        let jacket = seed_product(&pool, "Jaqueta jeans", 120.0).await;
        let scarf = seed_product(&pool, "Lenço de seda", 35.0).await;

        let (status, Json(sale)) = create_sale(
            State(state(pool.clone())),
            Extension(manager(user_id)),
            Json(sale_of(&[scarf, jacket], None, None, day(2024, 5, 10))),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale.total_amount, 155.0);
        assert_eq!(product_status(&pool, jacket).await, "sold");

        let again = create_sale(
            State(state(pool.clone())),
            Extension(manager(user_id)),
            Json(sale_of(&[jacket], None, None, day(2024, 5, 11))),
        )
        .await;
        assert!(matches!(again, Err(AppError::ValidationError(_))));

        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales").fetch_one(&pool).await.unwrap();
        assert_eq!(sales, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    async fn cancel_reverts_stock_revenue_cash_and_points(pool: PgPool) {
        let user_id = seed_user(&pool, "ana").await;
        let customer_id = seed_customer(&pool, "Bia").await;
        let seller_id = seed_seller(&pool, "Caio", 10.0).await;
        let dress = seed_product(&pool, "Vestido midi", 150.0).await;

        let (_, Json(sale)) = create_sale(
            State(state(pool.clone())),
            Extension(manager(user_id)),
            Json(sale_of(&[dress], Some(customer_id), Some(seller_id), day(2024, 5, 10))),
        )
        .await
        .unwrap();
        assert_eq!(sale.commission_amount, 15.0);
        assert_eq!(sale.commission_status, "pending");
        assert_eq!(sale.points_earned, 150);

        let Json(cancelled) = cancel_sale(
            State(state(pool.clone())),
            Extension(manager(user_id)),
            Path(sale.id),
        )
        .await
        .unwrap();
        assert_eq!(cancelled.status, "cancelled");
        assert_eq!(cancelled.commission_status, "void");
        assert_eq!(product_status(&pool, dress).await, "available");

        let revenues: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revenues WHERE sale_id = $1")
            .bind(sale.id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(revenues, 0);

        let net_cash: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(CASE WHEN kind = 'inflow' THEN amount ELSE -amount END), 0)::FLOAT8
             FROM cash_flow_entries WHERE sale_id = $1",
        )
        .bind(sale.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(net_cash, 0.0);

        let points: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(delta), 0)::BIGINT FROM points_ledger WHERE customer_id = $1",
        )
        .bind(customer_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(points, 0);

        let again = cancel_sale(State(state(pool.clone())), Extension(manager(user_id)), Path(sale.id)).await;
        assert!(matches!(again, Err(AppError::ValidationError(_))));
    }
}
