//! Read-only rollups for the restaurant dashboard. Recomputed per request.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderCounts {
    pub total: i64,
    pub pending: i64,
    pub preparing: i64,
    pub completed: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Revenue {
    pub total: f64,
    pub today: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StaffCounts {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TopItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub total_ordered: i64,
    pub revenue: f64,
}

// Same set as OrderStatus::COMPLETED.
const COMPLETED: &str = "('ready', 'delivered')";

pub async fn order_counts(pool: &PgPool, restaurant_id: Uuid) -> Result<OrderCounts, sqlx::Error> {
    sqlx::query_as::<_, OrderCounts>(&format!(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'preparing') AS preparing,
                COUNT(*) FILTER (WHERE status IN {COMPLETED}) AS completed
         FROM orders WHERE restaurant_id = $1"
    ))
    .bind(restaurant_id)
    .fetch_one(pool)
    .await
}

/// Revenue over completed orders, all-time and since `day_start`.
pub async fn revenue(
    pool: &PgPool,
    restaurant_id: Uuid,
    day_start: DateTime<Utc>,
) -> Result<Revenue, sqlx::Error> {
    sqlx::query_as::<_, Revenue>(&format!(
        "SELECT COALESCE(SUM(total), 0)::DOUBLE PRECISION AS total,
                COALESCE(SUM(total) FILTER (WHERE created_at >= $2), 0)::DOUBLE PRECISION AS today
         FROM orders WHERE restaurant_id = $1 AND status IN {COMPLETED}"
    ))
    .bind(restaurant_id)
    .bind(day_start)
    .fetch_one(pool)
    .await
}

pub async fn staff_counts(pool: &PgPool, restaurant_id: Uuid) -> Result<StaffCounts, sqlx::Error> {
    sqlx::query_as::<_, StaffCounts>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_active) AS active
         FROM users
         WHERE restaurant_id = $1 AND role IN ('kitchen_staff', 'attendant')",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await
}

/// Best sellers among completed orders, by quantity. The name shown is the
/// one captured on the most recent order.
pub async fn top_items(
    pool: &PgPool,
    restaurant_id: Uuid,
    limit: i64,
) -> Result<Vec<TopItem>, sqlx::Error> {
    sqlx::query_as::<_, TopItem>(&format!(
        "SELECT oi.menu_item_id,
                (ARRAY_AGG(oi.name ORDER BY o.created_at DESC))[1] AS name,
                SUM(oi.quantity)::BIGINT AS total_ordered,
                SUM(oi.price * oi.quantity)::DOUBLE PRECISION AS revenue
         FROM order_items oi
         JOIN orders o ON o.id = oi.order_id
         WHERE o.restaurant_id = $1 AND o.status IN {COMPLETED}
         GROUP BY oi.menu_item_id
         ORDER BY total_ordered DESC, revenue DESC
         LIMIT $2"
    ))
    .bind(restaurant_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
