use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{LocationType, Order, OrderItem, OrderStatus, PaymentMethod};

pub struct NewOrder<'a> {
    pub restaurant_id: Uuid,
    pub order_number: &'a str,
    pub customer_name: &'a str,
    pub location_type: LocationType,
    pub room_number: Option<&'a str>,
    pub table_number: Option<&'a str>,
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub special_instructions: Option<&'a str>,
    pub estimated_delivery_time: DateTime<Utc>,
    pub items: Vec<NewOrderItem<'a>>,
}

pub struct NewOrderItem<'a> {
    pub menu_item_id: Uuid,
    pub name: &'a str,
    pub price: f64,
    pub quantity: i32,
    pub special_instructions: Option<&'a str>,
}

/// Orders for a restaurant with `created_at` in `[start, end)`.
pub async fn count_created_between<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    restaurant_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM orders
         WHERE restaurant_id = $1 AND created_at >= $2 AND created_at < $3",
    )
    .bind(restaurant_id)
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await?;
    Ok(row.0)
}

/// Insert the order and its line items. Run inside a transaction.
pub async fn create(conn: &mut PgConnection, new: &NewOrder<'_>) -> Result<Order, sqlx::Error> {
    let mut order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, restaurant_id, order_number, customer_name, location_type,
                             room_number, table_number, subtotal, tax, delivery_fee, total,
                             payment_method, special_instructions, estimated_delivery_time)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.restaurant_id)
    .bind(new.order_number)
    .bind(new.customer_name)
    .bind(new.location_type)
    .bind(new.room_number)
    .bind(new.table_number)
    .bind(new.subtotal)
    .bind(new.tax)
    .bind(new.delivery_fee)
    .bind(new.total)
    .bind(new.payment_method)
    .bind(new.special_instructions)
    .bind(new.estimated_delivery_time)
    .fetch_one(&mut *conn)
    .await?;

    for (position, item) in new.items.iter().enumerate() {
        let row = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, position, menu_item_id, name, price,
                                      quantity, special_instructions)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(position as i32)
        .bind(item.menu_item_id)
        .bind(item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(item.special_instructions)
        .fetch_one(&mut *conn)
        .await?;
        order.items.push(row);
    }

    Ok(order)
}

/// Load line items for `orders` in one query and attach them in position order.
async fn attach_items(pool: &PgPool, orders: &mut [Order]) -> Result<(), sqlx::Error> {
    if orders.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row);
    }
    for order in orders.iter_mut() {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(())
}

async fn with_items(pool: &PgPool, order: Option<Order>) -> Result<Option<Order>, sqlx::Error> {
    match order {
        Some(order) => {
            let mut one = [order];
            attach_items(pool, &mut one).await?;
            let [order] = one;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

/// Orders carrying this number, at most two. Numbers are only unique per
/// restaurant, so without `restaurant_id` several restaurants may match.
pub async fn find_by_order_number(
    pool: &PgPool,
    order_number: &str,
    restaurant_id: Option<Uuid>,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders
         WHERE order_number = $1 AND ($2::uuid IS NULL OR restaurant_id = $2)
         ORDER BY created_at DESC
         LIMIT 2",
    )
    .bind(order_number)
    .bind(restaurant_id)
    .fetch_all(pool)
    .await?;
    attach_items(pool, &mut orders).await?;
    Ok(orders)
}

pub async fn list_by_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders
         WHERE restaurant_id = $1 AND ($2::text IS NULL OR status = $2::text)
         ORDER BY created_at DESC",
    )
    .bind(restaurant_id)
    .bind(status)
    .fetch_all(pool)
    .await?;
    attach_items(pool, &mut orders).await?;
    Ok(orders)
}

/// Update the status of an order owned by `restaurant_id`. Orders belonging to
/// other restaurants match nothing and yield `None`.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    restaurant_id: Uuid,
    status: OrderStatus,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $3, updated_at = now()
         WHERE id = $1 AND restaurant_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(restaurant_id)
    .bind(status)
    .fetch_optional(pool)
    .await?;
    with_items(pool, order).await
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RecentOrder {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: Order,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
}

pub async fn recent(
    pool: &PgPool,
    restaurant_id: Uuid,
    limit: i64,
) -> Result<Vec<RecentOrder>, sqlx::Error> {
    let mut rows = sqlx::query_as::<_, RecentOrder>(
        "SELECT o.*, u.name AS assignee_name, u.email AS assignee_email
         FROM orders o
         LEFT JOIN users u ON u.id = o.assigned_to
         WHERE o.restaurant_id = $1
         ORDER BY o.created_at DESC
         LIMIT $2",
    )
    .bind(restaurant_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut orders: Vec<Order> = rows.iter().map(|r| r.order.clone()).collect();
    attach_items(pool, &mut orders).await?;
    for (row, order) in rows.iter_mut().zip(orders) {
        row.order = order;
    }
    Ok(rows)
}
