use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{MenuItem, NutritionalInfo};

pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
    pub preparation_time: i32,
    pub available: bool,
    pub tags: Vec<String>,
    pub nutritional_info: Option<NutritionalInfo>,
}

pub async fn create(
    pool: &PgPool,
    restaurant_id: Uuid,
    new: &NewMenuItem,
) -> Result<MenuItem, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>(
        "INSERT INTO menu_items (id, restaurant_id, name, description, price, category, image,
                                 preparation_time, available, tags, nutritional_info)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(restaurant_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price)
    .bind(&new.category)
    .bind(new.image.as_deref())
    .bind(new.preparation_time)
    .bind(new.available)
    .bind(&new.tags)
    .bind(new.nutritional_info.as_ref().map(Json))
    .fetch_one(pool)
    .await
}

pub async fn list_by_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_items WHERE restaurant_id = $1 ORDER BY category, name",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await
}

pub async fn list_available(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_items WHERE restaurant_id = $1 AND available = true
         ORDER BY category, name",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await
}

pub async fn list_available_by_category(
    pool: &PgPool,
    restaurant_id: Uuid,
    category: &str,
) -> Result<Vec<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_items
         WHERE restaurant_id = $1 AND category = $2 AND available = true
         ORDER BY name",
    )
    .bind(restaurant_id)
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Persist the editable fields of `item`, scoped to its owning restaurant.
pub async fn update(pool: &PgPool, item: &MenuItem) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>(
        "UPDATE menu_items SET
            name = $3, description = $4, price = $5, category = $6, image = $7,
            preparation_time = $8, available = $9, tags = $10, nutritional_info = $11,
            updated_at = now()
         WHERE id = $1 AND restaurant_id = $2 RETURNING *",
    )
    .bind(item.id)
    .bind(item.restaurant_id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price)
    .bind(&item.category)
    .bind(item.image.as_deref())
    .bind(item.preparation_time)
    .bind(item.available)
    .bind(&item.tags)
    .bind(&item.nutritional_info)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, restaurant_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM menu_items WHERE id = $1 AND restaurant_id = $2")
        .bind(id)
        .bind(restaurant_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn categories(pool: &PgPool, restaurant_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM menu_items WHERE restaurant_id = $1 ORDER BY category",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub struct AvailabilityCounts {
    pub total: i64,
    pub available: i64,
}

pub async fn availability_counts(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<AvailabilityCounts, sqlx::Error> {
    sqlx::query_as::<_, AvailabilityCounts>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE available) AS available
         FROM menu_items WHERE restaurant_id = $1",
    )
    .bind(restaurant_id)
    .fetch_one(pool)
    .await
}
