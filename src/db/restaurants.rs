use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{Restaurant, RestaurantSettings};

pub struct NewRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub settings: RestaurantSettings,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    slug: &str,
    new: &NewRestaurant,
) -> Result<Restaurant, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "INSERT INTO restaurants (id, name, slug, description, address, phone, email, settings)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&new.name)
    .bind(slug)
    .bind(new.description.as_deref())
    .bind(new.address.as_deref())
    .bind(new.phone.as_deref())
    .bind(new.email.as_deref())
    .bind(Json(&new.settings))
    .fetch_one(executor)
    .await
}

pub async fn slug_exists<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    slug: &str,
) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM restaurants WHERE slug = $1)")
        .bind(slug)
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn list_active(pool: &PgPool) -> Result<Vec<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "SELECT * FROM restaurants WHERE is_active = true ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn set_owner<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "UPDATE restaurants SET owner_id = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await
}

/// Persist the mutable fields of `restaurant`. The slug and owner never change here.
pub async fn update(
    pool: &PgPool,
    restaurant: &Restaurant,
) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "UPDATE restaurants SET
            name = $2, description = $3, logo = $4, address = $5,
            phone = $6, email = $7, settings = $8, is_active = $9, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(restaurant.id)
    .bind(&restaurant.name)
    .bind(restaurant.description.as_deref())
    .bind(restaurant.logo.as_deref())
    .bind(restaurant.address.as_deref())
    .bind(restaurant.phone.as_deref())
    .bind(restaurant.email.as_deref())
    .bind(&restaurant.settings)
    .bind(restaurant.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn toggle_active(pool: &PgPool, id: Uuid) -> Result<Option<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "UPDATE restaurants SET is_active = NOT is_active, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}
