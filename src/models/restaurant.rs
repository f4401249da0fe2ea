use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestaurantSettings {
    pub currency: String,
    pub timezone: String,
    pub allow_table_orders: bool,
    pub allow_room_orders: bool,
}

impl Default for RestaurantSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            timezone: "UTC".to_string(),
            allow_table_orders: true,
            allow_room_orders: true,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub owner_id: Option<Uuid>,
    pub is_active: bool,
    pub settings: Json<RestaurantSettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
