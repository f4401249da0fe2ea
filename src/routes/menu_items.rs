use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as DbJson;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::gate::{AdminOnly, AdminOrKitchen, Authorized};
use crate::db;
use crate::db::menu_items::NewMenuItem;
use crate::error::AppError;
use crate::models::{MenuItem, NutritionalInfo};
use crate::routes::validate;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateMenuItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
    pub preparation_time: i32,
    pub available: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub nutritional_info: Option<NutritionalInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMenuItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub preparation_time: Option<i32>,
    pub available: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub nutritional_info: Option<NutritionalInfo>,
}

#[derive(Debug, Serialize)]
pub struct MenuStats {
    pub total: i64,
    pub available: i64,
    pub unavailable: i64,
    pub category_count: usize,
    pub categories: Vec<String>,
}

fn check_price(price: f64) -> Result<f64, AppError> {
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(AppError::BadRequest("Price must be zero or more".to_string()))
    }
}

fn check_preparation_time(minutes: i32) -> Result<i32, AppError> {
    if minutes >= 1 {
        Ok(minutes)
    } else {
        Err(AppError::BadRequest(
            "Preparation time must be at least 1 minute".to_string(),
        ))
    }
}

impl UpdateMenuItem {
    fn apply(self, item: &mut MenuItem) -> Result<(), AppError> {
        if let Some(name) = self.name {
            item.name = validate::required("Name", &name)?.to_string();
        }
        if let Some(category) = self.category {
            item.category = validate::required("Category", &category)?.to_string();
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(price) = self.price {
            item.price = check_price(price)?;
        }
        if let Some(minutes) = self.preparation_time {
            item.preparation_time = check_preparation_time(minutes)?;
        }
        if self.image.is_some() {
            item.image = self.image;
        }
        if let Some(available) = self.available {
            item.available = available;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(info) = self.nutritional_info {
            item.nutritional_info = Some(DbJson(info));
        }
        Ok(())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Menu item not found".to_string())
}

pub async fn list_public(
    State(state): State<SharedState>,
    WithRejection(Path(restaurant_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = db::menu_items::list_available(&state.pool, restaurant_id).await?;
    Ok(Json(items))
}

pub async fn list_public_by_category(
    State(state): State<SharedState>,
    WithRejection(Path((restaurant_id, category)), _): WithRejection<
        Path<(Uuid, String)>,
        AppError,
    >,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items =
        db::menu_items::list_available_by_category(&state.pool, restaurant_id, &category).await?;
    Ok(Json(items))
}

pub async fn categories(
    State(state): State<SharedState>,
    WithRejection(Path(restaurant_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Vec<String>>, AppError> {
    let categories = db::menu_items::categories(&state.pool, restaurant_id).await?;
    Ok(Json(categories))
}

pub async fn create(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateMenuItem>, AppError>,
) -> Result<(StatusCode, Json<MenuItem>), AppError> {
    let restaurant_id = auth.restaurant_id()?;
    let new = NewMenuItem {
        name: validate::required("Name", &req.name)?.to_string(),
        description: req.description,
        price: check_price(req.price)?,
        category: validate::required("Category", &req.category)?.to_string(),
        image: req.image,
        preparation_time: check_preparation_time(req.preparation_time)?,
        available: req.available.unwrap_or(true),
        tags: req.tags,
        nutritional_info: req.nutritional_info,
    };

    let item = db::menu_items::create(&state.pool, restaurant_id, &new).await?;
    tracing::info!(menu_item_id = %item.id, restaurant_id = %restaurant_id, "Menu item created");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list(
    Authorized(auth, _): Authorized<AdminOrKitchen>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<MenuItem>>, AppError> {
    let items = db::menu_items::list_by_restaurant(&state.pool, auth.restaurant_id()?).await?;
    Ok(Json(items))
}

pub async fn stats(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
) -> Result<Json<MenuStats>, AppError> {
    let restaurant_id = auth.restaurant_id()?;
    let counts = db::menu_items::availability_counts(&state.pool, restaurant_id).await?;
    let categories = db::menu_items::categories(&state.pool, restaurant_id).await?;

    Ok(Json(MenuStats {
        total: counts.total,
        available: counts.available,
        unavailable: counts.total - counts.available,
        category_count: categories.len(),
        categories,
    }))
}

/// Load an item and confirm it belongs to the caller's restaurant.
async fn load_owned(
    state: &SharedState,
    auth: &AuthUser,
    id: Uuid,
    action: &str,
) -> Result<MenuItem, AppError> {
    let item = db::menu_items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    auth.ensure_same_tenant(
        item.restaurant_id,
        &format!("You do not have permission to {action} this item"),
    )?;
    Ok(item)
}

pub async fn get(
    Authorized(auth, _): Authorized<AdminOrKitchen>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<MenuItem>, AppError> {
    let item = load_owned(&state, &auth, id, "view").await?;
    Ok(Json(item))
}

pub async fn update(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateMenuItem>, AppError>,
) -> Result<Json<MenuItem>, AppError> {
    let mut item = load_owned(&state, &auth, id, "update").await?;
    req.apply(&mut item)?;

    let item = db::menu_items::update(&state.pool, &item)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(menu_item_id = %item.id, "Menu item updated");
    Ok(Json(item))
}

pub async fn delete(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<StatusCode, AppError> {
    let item = load_owned(&state, &auth, id, "delete").await?;

    if db::menu_items::delete(&state.pool, item.id, item.restaurant_id).await? == 0 {
        return Err(not_found());
    }
    tracing::info!(menu_item_id = %item.id, "Menu item deleted");
    Ok(StatusCode::NO_CONTENT)
}
