use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::gate::{AdminOnly, Authorized, SuperAdminOnly};
use crate::db;
use crate::db::restaurants::NewRestaurant;
use crate::error::AppError;
use crate::models::{Restaurant, RestaurantSettings};
use crate::routes::validate;
use crate::state::SharedState;
use crate::tenancy;

#[derive(Deserialize)]
pub struct CreateRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub settings: Option<RestaurantSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsPatch {
    pub currency: Option<String>,
    pub timezone: Option<String>,
    pub allow_table_orders: Option<bool>,
    pub allow_room_orders: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRestaurant {
    pub name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub settings: Option<SettingsPatch>,
    pub is_active: Option<bool>,
}

impl UpdateRestaurant {
    /// Overlay the provided fields onto `restaurant`. Settings merge key by key.
    fn apply(self, restaurant: &mut Restaurant) -> Result<(), AppError> {
        if let Some(name) = self.name {
            restaurant.name = validate::required("Name", &name)?.to_string();
        }
        if let Some(email) = self.email {
            restaurant.email = Some(validate::email(&email)?);
        }
        if self.description.is_some() {
            restaurant.description = self.description;
        }
        if self.logo.is_some() {
            restaurant.logo = self.logo;
        }
        if self.address.is_some() {
            restaurant.address = self.address;
        }
        if self.phone.is_some() {
            restaurant.phone = self.phone;
        }
        if let Some(patch) = self.settings {
            let settings = &mut restaurant.settings.0;
            if let Some(currency) = patch.currency {
                settings.currency = currency;
            }
            if let Some(timezone) = patch.timezone {
                settings.timezone = timezone;
            }
            if let Some(allow) = patch.allow_table_orders {
                settings.allow_table_orders = allow;
            }
            if let Some(allow) = patch.allow_room_orders {
                settings.allow_room_orders = allow;
            }
        }
        if let Some(is_active) = self.is_active {
            restaurant.is_active = is_active;
        }
        Ok(())
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Restaurant not found".to_string())
}

/// Public listing; inactive restaurants are hidden.
pub async fn list(State(state): State<SharedState>) -> Result<Json<Vec<Restaurant>>, AppError> {
    let restaurants = db::restaurants::list_active(&state.pool).await?;
    Ok(Json(restaurants))
}

pub async fn get_by_slug(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = db::restaurants::find_by_slug(&state.pool, &slug)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(restaurant))
}

pub async fn get(
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = db::restaurants::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(restaurant))
}

pub async fn mine(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = db::restaurants::find_by_id(&state.pool, auth.restaurant_id()?)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(restaurant))
}

pub async fn update_mine(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateRestaurant>, AppError>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = apply_update(&state, auth.restaurant_id()?, req).await?;
    tracing::info!(restaurant_id = %restaurant.id, user_id = %auth.user_id, "Restaurant updated");
    Ok(Json(restaurant))
}

pub async fn toggle_mine(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = db::restaurants::toggle_active(&state.pool, auth.restaurant_id()?)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(
        restaurant_id = %restaurant.id,
        is_active = restaurant.is_active,
        "Restaurant toggled"
    );
    Ok(Json(restaurant))
}

pub async fn admin_create(
    Authorized(auth, _): Authorized<SuperAdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateRestaurant>, AppError>,
) -> Result<(StatusCode, Json<Restaurant>), AppError> {
    let name = validate::required("Name", &req.name)?.to_string();
    let email = req.email.as_deref().map(validate::email).transpose()?;

    let mut conn = state.pool.acquire().await?;
    let restaurant = tenancy::create_restaurant(
        &mut *conn,
        &NewRestaurant {
            name,
            description: req.description,
            address: req.address,
            phone: req.phone,
            email,
            settings: req.settings.unwrap_or_default(),
        },
    )
    .await?;

    tracing::info!(
        restaurant_id = %restaurant.id,
        user_id = %auth.user_id,
        "Restaurant created by super admin"
    );
    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn admin_update(
    Authorized(_auth, _): Authorized<SuperAdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateRestaurant>, AppError>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = apply_update(&state, id, req).await?;
    Ok(Json(restaurant))
}

pub async fn admin_toggle(
    Authorized(_auth, _): Authorized<SuperAdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Restaurant>, AppError> {
    let restaurant = db::restaurants::toggle_active(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(restaurant))
}

/// Restaurants are never deleted: orders and menu items keep referring to them.
pub async fn admin_delete(auth: AuthUser) -> Result<StatusCode, AppError> {
    tracing::warn!(user_id = %auth.user_id, role = %auth.role, "Refused restaurant deletion");
    Err(AppError::Forbidden(
        "Restaurant deletion requires manual intervention. Please contact system administrator."
            .to_string(),
    ))
}

async fn apply_update(
    state: &SharedState,
    id: Uuid,
    req: UpdateRestaurant,
) -> Result<Restaurant, AppError> {
    let mut restaurant = db::restaurants::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    req.apply(&mut restaurant)?;
    db::restaurants::update(&state.pool, &restaurant)
        .await?
        .ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json as DbJson;

    fn restaurant() -> Restaurant {
        Restaurant {
            id: Uuid::now_v7(),
            name: "Blue Lagoon".to_string(),
            slug: "blue-lagoon-abc".to_string(),
            description: None,
            logo: None,
            address: Some("1 Beach Rd".to_string()),
            phone: None,
            email: None,
            owner_id: None,
            is_active: true,
            settings: DbJson(RestaurantSettings::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn settings_patch_merges() {
        let mut r = restaurant();
        UpdateRestaurant {
            settings: Some(SettingsPatch {
                allow_room_orders: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        }
        .apply(&mut r)
        .unwrap();

        assert!(!r.settings.allow_room_orders);
        assert!(r.settings.allow_table_orders);
        assert_eq!(r.settings.currency, "USD");
    }

    #[test]
    fn absent_fields_are_kept_and_slug_is_untouched() {
        let mut r = restaurant();
        let slug = r.slug.clone();
        UpdateRestaurant {
            name: Some("Blue Lagoon Resort".to_string()),
            ..Default::default()
        }
        .apply(&mut r)
        .unwrap();

        assert_eq!(r.name, "Blue Lagoon Resort");
        assert_eq!(r.address.as_deref(), Some("1 Beach Rd"));
        assert_eq!(r.slug, slug);
    }

    #[test]
    fn rejects_blank_name() {
        let mut r = restaurant();
        let result = UpdateRestaurant {
            name: Some(" ".to_string()),
            ..Default::default()
        }
        .apply(&mut r);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
