use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::gate::{AdminOrKitchen, Authorized, RestaurantStaff};
use crate::db;
use crate::error::AppError;
use crate::models::{Order, OrderStatus};
use crate::ordering::{self, OrderDraft};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    #[serde(flatten)]
    pub draft: OrderDraft,
}

#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<OrderStatus>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Serialize)]
pub struct OrderRestaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Serialize)]
pub struct TrackedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub restaurant: Option<OrderRestaurant>,
}

fn not_found() -> AppError {
    AppError::NotFound("Order not found".to_string())
}

/// Guest checkout. No credential required.
pub async fn create(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateOrderRequest>, AppError>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let restaurant_id: Uuid = req
        .restaurant_id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid restaurant ID".to_string()))?;

    let restaurant = db::restaurants::find_by_id(&state.pool, restaurant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurant not found".to_string()))?;

    let order = ordering::place(&state.pool, &restaurant, &req.draft).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Deserialize)]
pub struct TrackQuery {
    /// Restaurant id or slug. Needed when two restaurants issued the same number.
    pub restaurant: Option<String>,
}

/// Public tracking. The order number is the capability, so no tenant check.
/// A number that several restaurants issued is not resolved without a
/// restaurant hint.
pub async fn track(
    State(state): State<SharedState>,
    Path(order_number): Path<String>,
    WithRejection(Query(query), _): WithRejection<Query<TrackQuery>, AppError>,
) -> Result<Json<TrackedOrder>, AppError> {
    let restaurant_id = match query.restaurant.as_deref().map(str::trim) {
        Some(hint) if !hint.is_empty() => {
            let restaurant = match Uuid::parse_str(hint) {
                Ok(id) => db::restaurants::find_by_id(&state.pool, id).await?,
                Err(_) => db::restaurants::find_by_slug(&state.pool, hint).await?,
            };
            Some(restaurant.ok_or_else(not_found)?.id)
        }
        _ => None,
    };

    let mut matches =
        db::orders::find_by_order_number(&state.pool, order_number.trim(), restaurant_id).await?;
    if matches.len() > 1 {
        tracing::warn!(
            order_number = %order_number,
            "Order number shared by several restaurants, tracking needs a restaurant"
        );
        return Err(not_found());
    }
    let order = matches.pop().ok_or_else(not_found)?;

    let restaurant = db::restaurants::find_by_id(&state.pool, order.restaurant_id)
        .await?
        .map(|r| OrderRestaurant {
            id: r.id,
            name: r.name,
            slug: r.slug,
        });

    Ok(Json(TrackedOrder { order, restaurant }))
}

pub async fn list_for_restaurant(
    Authorized(auth, _): Authorized<RestaurantStaff>,
    State(state): State<SharedState>,
    WithRejection(Query(filter), _): WithRejection<Query<StatusFilter>, AppError>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders =
        db::orders::list_by_restaurant(&state.pool, auth.restaurant_id()?, filter.status).await?;
    Ok(Json(orders))
}

/// Any status may follow any other. Orders of other restaurants are reported
/// as missing.
pub async fn update_status(
    Authorized(auth, _): Authorized<AdminOrKitchen>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateStatusRequest>, AppError>,
) -> Result<Json<Order>, AppError> {
    let restaurant_id = auth.restaurant_id()?;
    let order = db::orders::update_status(&state.pool, id, restaurant_id, req.status)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        status = ?order.status,
        user_id = %auth.user_id,
        "Order status updated"
    );
    Ok(Json(order))
}
