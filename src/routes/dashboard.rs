use axum::Json;
use axum::extract::{Query, State};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::gate::{AdminOnly, Authorized};
use crate::db;
use crate::db::dashboard::{OrderCounts, Revenue, StaffCounts, TopItem};
use crate::db::orders::RecentOrder;
use crate::error::AppError;
use crate::ordering::number;
use crate::state::SharedState;

const DEFAULT_RECENT_LIMIT: i64 = 10;
const DEFAULT_TOP_LIMIT: i64 = 5;
const MAX_LIMIT: i64 = 100;

#[derive(Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

impl LimitQuery {
    fn resolve(&self, default: i64) -> i64 {
        self.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
    }
}

#[derive(Serialize)]
pub struct MenuCounts {
    pub total: i64,
    pub available: i64,
    pub unavailable: i64,
}

#[derive(Serialize)]
pub struct StaffSummary {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

impl From<StaffCounts> for StaffSummary {
    fn from(c: StaffCounts) -> Self {
        Self {
            total: c.total,
            active: c.active,
            inactive: c.total - c.active,
        }
    }
}

#[derive(Serialize)]
pub struct DashboardStats {
    pub orders: OrderCounts,
    pub revenue: Revenue,
    pub menu_items: MenuCounts,
    pub staff: StaffSummary,
}

pub async fn stats(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
) -> Result<Json<DashboardStats>, AppError> {
    let restaurant_id = auth.restaurant_id()?;
    let (day_start, _) = number::day_bounds(Utc::now());

    let orders = db::dashboard::order_counts(&state.pool, restaurant_id).await?;
    let revenue = db::dashboard::revenue(&state.pool, restaurant_id, day_start).await?;
    let menu = db::menu_items::availability_counts(&state.pool, restaurant_id).await?;
    let staff = db::dashboard::staff_counts(&state.pool, restaurant_id).await?;

    Ok(Json(DashboardStats {
        orders,
        revenue,
        menu_items: MenuCounts {
            total: menu.total,
            available: menu.available,
            unavailable: menu.total - menu.available,
        },
        staff: staff.into(),
    }))
}

pub async fn recent_orders(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Query(query), _): WithRejection<Query<LimitQuery>, AppError>,
) -> Result<Json<Vec<RecentOrder>>, AppError> {
    let orders = db::orders::recent(
        &state.pool,
        auth.restaurant_id()?,
        query.resolve(DEFAULT_RECENT_LIMIT),
    )
    .await?;
    Ok(Json(orders))
}

pub async fn top_items(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Query(query), _): WithRejection<Query<LimitQuery>, AppError>,
) -> Result<Json<Vec<TopItem>>, AppError> {
    let items = db::dashboard::top_items(
        &state.pool,
        auth.restaurant_id()?,
        query.resolve(DEFAULT_TOP_LIMIT),
    )
    .await?;
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_default_and_clamp() {
        assert_eq!(LimitQuery { limit: None }.resolve(5), 5);
        assert_eq!(LimitQuery { limit: Some(0) }.resolve(5), 1);
        assert_eq!(LimitQuery { limit: Some(5000) }.resolve(5), MAX_LIMIT);
        assert_eq!(LimitQuery { limit: Some(3) }.resolve(10), 3);
    }
}
