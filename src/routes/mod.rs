pub mod auth;
pub mod dashboard;
pub mod menu_items;
pub mod orders;
pub mod restaurants;
pub mod uploads;
pub mod users;
pub mod validate;

use std::future::Future;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Await a mail delivery and log, rather than return, any failure.
pub async fn best_effort<F>(kind: &str, delivery: F)
where
    F: Future<Output = Result<(), String>>,
{
    if let Err(e) = delivery.await {
        tracing::error!("Failed to send {kind} email: {e}");
    }
}

pub fn api_routes(max_upload_size: usize) -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email", get(auth::verify_email))
        .route("/auth/resend-verification", post(auth::resend_verification))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password", post(auth::reset_password))
        // Restaurants
        .route("/restaurants", get(restaurants::list))
        .route("/restaurants/slug/{slug}", get(restaurants::get_by_slug))
        .route("/restaurants/restaurant/user", get(restaurants::mine))
        .route("/restaurants/restaurant/admin", patch(restaurants::update_mine))
        .route(
            "/restaurants/restaurant/toggle-active",
            patch(restaurants::toggle_mine),
        )
        .route("/restaurants/admin/create", post(restaurants::admin_create))
        .route(
            "/restaurants/admin/{id}",
            patch(restaurants::admin_update).delete(restaurants::admin_delete),
        )
        .route(
            "/restaurants/admin/{id}/toggle-active",
            patch(restaurants::admin_toggle),
        )
        .route("/restaurants/{id}", get(restaurants::get))
        // Menu items
        .route(
            "/menu-items/public/restaurant/{restaurant_id}",
            get(menu_items::list_public),
        )
        .route(
            "/menu-items/public/restaurant/{restaurant_id}/category/{category}",
            get(menu_items::list_public_by_category),
        )
        .route(
            "/menu-items/public/restaurant/{restaurant_id}/categories",
            get(menu_items::categories),
        )
        .route("/menu-items", get(menu_items::list).post(menu_items::create))
        .route("/menu-items/stats", get(menu_items::stats))
        .route(
            "/menu-items/{id}",
            get(menu_items::get)
                .patch(menu_items::update)
                .delete(menu_items::delete),
        )
        // Orders
        .route("/orders", post(orders::create))
        .route("/orders/track/{order_number}", get(orders::track))
        .route("/orders/restaurant", get(orders::list_for_restaurant))
        .route("/orders/{id}/status", patch(orders::update_status))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/recent-orders", get(dashboard::recent_orders))
        .route("/dashboard/top-items", get(dashboard::top_items))
        // Users
        .route(
            "/users/profile",
            get(users::profile).patch(users::update_profile),
        )
        .route(
            "/users/staff",
            get(users::list_staff).post(users::create_staff),
        )
        .route(
            "/users/staff/{id}",
            get(users::get_staff)
                .patch(users::update_staff)
                .delete(users::delete_staff),
        )
        .route("/users/staff/{id}/toggle-active", patch(users::toggle_staff))
        .route("/users/kitchen-staff", get(users::kitchen_staff))
        .route("/users/attendants", get(users::attendants))
        // Uploads
        .route(
            "/uploads/image",
            post(uploads::image).layer(DefaultBodyLimit::max(max_upload_size)),
        )
}
