pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod ordering;
pub mod routes;
pub mod state;
pub mod tenancy;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::email::{LogMailer, Mailer, SmtpMailer};
use crate::state::{AppState, SharedState};
use crate::uploads::{ImageStore, LocalImageStore};

/// Build the application with collaborators derived from `config`.
pub fn build_app(pool: PgPool, config: Config) -> Router {
    let smtp = config
        .smtp
        .as_ref()
        .map(|smtp| SmtpMailer::new(smtp, &config.client_url));
    let mailer: Arc<dyn Mailer> = match smtp {
        Some(Ok(mailer)) => {
            tracing::info!("SMTP configured");
            Arc::new(mailer)
        }
        Some(Err(e)) => {
            tracing::warn!("SMTP not available: {e}");
            Arc::new(LogMailer::new(&config.client_url, !config.is_production()))
        }
        None => Arc::new(LogMailer::new(&config.client_url, !config.is_production())),
    };

    let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
        config.upload_dir.clone(),
        &config.public_url,
    ));

    build_app_with(pool, config, mailer, images)
}

/// Build the application around explicit mail and image collaborators.
pub fn build_app_with(
    pool: PgPool,
    config: Config,
    mailer: Arc<dyn Mailer>,
    images: Arc<dyn ImageStore>,
) -> Router {
    let cors = cors_layer(&config.client_url);
    let upload_dir = config.upload_dir.clone();
    let max_upload_size = config.max_upload_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        mailer,
        images,
    });

    Router::new()
        .merge(routes::api_routes(max_upload_size))
        .nest_service("/uploads/files", ServeDir::new(upload_dir))
        .route("/health", axum::routing::get(health))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(client_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Invalid APP_CLIENT_URL for CORS, cross-origin requests disabled: {e}");
            layer
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
