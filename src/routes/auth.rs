use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::{Claims, encode_token};
use crate::auth::{password, tokens};
use crate::db;
use crate::db::restaurants::NewRestaurant;
use crate::db::users::NewUser;
use crate::error::AppError;
use crate::models::{Restaurant, RestaurantSettings, Role};
use crate::routes::{MessageResponse, best_effort, validate};
use crate::state::SharedState;
use crate::tenancy;

const VERIFICATION_TTL_HOURS: i64 = 24;
const RESET_TTL_HOURS: i64 = 1;

const RESEND_MESSAGE: &str =
    "If an account exists with this email, a verification link has been sent.";
const FORGOT_MESSAGE: &str =
    "If an account exists with this email, a password reset link has been sent.";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub restaurant_name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct RegisteredUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

#[derive(Serialize)]
pub struct RestaurantSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<Restaurant> for RestaurantSummary {
    fn from(r: Restaurant) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
        }
    }
}

#[derive(Serialize)]
pub struct LoginUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub restaurant: Option<RestaurantSummary>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user: LoginUser,
}

pub async fn register(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let name = validate::required("Name", &req.name)?;
    let restaurant_name = validate::required("Restaurant name", &req.restaurant_name)?;
    let email = validate::email(&req.email)?;
    validate::password(&req.password)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let token = tokens::generate();
    let expires_at = Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS);

    let mut tx = state.pool.begin().await?;

    if db::users::find_by_email(&mut *tx, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let restaurant = tenancy::create_restaurant(
        &mut *tx,
        &NewRestaurant {
            name: restaurant_name.to_string(),
            description: None,
            address: None,
            phone: None,
            email: Some(email.clone()),
            settings: RestaurantSettings::default(),
        },
    )
    .await?;

    let token_hash = tokens::digest(&token);
    let user = db::users::create(
        &mut *tx,
        &NewUser {
            restaurant_id: Some(restaurant.id),
            name,
            email: &email,
            password_hash: &pw_hash,
            role: Role::RestaurantAdmin,
            is_email_verified: false,
            verification: Some((token_hash.as_str(), expires_at)),
            phone: None,
        },
    )
    .await
    .map_err(AppError::conflict_on_unique("User with this email already exists"))?;

    db::restaurants::set_owner(&mut *tx, restaurant.id, user.id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id = %user.id,
        restaurant_id = %restaurant.id,
        "Restaurant admin registered"
    );

    best_effort(
        "verification",
        state.mailer.send_verification(&user.email, &user.name, &token),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please check your email to verify your account."
                .to_string(),
            user: RegisteredUser {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

pub async fn verify_email(
    State(state): State<SharedState>,
    WithRejection(Query(query), _): WithRejection<Query<VerifyEmailQuery>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid or expired verification token".to_string());

    let token_hash = tokens::digest(query.token.trim());
    let user = db::users::find_by_verification_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(invalid)?;

    match user.email_verification_expires_at {
        Some(expires_at) if expires_at > Utc::now() => {}
        _ => {
            return Err(AppError::Unauthorized(
                "Verification token has expired. Please request a new one.".to_string(),
            ));
        }
    }

    if !db::users::mark_email_verified(&state.pool, user.id, &token_hash).await? {
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "Email verified");

    let restaurant_name = match user.restaurant_id {
        Some(id) => db::restaurants::find_by_id(&state.pool, id)
            .await
            .ok()
            .flatten()
            .map(|r| r.name),
        None => None,
    }
    .unwrap_or_else(|| "your restaurant".to_string());

    best_effort(
        "welcome",
        state
            .mailer
            .send_welcome(&user.email, &user.name, &restaurant_name),
    )
    .await;

    Ok(Json(MessageResponse::new(
        "Email verified successfully. You can now log in.",
    )))
}

pub async fn resend_verification(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<EmailRequest>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = validate::email(&req.email)?;

    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        return Ok(Json(MessageResponse::new(RESEND_MESSAGE)));
    };

    if user.is_email_verified {
        return Err(AppError::BadRequest("Email is already verified".to_string()));
    }

    let token = tokens::generate();
    db::users::set_verification_token(
        &state.pool,
        user.id,
        &tokens::digest(&token),
        Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS),
    )
    .await?;

    best_effort(
        "verification",
        state.mailer.send_verification(&user.email, &user.name, &token),
    )
    .await;

    Ok(Json(MessageResponse::new(RESEND_MESSAGE)))
}

pub async fn login(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = req.email.trim().to_lowercase();
    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(invalid());
    }

    if !user.is_email_verified {
        return Err(AppError::Unauthorized(
            "Please verify your email before logging in. \
             Check your inbox for the verification link."
                .to_string(),
        ));
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("Account is deactivated".to_string()));
    }

    let claims = Claims::new(&user, state.config.jwt_expiration);
    let access_token =
        encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    let restaurant = match user.restaurant_id {
        Some(id) => match db::restaurants::find_by_id(&state.pool, id).await {
            Ok(Some(restaurant)) => Some(RestaurantSummary::from(restaurant)),
            Ok(None) => {
                tracing::warn!(
                    user_id = %user.id,
                    restaurant_id = %id,
                    "Restaurant missing for user"
                );
                None
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, "Failed to load restaurant for login: {e}");
                None
            }
        },
        None => None,
    };

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        user: LoginUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            restaurant,
        },
    }))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<EmailRequest>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    if let Some(user) = db::users::find_by_email(&state.pool, &email).await? {
        let token = tokens::generate();
        db::users::set_reset_token(
            &state.pool,
            user.id,
            &tokens::digest(&token),
            Utc::now() + Duration::hours(RESET_TTL_HOURS),
        )
        .await?;

        best_effort(
            "password reset",
            state
                .mailer
                .send_password_reset(&user.email, &user.name, &token),
        )
        .await;
    }

    Ok(Json(MessageResponse::new(FORGOT_MESSAGE)))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<ResetPasswordRequest>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid or expired reset token".to_string());
    validate::password(&req.new_password)?;

    let token_hash = tokens::digest(req.token.trim());
    let user = db::users::find_by_reset_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(invalid)?;

    match user.password_reset_expires_at {
        Some(expires_at) if expires_at > Utc::now() => {}
        _ => {
            return Err(AppError::Unauthorized(
                "Reset token has expired. Please request a new password reset.".to_string(),
            ));
        }
    }

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    if !db::users::reset_password(&state.pool, user.id, &token_hash, &pw_hash).await? {
        return Err(invalid());
    }

    tracing::info!(user_id = %user.id, "Password reset");

    Ok(Json(MessageResponse::new(
        "Password reset successful. You can now log in with your new password.",
    )))
}
