use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// Identity resolved from a bearer credential.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub restaurant_id: Option<Uuid>,
}

impl AuthUser {
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role {} is not permitted to perform this action",
                self.role
            )))
        }
    }

    /// The caller's tenant. Every restaurant-scoped handler goes through this.
    pub fn restaurant_id(&self) -> Result<Uuid, AppError> {
        self.restaurant_id.ok_or_else(|| {
            AppError::Forbidden("No restaurant associated with this account".to_string())
        })
    }

    /// Compare an entity's owning restaurant with the caller's tenant.
    pub fn ensure_same_tenant(&self, owner: Uuid, message: &str) -> Result<(), AppError> {
        if self.restaurant_id()? == owner {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| {
                    if rejection.is_missing() {
                        AppError::Unauthorized("Missing authentication token".to_string())
                    } else {
                        AppError::Unauthorized("Invalid authorization header".to_string())
                    }
                })?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            restaurant_id: claims.restaurant_id,
        })
    }
}
