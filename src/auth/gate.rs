//! Per-operation role allow-lists.
//!
//! A handler states who may call it by its extractor type, e.g.
//! `Authorized(auth, _): Authorized<AdminOrKitchen>`. The check runs before the
//! handler body so business code never inspects roles itself.

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

pub trait AllowList: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

macro_rules! allow_list {
    ($($(#[$meta:meta])* $name:ident => [$($role:ident),+ $(,)?];)+) => {
        $(
            $(#[$meta])*
            pub struct $name;

            impl AllowList for $name {
                const ROLES: &'static [Role] = &[$(Role::$role),+];
            }
        )+
    };
}

allow_list! {
    SuperAdminOnly => [SuperAdmin];
    AdminOnly => [RestaurantAdmin];
    AdminOrKitchen => [RestaurantAdmin, KitchenStaff];
    AdminOrAttendant => [RestaurantAdmin, Attendant];
    /// Everyone who works inside a restaurant.
    RestaurantStaff => [RestaurantAdmin, KitchenStaff, Attendant];
}

/// An authenticated caller whose role is in `A::ROLES`.
pub struct Authorized<A: AllowList>(pub AuthUser, pub PhantomData<A>);

impl<A: AllowList> FromRequestParts<SharedState> for Authorized<A> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        user.require_any(A::ROLES)?;
        Ok(Authorized(user, PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            user_id: uuid::Uuid::now_v7(),
            email: "someone@example.com".to_string(),
            role,
            restaurant_id: Some(uuid::Uuid::now_v7()),
        }
    }

    #[test]
    fn status_updates_exclude_attendants() {
        assert!(caller(Role::KitchenStaff).require_any(AdminOrKitchen::ROLES).is_ok());
        assert!(caller(Role::RestaurantAdmin).require_any(AdminOrKitchen::ROLES).is_ok());
        assert!(matches!(
            caller(Role::Attendant).require_any(AdminOrKitchen::ROLES),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn super_admin_is_not_restaurant_staff() {
        assert!(caller(Role::SuperAdmin).require_any(RestaurantStaff::ROLES).is_err());
        assert!(caller(Role::SuperAdmin).require_any(SuperAdminOnly::ROLES).is_ok());
    }

    #[test]
    fn tenant_mismatch_is_forbidden() {
        let user = caller(Role::RestaurantAdmin);
        let own = user.restaurant_id.unwrap();
        assert!(user.ensure_same_tenant(own, "nope").is_ok());
        assert!(matches!(
            user.ensure_same_tenant(uuid::Uuid::now_v7(), "nope"),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn missing_tenant_is_forbidden() {
        let mut user = caller(Role::SuperAdmin);
        user.restaurant_id = None;
        assert!(matches!(user.restaurant_id(), Err(AppError::Forbidden(_))));
    }
}
