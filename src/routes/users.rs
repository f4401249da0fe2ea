use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::gate::{AdminOnly, AdminOrAttendant, AdminOrKitchen, Authorized};
use crate::auth::password;
use crate::db;
use crate::db::users::{NewUser, UserChanges};
use crate::error::AppError;
use crate::models::{Role, User};
use crate::routes::{best_effort, validate};
use crate::state::SharedState;

const EMAIL_TAKEN: &str = "User with this email already exists";

#[derive(Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateStaff {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStaff {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

fn staff_role(role: Role) -> Result<Role, AppError> {
    if role.is_staff() {
        Ok(role)
    } else {
        Err(AppError::BadRequest(
            "Invalid role. Must be kitchen_staff or attendant".to_string(),
        ))
    }
}

/// Validate and hash the fields shared by profile and staff edits.
fn changes(
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    avatar: Option<String>,
    new_password: Option<String>,
) -> Result<UserChanges, AppError> {
    let password_hash = match new_password {
        Some(pw) => {
            validate::password(&pw)?;
            Some(password::hash(&pw).map_err(AppError::Internal)?)
        }
        None => None,
    };

    Ok(UserChanges {
        name: name
            .map(|n| validate::required("Name", &n).map(str::to_string))
            .transpose()?,
        email: email.map(|e| validate::email(&e)).transpose()?,
        phone,
        avatar,
        password_hash,
        ..Default::default()
    })
}

pub async fn profile(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(user))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfile>, AppError>,
) -> Result<Json<User>, AppError> {
    let changes = changes(req.name, req.email, req.phone, req.avatar, req.password)?;
    let user = db::users::update(&state.pool, auth.user_id, &changes)
        .await
        .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?
        .ok_or_else(not_found)?;
    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

pub async fn create_staff(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Json(req), _): WithRejection<Json<CreateStaff>, AppError>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let restaurant_id = auth.restaurant_id()?;
    let role = staff_role(req.role)?;
    let name = validate::required("Name", &req.name)?;
    let email = validate::email(&req.email)?;
    validate::password(&req.password)?;

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;
    let user = db::users::create(
        &state.pool,
        &NewUser {
            restaurant_id: Some(restaurant_id),
            name,
            email: &email,
            password_hash: &pw_hash,
            role,
            is_email_verified: true,
            verification: None,
            phone: req.phone.as_deref(),
        },
    )
    .await
    .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?;

    tracing::info!(
        user_id = %user.id,
        restaurant_id = %restaurant_id,
        role = %role,
        "Staff member added"
    );

    let restaurant_name = db::restaurants::find_by_id(&state.pool, restaurant_id)
        .await?
        .map(|r| r.name)
        .unwrap_or_else(|| "your restaurant".to_string());
    best_effort(
        "staff added",
        state
            .mailer
            .send_staff_added(&user.email, &user.name, &restaurant_name, role),
    )
    .await;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_staff(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = db::users::list_by_restaurant(&state.pool, auth.restaurant_id()?).await?;
    Ok(Json(users))
}

/// Load a user and confirm they work at the caller's restaurant.
async fn load_member(state: &SharedState, auth: &AuthUser, id: Uuid) -> Result<User, AppError> {
    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(not_found)?;
    match user.restaurant_id {
        Some(owner) => auth.ensure_same_tenant(owner, "Access denied")?,
        None => return Err(AppError::Forbidden("Access denied".to_string())),
    }
    Ok(user)
}

pub async fn get_staff(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<User>, AppError> {
    let user = load_member(&state, &auth, id).await?;
    Ok(Json(user))
}

pub async fn update_staff(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateStaff>, AppError>,
) -> Result<Json<User>, AppError> {
    let member = load_member(&state, &auth, id).await?;

    let role = match req.role {
        Some(role) if !member.role.is_staff() => {
            return Err(AppError::Forbidden(format!(
                "Cannot change the role of a {} account to {role}",
                member.role
            )));
        }
        Some(role) => Some(staff_role(role)?),
        None => None,
    };

    let mut changes = changes(req.name, req.email, req.phone, req.avatar, req.password)?;
    changes.role = role;

    let user = db::users::update(&state.pool, member.id, &changes)
        .await
        .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?
        .ok_or_else(not_found)?;
    tracing::info!(user_id = %user.id, updated_by = %auth.user_id, "Staff member updated");
    Ok(Json(user))
}

pub async fn toggle_staff(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<User>, AppError> {
    let member = load_member(&state, &auth, id).await?;
    if member.id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let user = db::users::toggle_active(&state.pool, member.id)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(user_id = %user.id, is_active = user.is_active, "Staff member toggled");
    Ok(Json(user))
}

pub async fn delete_staff(
    Authorized(auth, _): Authorized<AdminOnly>,
    State(state): State<SharedState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<StatusCode, AppError> {
    let member = load_member(&state, &auth, id).await?;
    if member.id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot remove your own account".to_string(),
        ));
    }
    if !member.role.is_staff() {
        return Err(AppError::Forbidden(
            "Only staff members can be removed".to_string(),
        ));
    }

    db::users::delete(&state.pool, member.id).await?;
    tracing::info!(user_id = %member.id, removed_by = %auth.user_id, "Staff member removed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn kitchen_staff(
    Authorized(auth, _): Authorized<AdminOrKitchen>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = db::users::list_by_restaurant_and_role(
        &state.pool,
        auth.restaurant_id()?,
        Role::KitchenStaff,
    )
    .await?;
    Ok(Json(users))
}

pub async fn attendants(
    Authorized(auth, _): Authorized<AdminOrAttendant>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users =
        db::users::list_by_restaurant_and_role(&state.pool, auth.restaurant_id()?, Role::Attendant)
            .await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_staff_roles_can_be_assigned() {
        assert!(staff_role(Role::KitchenStaff).is_ok());
        assert!(staff_role(Role::Attendant).is_ok());
        assert!(matches!(
            staff_role(Role::RestaurantAdmin),
            Err(AppError::BadRequest(_))
        ));
        assert!(staff_role(Role::SuperAdmin).is_err());
    }

    #[test]
    fn changes_validate_inputs() {
        let ok = changes(Some(" Ada ".into()), Some("ADA@x.io".into()), None, None, None).unwrap();
        assert_eq!(ok.name.as_deref(), Some("Ada"));
        assert_eq!(ok.email.as_deref(), Some("ada@x.io"));
        assert!(ok.password_hash.is_none());

        assert!(changes(None, Some("nope".into()), None, None, None).is_err());
        assert!(changes(None, None, None, None, Some("short".into())).is_err());
    }
}
