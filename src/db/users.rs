use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Role, User};

pub struct NewUser<'a> {
    pub restaurant_id: Option<Uuid>,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub is_email_verified: bool,
    pub verification: Option<(&'a str, DateTime<Utc>)>,
    pub phone: Option<&'a str>,
}

/// Fields a profile or staff update may change. `None` keeps the stored value.
#[derive(Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    new: &NewUser<'_>,
) -> Result<User, sqlx::Error> {
    let (token_hash, expires_at) = new.verification.unzip();
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, restaurant_id, name, email, password_hash, role,
                            is_email_verified, email_verification_token_hash,
                            email_verification_expires_at, phone)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(new.restaurant_id)
    .bind(new.name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.role)
    .bind(new.is_email_verified)
    .bind(token_hash)
    .bind(expires_at)
    .bind(new.phone)
    .fetch_one(executor)
    .await
}

pub async fn find_by_email<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_verification_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email_verification_token_hash = $1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_reset_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE password_reset_token_hash = $1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_restaurant(
    pool: &PgPool,
    restaurant_id: Uuid,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE restaurant_id = $1 ORDER BY created_at DESC",
    )
    .bind(restaurant_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_restaurant_and_role(
    pool: &PgPool,
    restaurant_id: Uuid,
    role: Role,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE restaurant_id = $1 AND role = $2 ORDER BY name",
    )
    .bind(restaurant_id)
    .bind(role)
    .fetch_all(pool)
    .await
}

/// Flip the verified flag and consume the token. Returns false if the token
/// was consumed concurrently.
pub async fn mark_email_verified(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET is_email_verified = true,
                email_verification_token_hash = NULL,
                email_verification_expires_at = NULL,
                updated_at = now()
         WHERE id = $1 AND email_verification_token_hash = $2",
    )
    .bind(id)
    .bind(token_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn set_verification_token(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET email_verification_token_hash = $2,
                email_verification_expires_at = $3, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_reset_token(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET password_reset_token_hash = $2,
                password_reset_expires_at = $3, updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Set a new password and consume the reset token in one statement.
pub async fn reset_password(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET password_hash = $3,
                password_reset_token_hash = NULL,
                password_reset_expires_at = NULL,
                updated_at = now()
         WHERE id = $1 AND password_reset_token_hash = $2",
    )
    .bind(id)
    .bind(token_hash)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &UserChanges,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            phone = COALESCE($4, phone),
            avatar = COALESCE($5, avatar),
            password_hash = COALESCE($6, password_hash),
            role = COALESCE($7, role),
            updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(changes.name.as_deref())
    .bind(changes.email.as_deref())
    .bind(changes.phone.as_deref())
    .bind(changes.avatar.as_deref())
    .bind(changes.password_hash.as_deref())
    .bind(changes.role)
    .fetch_optional(pool)
    .await
}

pub async fn toggle_active(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET is_active = NOT is_active, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
