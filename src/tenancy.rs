//! Restaurant (tenant) creation and slug assignment.

use chrono::Utc;
use rand::Rng;
use sqlx::PgConnection;

use crate::db;
use crate::db::restaurants::NewRestaurant;
use crate::error::AppError;
use crate::models::Restaurant;

pub const MAX_SLUG_ATTEMPTS: usize = 5;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Lowercase, ASCII alphanumerics separated by single dashes.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// `{slugified name}-{base36 millis}{6 random base36 chars}`.
pub fn generate_slug(name: &str) -> String {
    let base = match slugify(name) {
        s if s.is_empty() => "restaurant".to_string(),
        s => s,
    };

    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::rng();
    let random: String = (0..6)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();

    format!("{base}-{}{random}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Insert a restaurant under a fresh unique slug. Slug collisions are retried a
/// bounded number of times before surfacing as `Conflict`.
pub async fn create_restaurant(
    conn: &mut PgConnection,
    new: &NewRestaurant,
) -> Result<Restaurant, AppError> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = generate_slug(&new.name);
        if db::restaurants::slug_exists(&mut *conn, &slug).await? {
            tracing::warn!(slug = %slug, attempt, "Slug collision, regenerating");
            continue;
        }

        let restaurant = db::restaurants::create(&mut *conn, &slug, new)
            .await
            .map_err(AppError::conflict_on_unique(
                "A restaurant with this slug already exists",
            ))?;
        tracing::info!(
            restaurant_id = %restaurant.id,
            slug = %restaurant.slug,
            "Restaurant created"
        );
        return Ok(restaurant);
    }

    Err(AppError::Conflict(
        "Could not allocate a unique slug for this restaurant".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Mama's  Kitchen & Bar!"), "mama-s-kitchen-bar");
        assert_eq!(slugify("--Hello--"), "hello");
        assert_eq!(slugify("Café"), "caf");
    }

    #[test]
    fn generated_slug_keeps_the_name() {
        let slug = generate_slug("Grand Hotel");
        assert!(slug.starts_with("grand-hotel-"), "{slug}");
        assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn identical_names_get_distinct_slugs() {
        let a = generate_slug("Same Name");
        let b = generate_slug("Same Name");
        assert_ne!(a, b);
    }

    #[test]
    fn unsluggable_name_falls_back() {
        assert!(generate_slug("!!!").starts_with("restaurant-"));
    }

    #[test]
    fn base36_encoding() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
