use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Trim and lowercase an email address, rejecting anything that does not look
/// like `local@domain.tld`.
pub fn email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if EMAIL.is_match(&email) {
        Ok(email)
    } else {
        Err(AppError::BadRequest("A valid email address is required".to_string()))
    }
}

/// A required, non-blank text field, trimmed.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::BadRequest(format!("{field} is required")))
    } else {
        Ok(value)
    }
}

pub fn password(value: &str) -> Result<(), AppError> {
    crate::auth::password::validate(value).map_err(AppError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email() {
        assert_eq!(email("  Chef@Example.COM ").unwrap(), "chef@example.com");
    }

    #[test]
    fn rejects_malformed_email() {
        for bad in ["", "plain", "a@b", "a b@c.d", "@c.d"] {
            assert!(email(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn required_trims() {
        assert_eq!(required("Name", "  Ada ").unwrap(), "Ada");
        assert!(matches!(
            required("Name", "   "),
            Err(AppError::BadRequest(m)) if m == "Name is required"
        ));
    }
}
