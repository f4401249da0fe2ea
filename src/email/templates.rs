use askama::Template;

use crate::models::Role;

#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmail<'a> {
    name: &'a str,
    verification_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmail<'a> {
    name: &'a str,
    restaurant_name: &'a str,
    login_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmail<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/staff_added.html")]
struct StaffAddedEmail<'a> {
    name: &'a str,
    restaurant_name: &'a str,
    role: &'a str,
    login_url: &'a str,
}

fn render(template: &impl Template) -> Result<String, String> {
    template
        .render()
        .map_err(|e| format!("Failed to render email: {e}"))
}

pub fn render_verification(name: &str, verification_url: &str) -> Result<String, String> {
    render(&VerificationEmail {
        name,
        verification_url,
    })
}

pub fn render_welcome(
    name: &str,
    restaurant_name: &str,
    login_url: &str,
) -> Result<String, String> {
    render(&WelcomeEmail {
        name,
        restaurant_name,
        login_url,
    })
}

pub fn render_password_reset(name: &str, reset_url: &str) -> Result<String, String> {
    render(&PasswordResetEmail { name, reset_url })
}

pub fn render_staff_added(
    name: &str,
    restaurant_name: &str,
    role: Role,
    login_url: &str,
) -> Result<String, String> {
    let role = match role {
        Role::KitchenStaff => "kitchen staff",
        Role::Attendant => "attendant",
        Role::RestaurantAdmin => "administrator",
        Role::SuperAdmin => "platform administrator",
    };
    render(&StaffAddedEmail {
        name,
        restaurant_name,
        role,
        login_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_in_names_is_escaped() {
        let html = render_staff_added(
            "<a href=\"https://evil.example\">Reset here</a>",
            "Lodge <b>",
            Role::Attendant,
            "https://app.example.com/login",
        )
        .unwrap();

        assert!(!html.contains("<a href=\"https://evil.example\">"));
        assert!(html.contains("&lt;a href="));
        assert!(!html.contains("Lodge <b>"));
        assert!(html.contains("Lodge &lt;b&gt;"));
        assert!(html.contains("<strong>attendant</strong>"));
    }

    #[test]
    fn verification_carries_link_and_name() {
        let html = render_verification("Ada", "https://app.example.com/verify-email?token=abc123")
            .unwrap();
        assert!(html.contains("Hi Ada,"));
        assert!(html.contains("token=abc123"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn welcome_escapes_restaurant_name() {
        let html = render_welcome("Ada", "Tom & Jerry's", "https://app.example.com/login").unwrap();
        assert!(html.contains("Tom &amp; Jerry"));
    }
}
