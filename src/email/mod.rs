pub mod templates;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::models::Role;

/// Outbound account mail. Callers treat delivery as best-effort: a failure is
/// logged and never undoes the operation that triggered it.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to_email: &str, name: &str, token: &str)
    -> Result<(), String>;

    async fn send_welcome(
        &self,
        to_email: &str,
        name: &str,
        restaurant_name: &str,
    ) -> Result<(), String>;

    async fn send_password_reset(
        &self,
        to_email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), String>;

    async fn send_staff_added(
        &self,
        to_email: &str,
        name: &str,
        restaurant_name: &str,
        role: Role,
    ) -> Result<(), String>;
}

/// Links the emails point at, all rooted at the front-end origin.
#[derive(Debug, Clone)]
pub struct Links {
    client_url: String,
}

impl Links {
    pub fn new(client_url: &str) -> Self {
        Self {
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn verify_email(&self, token: &str) -> String {
        format!("{}/verify-email?token={token}", self.client_url)
    }

    pub fn reset_password(&self, token: &str) -> String {
        format!("{}/admin/reset-password?token={token}", self.client_url)
    }

    pub fn login(&self) -> String {
        format!("{}/login", self.client_url)
    }
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    links: Links,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, client_url: &str) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            links: Links::new(client_url),
        })
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(
        &self,
        to_email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), String> {
        let html = templates::render_verification(name, &self.links.verify_email(token))?;
        self.send(to_email, "Verify Your Email - eWaiter", &html).await
    }

    async fn send_welcome(
        &self,
        to_email: &str,
        name: &str,
        restaurant_name: &str,
    ) -> Result<(), String> {
        let html = templates::render_welcome(name, restaurant_name, &self.links.login())?;
        self.send(to_email, "Welcome to eWaiter!", &html).await
    }

    async fn send_password_reset(
        &self,
        to_email: &str,
        name: &str,
        token: &str,
    ) -> Result<(), String> {
        let html = templates::render_password_reset(name, &self.links.reset_password(token))?;
        self.send(to_email, "Password Reset Request - eWaiter", &html)
            .await
    }

    async fn send_staff_added(
        &self,
        to_email: &str,
        name: &str,
        restaurant_name: &str,
        role: Role,
    ) -> Result<(), String> {
        let html =
            templates::render_staff_added(name, restaurant_name, role, &self.links.login())?;
        self.send(
            to_email,
            &format!("You've been added to {restaurant_name} - eWaiter"),
            &html,
        )
        .await
    }
}

/// Used when SMTP is not configured. Outside production the links that would
/// have been mailed are logged so accounts can still be verified locally.
pub struct LogMailer {
    links: Links,
    reveal_links: bool,
}

impl LogMailer {
    pub fn new(client_url: &str, reveal_links: bool) -> Self {
        Self {
            links: Links::new(client_url),
            reveal_links,
        }
    }

    fn log(&self, kind: &str, to_email: &str, link: Option<String>) {
        match link.filter(|_| self.reveal_links) {
            Some(link) => tracing::info!(
                to = %to_email,
                link = %link,
                "SMTP not configured, {kind} email not sent"
            ),
            None => tracing::info!(to = %to_email, "SMTP not configured, {kind} email not sent"),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(
        &self,
        to_email: &str,
        _name: &str,
        token: &str,
    ) -> Result<(), String> {
        self.log("verification", to_email, Some(self.links.verify_email(token)));
        Ok(())
    }

    async fn send_welcome(
        &self,
        to_email: &str,
        _name: &str,
        _restaurant_name: &str,
    ) -> Result<(), String> {
        self.log("welcome", to_email, None);
        Ok(())
    }

    async fn send_password_reset(
        &self,
        to_email: &str,
        _name: &str,
        token: &str,
    ) -> Result<(), String> {
        self.log("password reset", to_email, Some(self.links.reset_password(token)));
        Ok(())
    }

    async fn send_staff_added(
        &self,
        to_email: &str,
        _name: &str,
        _restaurant_name: &str,
        _role: Role,
    ) -> Result<(), String> {
        self.log("staff added", to_email, None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_rooted_at_client() {
        let links = Links::new("https://app.example.com/");
        assert_eq!(
            links.verify_email("abc"),
            "https://app.example.com/verify-email?token=abc"
        );
        assert_eq!(
            links.reset_password("xyz"),
            "https://app.example.com/admin/reset-password?token=xyz"
        );
        assert_eq!(links.login(), "https://app.example.com/login");
    }
}
