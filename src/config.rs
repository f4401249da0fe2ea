use std::net::IpAddr;
use std::path::PathBuf;

use chrono::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: Duration,
    pub host: IpAddr,
    pub port: u16,
    pub environment: Environment,
    pub client_url: String,
    pub public_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_size: usize,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let jwt_expiration = parse_duration(&env_or("JWT_EXPIRATION", "7d"))
            .map_err(|e| format!("Invalid JWT_EXPIRATION: {e}"))?;

        let host: IpAddr = env_or("HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid HOST: {e}"))?;

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PORT: {e}"))?;

        let environment = match env_or("NODE_ENV", "development").as_str() {
            "development" => Environment::Development,
            "production" => Environment::Production,
            other => {
                return Err(format!(
                    "Invalid NODE_ENV '{other}': expected development or production"
                ));
            }
        };

        let client_url = env_or("APP_CLIENT_URL", "http://localhost:5173");
        let public_url = env_or("PUBLIC_URL", &format!("http://{host}:{port}"));
        let upload_dir = PathBuf::from(env_or("UPLOAD_DIR", "uploads"));

        let max_upload_size: usize = env_or("MAX_UPLOAD_SIZE", "5242880")
            .parse()
            .map_err(|e| format!("Invalid MAX_UPLOAD_SIZE: {e}"))?;

        let log_level = env_or("LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("EMAIL_HOST").ok().filter(|v| !v.is_empty()),
            std::env::var("EMAIL_USER").ok().filter(|v| !v.is_empty()),
            std::env::var("EMAIL_PASSWORD").ok().filter(|v| !v.is_empty()),
        ) {
            (Some(host), Some(user), Some(pass)) => Some(SmtpConfig {
                host,
                port: env_or("EMAIL_PORT", "587")
                    .parse()
                    .map_err(|e| format!("Invalid EMAIL_PORT: {e}"))?,
                user,
                pass,
                from: env_or("EMAIL_FROM", "eWaiter <noreply@ewaiter.com>"),
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration,
            host,
            port,
            environment,
            client_url,
            public_url,
            upload_dir,
            max_upload_size,
            log_level,
            smtp,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

/// Parse a lifetime such as `3600`, `90s`, `15m`, `12h` or `7d`.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], Some(c)),
        Some(_) => (value, None),
        None => return Err("empty duration".to_string()),
    };

    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("'{value}' is not a duration"))?;
    if amount <= 0 {
        return Err(format!("'{value}' must be positive"));
    }

    match unit {
        None | Some('s') => Ok(Duration::seconds(amount)),
        Some('m') => Ok(Duration::minutes(amount)),
        Some('h') => Ok(Duration::hours(amount)),
        Some('d') => Ok(Duration::days(amount)),
        Some(other) => Err(format!("unknown duration unit '{other}'")),
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_duration("15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_duration("3600").unwrap(), Duration::hours(1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("d").is_err());
        assert!(parse_duration("5w").is_err());
        assert!(parse_duration("0d").is_err());
        assert!(parse_duration("-3h").is_err());
    }
}
