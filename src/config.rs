use std::net::IpAddr;

use chrono::Duration;

use crate::auth::jwt::MAX_TTL_HOURS;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    /// Lifetime of a session: drives both the token expiry and the cookie max-age.
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    pub db_max_connections: u32,
    pub log_level: String,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials for the super admin created on first start when none exists.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let host: IpAddr = env_or("FINMATE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid FINMATE_HOST: {e}"))?;

        let port: u16 = env_or("FINMATE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid FINMATE_PORT: {e}"))?;

        let ttl_hours = parse_ttl_hours(&env_or("FINMATE_SESSION_TTL_HOURS", "48"))?;

        let secure_cookies = parse_bool(
            "FINMATE_SECURE_COOKIES",
            &env_or("FINMATE_SECURE_COOKIES", "false"),
        )?;

        let db_max_connections: u32 = env_or("FINMATE_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid FINMATE_DB_MAX_CONNECTIONS: {e}"))?;

        let log_level = env_or("FINMATE_LOG_LEVEL", "info");

        let bootstrap_admin = match (
            std::env::var("FINMATE_BOOTSTRAP_ADMIN_EMAIL").ok(),
            std::env::var("FINMATE_BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            session_ttl: Duration::hours(ttl_hours),
            secure_cookies,
            db_max_connections,
            log_level,
            bootstrap_admin,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_ttl_hours(value: &str) -> Result<i64, String> {
    let hours: i64 = value
        .trim()
        .parse()
        .map_err(|e| format!("Invalid FINMATE_SESSION_TTL_HOURS: {e}"))?;
    if !(1..=MAX_TTL_HOURS).contains(&hours) {
        return Err(format!(
            "FINMATE_SESSION_TTL_HOURS must be between 1 and {MAX_TTL_HOURS}"
        ));
    }
    Ok(hours)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(format!("Invalid {key}: '{other}' is not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "ON").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(!parse_bool("X", "").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }

    #[test]
    fn session_ttl_is_bounded() {
        assert_eq!(parse_ttl_hours("48").unwrap(), 48);
        assert_eq!(parse_ttl_hours("8760").unwrap(), 8760);
        assert!(parse_ttl_hours("0").is_err());
        assert!(parse_ttl_hours("-3").is_err());
        assert!(parse_ttl_hours("8761").is_err());
        assert!(parse_ttl_hours("5000000000").is_err());
        assert!(parse_ttl_hours("two").is_err());
    }
}
