use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub chat_webhook_url: Option<String>,
    pub chat_webhook_timeout: Duration,
    pub points_per_currency_unit: f64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let host = match lookup("HOST") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name: "HOST", value: v })?,
            None => IpAddr::from([127, 0, 0, 1]),
        };
        let port = parse_or(&lookup, "PORT", 3000u16)?;
        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10u32)?;
        let timeout_secs = parse_or(&lookup, "CHAT_WEBHOOK_TIMEOUT_SECS", 30u64)?;
        let points_per_currency_unit = parse_or(&lookup, "LOYALTY_POINTS_PER_CURRENCY_UNIT", 1.0f64)?;
        if points_per_currency_unit < 0.0 || !points_per_currency_unit.is_finite() {
            return Err(ConfigError::Invalid {
                name: "LOYALTY_POINTS_PER_CURRENCY_UNIT",
                value: points_per_currency_unit.to_string(),
            });
        }

        let chat_webhook_url = lookup("CHAT_WEBHOOK_URL").filter(|v| !v.trim().is_empty());

        Ok(Self {
            database_url,
            jwt_secret,
            host,
            port,
            db_max_connections,
            chat_webhook_url,
            chat_webhook_timeout: Duration::from_secs(timeout_secs),
            points_per_currency_unit,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        None => Ok(default),
    }
}
