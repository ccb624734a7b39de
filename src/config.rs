use std::env;

use thiserror::Error;

pub const DEFAULT_PAYMENT_ENDPOINT: &str = "https://fakepayment.onrender.com/payments";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub endpoint: String,
    /// Bearer token for the provider. Charges fail as internal errors without it.
    pub token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_pool_size: u32,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_pool_size: parse_or(&lookup, "DB_POOL_SIZE", 10, "positive integer")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080, "port number")?,
            jwt_secret: required("JWT_SECRET")?,
            payment: PaymentConfig {
                endpoint: lookup("PAYMENT_GATEWAY_URL")
                    .unwrap_or_else(|| DEFAULT_PAYMENT_ENDPOINT.to_string()),
                token: lookup("FAKE_PAYMENT_TOKEN").filter(|t| !t.trim().is_empty()),
                timeout_secs: parse_or(&lookup, "PAYMENT_TIMEOUT_SECS", 15, "number of seconds")?,
            },
        })
    }
}

fn parse_or<F, T>(
    lookup: &F,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
