//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment
//! variables into a type-safe struct.

use chrono::{Duration, FixedOffset};
use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `MERCADO_PAGO_ACCESS_TOKEN` (required): bearer token for the PIX provider
/// - `MERCADO_PAGO_BASE_URL` (optional): provider API root
/// - `MERCADO_PAGO_NOTIFICATION_URL` (optional): forwarded with every charge
/// - `PAYMENT_WINDOW_MINUTES` (optional): lifetime of a PIX charge, defaults to 10
/// - `PAYMENT_TIMEOUT_SECS` (optional): outbound timeout for provider calls, defaults to 10
/// - `VENUE_UTC_OFFSET_HOURS` (optional): local time of the courts, defaults to -3
/// - `FRONTEND_ORIGIN` (optional): CORS origin of the web client
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    pub mercado_pago_access_token: String,

    #[serde(default = "default_mercado_pago_base_url")]
    pub mercado_pago_base_url: String,

    #[serde(default)]
    pub mercado_pago_notification_url: Option<String>,

    #[serde(default = "default_payment_window_minutes")]
    pub payment_window_minutes: i64,

    #[serde(default = "default_payment_timeout_secs")]
    pub payment_timeout_secs: u64,

    #[serde(default = "default_venue_utc_offset_hours")]
    pub venue_utc_offset_hours: i32,

    #[serde(default = "default_frontend_origin")]
    pub frontend_origin: String,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_mercado_pago_base_url() -> String {
    "https://api.mercadopago.com/".to_string()
}

fn default_payment_window_minutes() -> i64 {
    10
}

fn default_payment_timeout_secs() -> u64 {
    10
}

fn default_venue_utc_offset_hours() -> i32 {
    -3
}

fn default_frontend_origin() -> String {
    "http://localhost:8080".to_string()
}

/// Reasons a loaded configuration is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("MERCADO_PAGO_ACCESS_TOKEN must not be empty")]
    MissingAccessToken,

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - Values are out of range (see [`Config::validate`])
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mercado_pago_access_token.trim().is_empty() {
            return Err(ConfigError::MissingAccessToken);
        }

        url::Url::parse(&self.mercado_pago_base_url).map_err(|e| ConfigError::Invalid {
            name: "MERCADO_PAGO_BASE_URL",
            reason: e.to_string(),
        })?;

        if self.payment_window_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "PAYMENT_WINDOW_MINUTES",
                reason: "must be positive".to_string(),
            });
        }

        self.venue_offset()?;
        Ok(())
    }

    /// How long a freshly created charge stays payable.
    pub fn payment_window(&self) -> Duration {
        Duration::minutes(self.payment_window_minutes)
    }

    /// Fixed UTC offset of the venue, used to build daily slot grids.
    pub fn venue_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.venue_utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::Invalid {
                name: "VENUE_UTC_OFFSET_HOURS",
                reason: "must be between -23 and 23".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "postgres://localhost/courts".to_string(),
            server_port: default_port(),
            mercado_pago_access_token: "TEST-token".to_string(),
            mercado_pago_base_url: default_mercado_pago_base_url(),
            mercado_pago_notification_url: None,
            payment_window_minutes: default_payment_window_minutes(),
            payment_timeout_secs: default_payment_timeout_secs(),
            venue_utc_offset_hours: default_venue_utc_offset_hours(),
            frontend_origin: default_frontend_origin(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        let config = sample();
        assert!(config.validate().is_ok());
        assert_eq!(config.payment_window(), Duration::minutes(10));
        assert_eq!(config.venue_offset().unwrap().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn blank_access_token_is_rejected() {
        let config = Config {
            mercado_pago_access_token: "   ".to_string(),
            ..sample()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingAccessToken)
        ));
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let config = Config {
            venue_utc_offset_hours: 30,
            ..sample()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                name: "VENUE_UTC_OFFSET_HOURS",
                ..
            })
        ));
    }

    #[test]
    fn huge_offset_is_rejected_instead_of_overflowing() {
        for hours in [i32::MAX, i32::MIN] {
            let config = Config {
                venue_utc_offset_hours: hours,
                ..sample()
            };
            assert!(matches!(
                config.venue_offset(),
                Err(ConfigError::Invalid {
                    name: "VENUE_UTC_OFFSET_HOURS",
                    ..
                })
            ));
        }
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let config = Config {
            mercado_pago_base_url: "not a url".to_string(),
            ..sample()
        };
        assert!(config.validate().is_err());
    }
}
