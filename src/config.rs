use anyhow::Context;
use rust_decimal::Decimal;

use crate::domain::order::pricing::DeliveryChargePolicy;

// ============================================================================
// Configuration - loaded once at startup, read-only afterwards
// ============================================================================
//
// Everything comes from the environment. Only DATABASE_URL is mandatory;
// the rest have defaults. Boolean values are `true`/`false`.
//
//   DATABASE_URL               Postgres connection string (required)
//   HTTP_PORT                  API port, default 8080
//   METRICS_PORT               Prometheus scrape port, default 9090
//   DELIVERY_CHARGE_ENABLED    default true
//   DELIVERY_CHARGE_AMOUNT     flat fee, default 50
//   FREE_DELIVERY_THRESHOLD    subtotal from which delivery is free, default 1000
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub http_port: u16,
    pub metrics_port: u16,
    pub delivery_charge: DeliveryChargePolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            http_port: env_parse("HTTP_PORT", 8080)?,
            metrics_port: env_parse("METRICS_PORT", 9090)?,
            delivery_charge: DeliveryChargePolicy {
                enabled: env_parse("DELIVERY_CHARGE_ENABLED", true)?,
                flat_amount: env_parse("DELIVERY_CHARGE_AMOUNT", Decimal::from(50))?,
                free_threshold: env_parse("FREE_DELIVERY_THRESHOLD", Decimal::from(1000))?,
            },
        })
    }
}

/// Read an optional environment variable, falling back to `default`
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(e) => Err(anyhow::anyhow!("cannot read {key}: {e}")),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_used_when_unset() {
        let value: u16 = env_parse("ORDERTRACK_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_value_parsed_when_set() {
        std::env::set_var("ORDERTRACK_TEST_SET_PORT", "9000");
        let value: u16 = env_parse("ORDERTRACK_TEST_SET_PORT", 8080).unwrap();
        assert_eq!(value, 9000);
    }

    #[test]
    fn test_invalid_value_is_an_error() {
        std::env::set_var("ORDERTRACK_TEST_BAD_PORT", "not-a-port");
        let result: anyhow::Result<u16> = env_parse("ORDERTRACK_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
    }

    #[test]
    fn test_decimal_threshold_parses() {
        std::env::set_var("ORDERTRACK_TEST_THRESHOLD", "1234.56");
        let value: Decimal = env_parse("ORDERTRACK_TEST_THRESHOLD", Decimal::ZERO).unwrap();
        assert_eq!(value, Decimal::new(123456, 2));
    }

    #[test]
    fn test_bool_flag_parses() {
        std::env::set_var("ORDERTRACK_TEST_FLAG", "false");
        let value: bool = env_parse("ORDERTRACK_TEST_FLAG", true).unwrap();
        assert!(!value);
    }
}
