//! Configuration management for Payconf Core

use anyhow::{bail, Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// Request-size limits enforced before any mutation
    pub limits: LimitsConfig,
    /// Which fields storage schema is active, resolved once at startup
    pub fields_schema: FieldsSchema,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Thresholds for MaxAllowedExceeded validation
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Maximum distinct currencies accepted in one rule-group request
    pub max_currencies: usize,
    /// Maximum field definitions accepted per scope
    pub max_fields: usize,
    /// Maximum country-authority-method pairs in one upsert request
    pub max_methods: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_currencies: 100,
            max_fields: 100,
            max_methods: 500,
        }
    }
}

/// Fields storage schema selection.
///
/// V1 persists one row per field per provider method and transaction type;
/// V2 persists one JSON blob per provider/country-authority/currency scope.
/// The choice is made here, once, and injected as a reader/writer pair —
/// business logic never branches on this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldsSchema {
    V1,
    #[default]
    V2,
}

impl std::str::FromStr for FieldsSchema {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "v1" | "legacy" => Ok(FieldsSchema::V1),
            "v2" | "scoped" => Ok(FieldsSchema::V2),
            _ => Err(format!("Unknown fields schema: {}", s)),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            },
            limits: LimitsConfig {
                max_currencies: env::var("MAX_CURRENCIES_PER_REQUEST")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .unwrap_or(100),
                max_fields: env::var("MAX_FIELDS_PER_SCOPE")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .unwrap_or(100),
                max_methods: env::var("MAX_METHODS_PER_UPSERT")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .unwrap_or(500),
            },
            fields_schema: match env::var("FIELDS_SCHEMA") {
                Ok(value) => match value.parse() {
                    Ok(schema) => schema,
                    Err(e) => bail!(e),
                },
                Err(_) => FieldsSchema::default(),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn test_config() -> Config {
        Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            database: DatabaseConfig {
                url: "mysql://localhost/test".to_string(),
                max_connections: 10,
                min_connections: 2,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
            },
            limits: LimitsConfig::default(),
            fields_schema: FieldsSchema::V2,
        }
    }

    #[test]
    fn test_config_addresses() {
        let config = test_config();
        assert_eq!(config.http_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_limits_defaults() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.max_currencies, 100);
        assert_eq!(limits.max_fields, 100);
        assert_eq!(limits.max_methods, 500);
    }

    #[rstest]
    #[case("v1", FieldsSchema::V1)]
    #[case("legacy", FieldsSchema::V1)]
    #[case("V2", FieldsSchema::V2)]
    #[case("scoped", FieldsSchema::V2)]
    fn test_fields_schema_parse(#[case] input: &str, #[case] expected: FieldsSchema) {
        assert_eq!(input.parse::<FieldsSchema>().unwrap(), expected);
    }

    #[test]
    fn test_fields_schema_parse_rejects_unknown() {
        assert!("v3".parse::<FieldsSchema>().is_err());
    }

    #[test]
    fn test_fields_schema_default_is_scoped() {
        assert_eq!(FieldsSchema::default(), FieldsSchema::V2);
    }

    #[test]
    fn test_config_clone() {
        let config1 = test_config();
        let config2 = config1.clone();

        assert_eq!(config1.http_host, config2.http_host);
        assert_eq!(config1.database.url, config2.database.url);
        assert_eq!(config1.limits.max_fields, config2.limits.max_fields);
    }

    #[test]
    fn test_config_debug() {
        let config = test_config();
        let debug_str = format!("{:?}", config);

        assert!(debug_str.contains("Config"));
        assert!(debug_str.contains("fields_schema"));
        assert!(debug_str.contains("127.0.0.1"));
    }
}
