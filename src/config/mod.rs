//! Configuration Module
//!
//! Centralized configuration for the aid service, loaded from environment
//! variables (optionally seeded from a `.env` file by the binaries).

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::database::DatabaseConfig;
use crate::utils::error::AppError;
use crate::utils::security::DEFAULT_BCRYPT_COST;

/// Longest accepted access token lifetime: one year
pub const MAX_ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 525_600;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Environment variable helpers
pub mod env {
    use super::ConfigError;
    use std::env;

    /// Get environment variable as string with default
    pub fn get_string(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get environment variable if set and non-empty
    pub fn get_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    /// Get environment variable as u32 with default
    pub fn get_u32(key: &str, default: u32) -> u32 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u16 with default
    pub fn get_u16(key: &str, default: u16) -> u16 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as u64 with default
    pub fn get_u64(key: &str, default: u64) -> u64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get environment variable as i64 with default
    pub fn get_i64(key: &str, default: i64) -> i64 {
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Get required environment variable
    pub fn get_required(key: &str) -> Result<String, ConfigError> {
        get_optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }
}

/// Application configuration combining all service configurations
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,

    /// SMTP settings; `None` means outbound mail is only logged
    pub email: Option<EmailConfig>,

    /// Externally reachable base URL used in emailed links
    pub public_base_url: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
}

/// Password hashing configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub bcrypt_cost: u32,
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::get_string("SERVER_HOST", "0.0.0.0"),
            port: env::get_u16("SERVER_PORT", 8000),
            cors_origins: env::get_string("CORS_ORIGINS", "*")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a JWT signing algorithm name; only HMAC algorithms fit a shared secret
pub fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::InvalidValue {
            key: "ALGORITHM".to_string(),
            value: value.to_string(),
            reason: "Must be one of HS256, HS384 or HS512".to_string(),
        }),
    }
}

impl JwtConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret: env::get_required("SECRET_KEY")?,
            algorithm: parse_algorithm(&env::get_string("ALGORITHM", "HS256"))?,
            access_token_expire_minutes: env::get_i64("ACCESS_TOKEN_EXPIRE_MINUTES", 30),
        })
    }
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        Self {
            bcrypt_cost: env::get_u32("BCRYPT_COST", DEFAULT_BCRYPT_COST),
        }
    }
}

impl EmailConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let smtp_host = match env::get_optional("SMTP_SERVER") {
            Some(host) => host,
            None => return Ok(None),
        };

        let smtp_username = env::get_required("SMTP_USERNAME")?;
        Ok(Some(Self {
            smtp_host,
            smtp_port: env::get_u16("SMTP_PORT", 587),
            smtp_password: env::get_required("SMTP_PASSWORD")?,
            from_name: env::get_string("SMTP_FROM_NAME", "Student Financial Aid"),
            from_email: env::get_optional("SMTP_FROM_EMAIL").unwrap_or_else(|| smtp_username.clone()),
            smtp_username,
        }))
    }
}

impl AppConfig {
    /// Load complete application configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            security: SecurityConfig::from_env(),
            email: EmailConfig::from_env()?,
            public_base_url: env::get_string("API_BASE_URL", "http://localhost:8000")
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::ValidationError(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }

        if self.jwt.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "SECRET_KEY cannot be empty".to_string(),
            ));
        }

        if self.jwt.secret.len() < 32 {
            log::warn!("SECRET_KEY is shorter than 32 characters; use a longer random secret");
        }

        let lifetime = self.jwt.access_token_expire_minutes;
        if !(1..=MAX_ACCESS_TOKEN_EXPIRE_MINUTES).contains(&lifetime) {
            return Err(ConfigError::ValidationError(format!(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be between 1 and {}",
                MAX_ACCESS_TOKEN_EXPIRE_MINUTES
            )));
        }

        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::ValidationError(
                "BCRYPT_COST must be between 4 and 31".to_string(),
            ));
        }

        if !self.public_base_url.starts_with("http://")
            && !self.public_base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(
                "API_BASE_URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/student_aid".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout: Duration::from_secs(30),
                idle_timeout: Duration::from_secs(600),
                max_lifetime: Duration::from_secs(3600),
            },
            jwt: JwtConfig {
                secret: "a-very-long-test-secret-used-only-in-tests".to_string(),
                algorithm: Algorithm::HS256,
                access_token_expire_minutes: 30,
            },
            security: SecurityConfig { bcrypt_cost: 12 },
            email: None,
            public_base_url: "http://localhost:8000".to_string(),
        }
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("hs512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut bad_port = config();
        bad_port.server.port = 0;
        assert!(bad_port.validate().is_err());

        let mut bad_pool = config();
        bad_pool.database.min_connections = 20;
        assert!(bad_pool.validate().is_err());

        let mut empty_secret = config();
        empty_secret.jwt.secret = String::new();
        assert!(empty_secret.validate().is_err());

        let mut bad_cost = config();
        bad_cost.security.bcrypt_cost = 2;
        assert!(bad_cost.validate().is_err());

        let mut bad_url = config();
        bad_url.public_base_url = "localhost:8000".to_string();
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_token_lifetime_bounds() {
        let mut zero = config();
        zero.jwt.access_token_expire_minutes = 0;
        assert!(zero.validate().is_err());

        let mut one_year = config();
        one_year.jwt.access_token_expire_minutes = MAX_ACCESS_TOKEN_EXPIRE_MINUTES;
        assert!(one_year.validate().is_ok());

        let mut too_long = config();
        too_long.jwt.access_token_expire_minutes = MAX_ACCESS_TOKEN_EXPIRE_MINUTES + 1;
        assert!(too_long.validate().is_err());

        let mut huge = config();
        huge.jwt.access_token_expire_minutes = i64::MAX;
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().server.bind_address(), "127.0.0.1:8000");
    }
}
