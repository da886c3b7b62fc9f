//! Database Connection Management
//!
//! Utilities for managing PostgreSQL connections with SQLx.

use sqlx::PgPool;
use std::time::Duration;

use crate::config::{env, ConfigError};

/// Database connection pool type alias for convenience
pub type DatabasePool = PgPool;

/// Database configuration for connection setup
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/student_aid".to_string(),
            max_connections: 20,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(3600),
        }
    }
}

impl DatabaseConfig {
    /// Create database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::get_required("DATABASE_URL")?,
            max_connections: env::get_u32("DB_MAX_CONNECTIONS", 20),
            min_connections: env::get_u32("DB_MIN_CONNECTIONS", 1),
            connect_timeout: Duration::from_secs(env::get_u64("DB_CONNECT_TIMEOUT", 30)),
            idle_timeout: Duration::from_secs(env::get_u64("DB_IDLE_TIMEOUT", 600)),
            max_lifetime: Duration::from_secs(env::get_u64("DB_MAX_LIFETIME", 3600)),
        })
    }

    /// Create a database connection pool from this configuration
    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        sqlx::postgres::PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }
}
