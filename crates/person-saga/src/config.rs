//! Configuration loaded from environment variables.

use std::time::Duration;

/// Connection settings for the person store and both collaborators.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: Postgres connection string (default: `"postgres://localhost/persons"`)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `IMAGE_SERVICE_URL`: image service base URL (default: `"http://localhost:8080/"`)
/// - `RECURRING_TASKS_URL`: recurring-task service base URL (default: `"http://localhost:8081/"`)
/// - `HTTP_TIMEOUT_SECS`: per-request timeout for both services (default: `10`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub image_service_url: String,
    pub recurring_tasks_url: String,
    pub http_timeout_secs: u64,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            image_service_url: lookup("IMAGE_SERVICE_URL").unwrap_or(defaults.image_service_url),
            recurring_tasks_url: lookup("RECURRING_TASKS_URL")
                .unwrap_or(defaults.recurring_tasks_url),
            http_timeout_secs: lookup("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the HTTP request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/persons".to_string(),
            database_max_connections: 5,
            image_service_url: "http://localhost:8080/".to_string(),
            recurring_tasks_url: "http://localhost:8081/".to_string(),
            http_timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}
