//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use jokes::{db::DatabaseConfig, session::MIN_SESSION_SECRET_LEN};
use std::net::SocketAddr;

/// Minimum pepper length accepted at startup
pub const MIN_PEPPER_LEN: usize = 16;

/// Longest session lifetime accepted at startup, in days
pub const MAX_SESSION_AGE_DAYS: i64 = 3650;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Session cookie configuration
    pub session: SessionSettings,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Keep users and sessions in memory instead of PostgreSQL
    pub in_memory: bool,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Cookie signing secret (required)
    pub session_secret: String,
    /// Password hashing pepper (required)
    pub password_pepper: String,
}

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Mark the cookie `Secure` (enable behind HTTPS)
    pub cookie_secure: bool,
    /// Session lifetime in days
    pub max_age_days: i64,
    /// Seconds between sweeps of expired sessions
    pub purge_interval_secs: u64,
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub in_memory: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(overrides: Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_optional(&lookup, "SERVER_BIND")?
                .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000))),
        };

        let defaults = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url: overrides
                .database_url
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            max_connections: parse_optional(&lookup, "DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            min_connections: parse_optional(&lookup, "DB_MIN_CONNECTIONS")?
                .unwrap_or(defaults.min_connections),
            connection_timeout_secs: parse_optional(&lookup, "DB_CONNECTION_TIMEOUT_SECS")?
                .unwrap_or(defaults.connection_timeout_secs),
            idle_timeout_secs: parse_optional(&lookup, "DB_IDLE_TIMEOUT_SECS")?
                .unwrap_or(defaults.idle_timeout_secs),
            max_lifetime_secs: parse_optional(&lookup, "DB_MAX_LIFETIME_SECS")?
                .unwrap_or(defaults.max_lifetime_secs),
        };

        // Security configuration (REQUIRED)
        let session_secret = lookup("SESSION_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "SESSION_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        let password_pepper =
            lookup("PASSWORD_PEPPER").ok_or_else(|| ConfigError::MissingRequired {
                var: "PASSWORD_PEPPER".to_string(),
                hint: "Generate with: openssl rand -hex 16".to_string(),
            })?;

        let session = SessionSettings {
            cookie_secure: parse_optional(&lookup, "SESSION_COOKIE_SECURE")?.unwrap_or(false),
            max_age_days: parse_optional(&lookup, "SESSION_MAX_AGE_DAYS")?.unwrap_or(30),
            purge_interval_secs: parse_optional(&lookup, "SESSION_PURGE_INTERVAL_SECS")?
                .unwrap_or(3600),
        };

        Ok(ServerConfig {
            bind,
            database,
            security: SecurityConfig {
                session_secret,
                password_pepper,
            },
            session,
            metrics_bind: parse_optional(&lookup, "METRICS_BIND")?,
            in_memory: overrides.in_memory,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "SESSION_SECRET".to_string(),
                reason: format!("Must be at least {MIN_SESSION_SECRET_LEN} characters"),
            });
        }

        if self.security.password_pepper.len() < MIN_PEPPER_LEN {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: format!("Must be at least {MIN_PEPPER_LEN} characters"),
            });
        }

        if !(1..=MAX_SESSION_AGE_DAYS).contains(&self.session.max_age_days) {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_AGE_DAYS".to_string(),
                reason: format!("Must be between 1 and {MAX_SESSION_AGE_DAYS}"),
            });
        }

        if self.session.purge_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SESSION_PURGE_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed DB_MAX_CONNECTIONS ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a variable that must be well-formed when present
fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .map(|v| {
            v.parse().map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("Cannot parse {v:?}"),
            })
        })
        .transpose()
}
