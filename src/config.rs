/// Configuration management for the admin service
use crate::error::{AdminError, AdminResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitSettings,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database: PathBuf,
}

/// Token signing and lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_issuer: String,
    pub token_audience: String,
    /// Access token lifetime in hours
    pub access_ttl_hours: i64,
    /// Refresh token lifetime in days
    pub refresh_ttl_days: i64,
}

/// Login rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Attempt ceiling per client address per window
    pub login_attempts: u32,
    /// Window length in seconds
    pub login_window_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AdminResult<Self> {
        dotenv::dotenv().ok();

        let host = env::var("ADMIN_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("ADMIN_PORT")
            .unwrap_or_else(|_| "4100".to_string())
            .parse()
            .map_err(|_| AdminError::Validation("Invalid port number".to_string()))?;

        let database: PathBuf = env::var("ADMIN_DATABASE")
            .unwrap_or_else(|_| "./data/admin.sqlite".to_string())
            .into();

        let jwt_secret = env::var("ADMIN_JWT_SECRET")
            .map_err(|_| AdminError::Validation("JWT secret required".to_string()))?;
        let token_issuer =
            env::var("ADMIN_TOKEN_ISSUER").unwrap_or_else(|_| "reelgate".to_string());
        let token_audience =
            env::var("ADMIN_TOKEN_AUDIENCE").unwrap_or_else(|_| "reelgate-admin".to_string());
        let access_ttl_hours = env::var("ADMIN_ACCESS_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let refresh_ttl_days = env::var("ADMIN_REFRESH_TTL_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let login_attempts = env::var("ADMIN_LOGIN_ATTEMPTS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let login_window_secs = env::var("ADMIN_LOGIN_WINDOW_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .unwrap_or(900);

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig { host, port },
            storage: StorageConfig { database },
            auth: AuthConfig {
                jwt_secret,
                token_issuer,
                token_audience,
                access_ttl_hours,
                refresh_ttl_days,
            },
            rate_limit: RateLimitSettings {
                login_attempts,
                login_window_secs,
            },
            logging: LoggingConfig { level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AdminResult<()> {
        if self.service.host.is_empty() {
            return Err(AdminError::Validation("Host cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.len() < 32 {
            return Err(AdminError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.auth.access_ttl_hours <= 0 || self.auth.refresh_ttl_days <= 0 {
            return Err(AdminError::Validation(
                "Token lifetimes must be positive".to_string(),
            ));
        }

        if self.rate_limit.login_attempts == 0 || self.rate_limit.login_window_secs == 0 {
            return Err(AdminError::Validation(
                "Login rate limit must allow at least one attempt".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            host: "localhost".to_string(),
            port: 4100,
        },
        storage: StorageConfig {
            database: PathBuf::from(":memory:"),
        },
        auth: AuthConfig {
            jwt_secret: "test-secret-key-0123456789-0123456789".to_string(),
            token_issuer: "reelgate".to_string(),
            token_audience: "reelgate-admin".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_days: 30,
        },
        rate_limit: RateLimitSettings {
            login_attempts: 10,
            login_window_secs: 900,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_secret() {
        let mut config = test_config();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(test_config().validate().is_ok());
    }
}
