/// Configuration management for forum-service
///
/// Loads configuration from environment variables (a `.env` file is honored
/// in development via dotenvy).
use crate::error::AppError;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider
    pub jwt_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if is_production => {
                return Err(AppError::Config(
                    "CORS_ALLOWED_ORIGINS must be set in production".into(),
                ))
            }
            Err(_) => "http://localhost:3000".to_string(),
        };
        if is_production && allowed_origins.trim() == "*" {
            return Err(AppError::Config(
                "CORS_ALLOWED_ORIGINS cannot be '*' in production".into(),
            ));
        }

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(value) if !value.trim().is_empty() => value,
            _ if is_production => {
                return Err(AppError::Config("JWT_SECRET must be set in production".into()))
            }
            _ => "dev-secret".to_string(),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: env::var("FORUM_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("FORUM_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8085),
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/agora".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            auth: AuthConfig { jwt_secret },
        })
    }

    #[cfg(test)]
    pub fn test_defaults() -> Self {
        Self {
            app: AppConfig {
                env: "test".into(),
                host: "127.0.0.1".into(),
                port: 8085,
            },
            cors: CorsConfig {
                allowed_origins: "http://localhost:3000".into(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/agora_test".into(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret".into(),
            },
        }
    }
}
