/// JWT validation for caller identity
///
/// The service never issues tokens; the external identity provider does.
/// Tokens are HS256-signed with a shared secret loaded at startup. Claims
/// carry the user id (`sub`) and a display name (`name`) that message
/// creation snapshots into `author_display_name`.
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::AppError;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name of the caller
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

// Decoding key loaded from configuration during startup.
static DECODING_KEY: Lazy<RwLock<Option<DecodingKey>>> = Lazy::new(|| RwLock::new(None));

/// Initialize the shared JWT secret. Must be called during application
/// startup before any token validation.
pub fn initialize(secret: &str) -> Result<(), AppError> {
    let mut key = DECODING_KEY
        .write()
        .map_err(|_| AppError::Internal("JWT key lock poisoned".into()))?;
    *key = Some(DecodingKey::from_secret(secret.as_bytes()));
    Ok(())
}

/// Validate a bearer token and return its claims.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>, AppError> {
    let key = DECODING_KEY
        .read()
        .map_err(|_| AppError::Internal("JWT key lock poisoned".into()))?;
    let key = key.as_ref().ok_or_else(|| {
        AppError::Config("JWT secret not initialized; call jwt::initialize at startup".into())
    })?;

    decode::<Claims>(token, key, &Validation::new(Algorithm::HS256))
        .map_err(|_| AppError::Unauthorized("invalid or expired token".into()))
}
