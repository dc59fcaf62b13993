//! Admin authentication: password check and session tokens
//!
//! There is a single admin identity. The password is checked against a
//! bcrypt hash from configuration and a successful login yields a signed
//! HS256 token carried as a Bearer header or the `admin_session` cookie.

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;
use crate::error::{AppError, AppResult};

/// Subject of every admin token
pub const ADMIN_SUBJECT: &str = "admin";

/// Admin authentication service
#[derive(Clone)]
pub struct AdminAuthService {
    password_hash: String,
    token_secret: String,
    token_ttl_secs: i64,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    /// Issue date, YYYY-MM-DD
    pub day: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issued admin token
#[derive(Debug, Serialize)]
pub struct AdminToken {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AdminAuthService {
    /// Create a new AdminAuthService instance
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            password_hash: config.password_hash.clone(),
            token_secret: config.token_secret.clone(),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// Check the admin password and issue a token
    pub fn login(&self, password: &str) -> AppResult<AdminToken> {
        if self.password_hash.is_empty() {
            tracing::warn!("Admin login attempted but no password hash is configured");
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(password, &self.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::info!("Admin login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.generate_token()?;
        tracing::info!("Admin logged in");
        Ok(token)
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.token_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        if token_data.claims.sub != ADMIN_SUBJECT {
            return Err(AppError::InvalidToken);
        }

        Ok(token_data.claims)
    }

    fn generate_token(&self) -> AppResult<AdminToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: ADMIN_SUBJECT.to_string(),
            day: now.format("%Y-%m-%d").to_string(),
            exp: (now + Duration::seconds(self.token_ttl_secs)).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.token_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(AdminToken {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl_secs,
        })
    }
}
