//! JWT token generation and validation

use crate::{config::AppConfig, error::AppError, models::Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Display name recorded in audit rows
    pub username: String,

    /// Storefront role
    pub role: Role,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_exp_secs: u64,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_exp_secs: config.security.access_token_exp_secs,
        })
    }

    /// Generate access token
    pub fn generate_access_token(
        &self,
        user_id: &Uuid,
        username: &str,
        role: Role,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(self.access_token_exp_secs as i64);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Validate and decode token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        Ok(decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::Unauthorized
            })?
            .claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DatabaseConfig, LoggingConfig, ModerationConfig, SecurityConfig, ServerConfig,
        StorageBackend,
    };
    use secrecy::Secret;

    fn test_config(secret: &str) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:3000".to_string(),
                graceful_shutdown_timeout_secs: 30,
                body_limit_bytes: 1024 * 1024,
            },
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                url: Secret::new("postgresql://localhost/test".to_string()),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_secs: 30,
                idle_timeout_secs: 600,
                max_lifetime_secs: 1800,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(secret.to_string()),
                access_token_exp_secs: 900,
                trust_proxy: false,
                allowed_ips: None,
            },
            moderation: ModerationConfig::default(),
        }
    }

    #[test]
    fn test_token_roundtrip_keeps_role() {
        let service =
            JwtService::from_config(&test_config("test-secret-key-for-testing-only-min-32-chars"))
                .unwrap();
        let user_id = Uuid::new_v4();

        let token = service
            .generate_access_token(&user_id, "Mona Moderator", Role::Staff)
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "Mona Moderator");
        assert_eq!(claims.role, Role::Staff);
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtService::from_config(&test_config("short")).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let service =
            JwtService::from_config(&test_config("test-secret-key-for-testing-only-min-32-chars"))
                .unwrap();
        let token = service
            .generate_access_token(&Uuid::new_v4(), "admin", Role::Admin)
            .unwrap();

        let other =
            JwtService::from_config(&test_config("another-secret-key-for-testing-min-32-chars"))
                .unwrap();
        assert!(matches!(other.validate_token(&token), Err(AppError::Unauthorized)));
    }
}
