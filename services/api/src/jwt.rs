//! JWT service for token generation and validation
//!
//! Tokens are signed with HS256 and carry the user's id and role. The
//! signing secret must be provided through the environment; there is
//! deliberately no built-in fallback value.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::{User, UserRole};

/// Default token lifetime: 7 days
const DEFAULT_EXPIRY_SECS: u64 = 604_800;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiration time in seconds
    pub expiry_secs: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: signing secret, required
    /// - `JWT_EXPIRY_SECS`: token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let expiry_secs = std::env::var("JWT_EXPIRY_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EXPIRY_SECS);

        Ok(JwtConfig {
            secret,
            expiry_secs,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User role at issue time
    pub role: UserRole,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            expiry_secs: config.expiry_secs,
        }
    }

    /// Generate a token for a user
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now,
            exp: now + self.expiry_secs,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;

    fn test_user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "anna@example.de".into(),
            password_hash: String::new(),
            name: "Anna".into(),
            avatar_url: None,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            expiry_secs: 3600,
        })
    }

    #[test]
    fn token_round_trip_decodes_to_user_id() {
        let service = test_service("test-secret");
        let user = test_user(UserRole::User);

        let token = service.generate_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_carries_role() {
        let service = test_service("test-secret");
        let admin = test_user(UserRole::Admin);

        let token = service.generate_token(&admin).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let issuer = test_service("secret-a");
        let verifier = test_service("secret-b");

        let token = issuer.generate_token(&test_user(UserRole::User)).unwrap();
        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_token_fails_validation() {
        let service = test_service("test-secret");
        assert!(service.validate_token("not.a.token").is_err());
    }

    #[test]
    #[serial]
    fn config_requires_a_secret() {
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }

        assert!(JwtConfig::from_env().is_err());

        unsafe {
            std::env::set_var("JWT_SECRET", "   ");
        }

        assert!(JwtConfig::from_env().is_err());

        // Clean up
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
    }

    #[test]
    #[serial]
    fn config_reads_secret_and_default_expiry() {
        unsafe {
            std::env::set_var("JWT_SECRET", "env-secret");
            std::env::remove_var("JWT_EXPIRY_SECS");
        }

        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.secret, "env-secret");
        assert_eq!(config.expiry_secs, DEFAULT_EXPIRY_SECS);

        // Clean up
        unsafe {
            std::env::remove_var("JWT_SECRET");
        }
    }
}
