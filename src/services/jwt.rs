//! Bearer token validation against the pre-shared HS256 key.

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Claims extracted from a verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the username known to the auth service.
    pub sub: String,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Build the validator from the configured symmetric key. Fails at
    /// construction when the key is blank so a misconfigured process never
    /// starts serving.
    pub fn new(secret: &Secret<String>) -> Result<Self, AppError> {
        let key = secret.expose_secret();
        if key.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "JWT secret key must be configured"
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        tracing::info!("JWT validator initialized with HS256 key");

        Ok(Self {
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        })
    }

    /// Verify the signature and extract claims. Every failure kind (bad
    /// signature, malformed structure, unsupported algorithm, expired)
    /// collapses into one opaque outcome for the caller; the kind is only
    /// logged.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::warn!(kind = ?e.kind(), "Rejected bearer token");
                AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
            })?;

        // Expired-but-otherwise-valid tokens must behave exactly like
        // structurally invalid ones, so expiry is checked here as well
        // instead of trusted to the library alone.
        if data.claims.exp < Utc::now().timestamp() {
            tracing::warn!(sub = %data.claims.sub, "Rejected expired bearer token");
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Invalid or expired token"
            )));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn sign(secret: &str, sub: &str, exp: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator(secret: &str) -> JwtValidator {
        JwtValidator::new(&Secret::new(secret.to_string())).unwrap()
    }

    #[test]
    fn blank_secret_is_rejected_at_construction() {
        assert!(JwtValidator::new(&Secret::new(String::new())).is_err());
        assert!(JwtValidator::new(&Secret::new("   ".to_string())).is_err());
    }

    #[test]
    fn valid_token_yields_subject_and_expiry() {
        let exp = Utc::now().timestamp() + 3600;
        let token = sign("test-secret", "maria", exp);

        let claims = validator("test-secret").validate(&token).unwrap();
        assert_eq!(claims.sub, "maria");
        assert_eq!(claims.exp, exp);
    }

    #[test]
    fn expired_token_is_rejected_even_with_valid_signature() {
        let token = sign("test-secret", "maria", Utc::now().timestamp() - 60);
        assert!(validator("test-secret").validate(&token).is_err());
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let token = sign("other-secret", "maria", Utc::now().timestamp() + 3600);
        assert!(validator("test-secret").validate(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(validator("test-secret").validate("not.a.jwt").is_err());
        assert!(validator("test-secret").validate("").is_err());
    }
}
