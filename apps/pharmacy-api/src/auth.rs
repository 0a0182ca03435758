//! Password hashing and session tokens.
//!
//! A token is a signed JWT naming the user and the server-side session row.
//! The signature alone is not enough: the session row must still exist, so
//! logout and password changes kill tokens immediately.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Hash a password using Argon2id with a random salt.
///
/// Argon2 is deliberately slow, so the work runs on the blocking pool
/// instead of stalling a runtime worker.
pub async fn hash_password(password: &str) -> Result<String, ApiError> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
    })
    .await
    .map_err(|e| ApiError::internal_logged("Password hashing task failed", e))?
    .map_err(|e| ApiError::internal_logged("Failed to hash password", e))
}

/// Verify a password against a stored PHC string, on the blocking pool.
pub async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_owned();
    let hash = hash.to_owned();
    let outcome = tokio::task::spawn_blocking(move || {
        let Ok(parsed_hash) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    })
    .await;

    match outcome {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Server-side session id
    pub sid: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtManager {
    pub fn new(secret: &str) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a session, expiring with it.
    pub fn issue(
        &self,
        user_id: &str,
        session_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<String, ApiError> {
        let claims = Claims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal_logged("Failed to generate token", e))
    }

    /// Validate and decode a token. `None` for anything malformed, forged or
    /// expired.
    pub fn validate(&self, token: &str) -> Option<Claims> {
        let token_data: TokenData<Claims> =
            decode(token, &self.decoding, &Validation::default()).ok()?;
        Some(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_password_hash_and_verify() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).await);
        assert!(!verify_password("wrong horse", &hash).await);
        assert!(!verify_password("correct horse", "not-a-phc-string").await);

        // Salted: the same password never hashes the same way twice.
        assert_ne!(hash, hash_password("correct horse").await.unwrap());
    }

    #[test]
    fn test_token_claims() {
        let manager = JwtManager::new("test-secret");
        let token = manager
            .issue("user-1", "session-1", Utc::now() + Duration::hours(1))
            .unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.sid, "session-1");
    }

    #[test]
    fn test_token_rejections() {
        let manager = JwtManager::new("test-secret");
        let other = JwtManager::new("other-secret");

        let token = manager
            .issue("user-1", "session-1", Utc::now() + Duration::hours(1))
            .unwrap();
        assert!(other.validate(&token).is_none());
        assert!(manager.validate("garbage").is_none());

        let expired = manager
            .issue("user-1", "session-1", Utc::now() - Duration::hours(1))
            .unwrap();
        assert!(manager.validate(&expired).is_none());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}
