//! Signed bearer tokens.
//!
//! A token is two base64url segments joined by a dot:
//!
//! ```text
//! base64url(json claims) "." base64url(HMAC-SHA3-256(secret, first segment))
//! ```
//!
//! The claims carry the acting identity and an expiry. Verification recomputes
//! the MAC in constant time before the claims are even parsed.

use crate::error::{EurekaError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha3::Sha3_256;

type HmacSha3 = Hmac<Sha3_256>;

/// Minimum accepted signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Default token validity window.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Claims embedded in a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the authenticated user.
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Issues and verifies tokens with a single server secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    /// Creates a signer. Secrets shorter than [`MIN_SECRET_LEN`] are rejected.
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Result<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(EurekaError::config(format!(
                "Token secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        if ttl <= Duration::zero() {
            return Err(EurekaError::config("Token lifetime must be positive"));
        }
        Ok(Self { secret, ttl })
    }

    /// Lifetime of freshly issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn mac(&self) -> Result<HmacSha3> {
        <HmacSha3 as Mac>::new_from_slice(&self.secret)
            .map_err(|e| EurekaError::internal(format!("Invalid HMAC key: {}", e)))
    }

    /// Issues a token for the given identity, valid from now for the configured TTL.
    pub fn issue(&self, user_id: &str, username: &str, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        self.sign(&claims)
    }

    /// Encodes and signs arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        let json = serde_json::to_vec(claims)
            .map_err(|e| EurekaError::serialization(format!("Failed to encode claims: {}", e)))?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    /// Verifies a token's signature and expiry and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or_else(|| EurekaError::unauthorized("Malformed token"))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| EurekaError::unauthorized("Malformed token signature"))?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| EurekaError::unauthorized("Invalid token signature"))?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| EurekaError::unauthorized("Malformed token payload"))?;
        let claims: Claims = serde_json::from_slice(&json)
            .map_err(|_| EurekaError::unauthorized("Malformed token claims"))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(EurekaError::unauthorized("Token expired"));
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn signer() -> TokenSigner {
        TokenSigner::new(SECRET, Duration::days(DEFAULT_TOKEN_TTL_DAYS)).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = signer();
        let token = signer.issue("user-1", "alice", "alice@example.com").unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_rejects_short_secret() {
        let err = TokenSigner::new("short", Duration::days(7)).unwrap_err();
        assert!(matches!(err, EurekaError::Config(_)));
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = signer().issue("user-1", "alice", "a@example.com").unwrap();
        let other =
            TokenSigner::new("another-secret-that-is-long-enough-xx", Duration::days(7)).unwrap();
        assert!(matches!(
            other.verify(&token),
            Err(EurekaError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let signer = signer();
        let token = signer.issue("user-1", "alice", "a@example.com").unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged_claims = Claims {
            user_id: "user-2".to_string(),
            username: "mallory".to_string(),
            email: "m@example.com".to_string(),
            iat: 0,
            exp: i64::MAX,
        };
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        let forged = format!("{}.{}", forged_payload, signature);

        assert!(matches!(
            signer.verify(&forged),
            Err(EurekaError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_expired() {
        let signer = signer();
        let now = Utc::now().timestamp();
        let token = signer
            .sign(&Claims {
                user_id: "user-1".to_string(),
                username: "alice".to_string(),
                email: "a@example.com".to_string(),
                iat: now - 10,
                exp: now - 1,
            })
            .unwrap();

        let err = signer.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_rejects_garbage() {
        let signer = signer();
        for token in ["", "nodot", "a.b", "!!!.???", "a.b.c"] {
            assert!(
                matches!(signer.verify(token), Err(EurekaError::Unauthorized(_))),
                "token {:?} should be rejected",
                token
            );
        }
    }
}
