//! Identity guard: turns an `Authorization` header into an acting identity.
//!
//! Two modes are offered to the rest of the service:
//!
//! - [`AuthMode::Required`]: a valid bearer token must be present.
//! - [`AuthMode::Optional`]: a missing credential means anonymous; a credential
//!   that is present but invalid is still rejected so token corruption does not
//!   silently turn into an anonymous session.
//!
//! Holding an [`Identity`] value is the capability to mutate: every write
//! operation in the engines takes one by reference.

use super::token::TokenSigner;
use crate::error::{EurekaError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub email: String,
}

/// How strictly a request must be authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

/// Stateless verifier for bearer credentials.
#[derive(Debug, Clone)]
pub struct IdentityGuard {
    signer: TokenSigner,
}

impl IdentityGuard {
    pub fn new(signer: TokenSigner) -> Self {
        Self { signer }
    }

    /// The signer used for issuing tokens at login and registration.
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Resolves the raw `Authorization` header value under the given mode.
    ///
    /// Returns `Ok(None)` only for an anonymous caller in optional mode.
    pub fn resolve(&self, authorization: Option<&str>, mode: AuthMode) -> Result<Option<Identity>> {
        let header = match authorization.map(str::trim).filter(|h| !h.is_empty()) {
            Some(header) => header,
            None => {
                return match mode {
                    AuthMode::Required => Err(EurekaError::unauthorized("Access token required")),
                    AuthMode::Optional => Ok(None),
                };
            }
        };

        let token = bearer_token(header)
            .ok_or_else(|| EurekaError::unauthorized("Authorization must use the Bearer scheme"))?;

        match self.signer.verify(token) {
            Ok(claims) => {
                debug!(user_id = %claims.user_id, "Verified bearer token");
                Ok(Some(Identity {
                    user_id: claims.user_id,
                    username: claims.username,
                    email: claims.email,
                }))
            }
            Err(e) => {
                warn!(mode = ?mode, "Rejected bearer token: {}", e);
                Err(e)
            }
        }
    }

    /// Resolves a header that must carry a valid identity.
    pub fn require(&self, authorization: Option<&str>) -> Result<Identity> {
        self.resolve(authorization, AuthMode::Required)?
            .ok_or_else(|| EurekaError::unauthorized("Access token required"))
    }

    /// Resolves a header that may be absent.
    pub fn optional(&self, authorization: Option<&str>) -> Result<Option<Identity>> {
        self.resolve(authorization, AuthMode::Optional)
    }
}

/// Extracts the token from a `Bearer <token>` header, ignoring scheme case.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}
