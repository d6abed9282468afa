//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so the salt and parameters travel with
//! the hash and verification needs nothing else.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Version,
};
use rand::rngs::OsRng;

use crate::error::{EurekaError, Result};

/// Parameters for Argon2id password hashing
const ARGON2_PARAMS: argon2::Params = match argon2::Params::new(
    19 * 1024, // 19 MiB memory cost
    2,         // 2 iterations
    1,         // 1 thread
    Some(32),  // 32-byte output length
) {
    Ok(params) => params,
    Err(_) => panic!("Invalid Argon2 parameters"),
};

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, ARGON2_PARAMS)
}

/// Hashes a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(EurekaError::bad_request("Password cannot be empty"));
    }

    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| EurekaError::internal(format!("Failed to hash password: {}", e)))
}

/// Checks a password against a stored PHC string.
///
/// A stored hash that cannot be parsed counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => hasher()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Well-formed Argon2id hash under [`ARGON2_PARAMS`] that no password matches.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$AimXKoSpHuxCi9cJ7mBIyg$GjLvTisO8etLfB8iYSYktGLRCiGAUxoYVNi10EA9cf8";

/// Pays the full verification cost against [`DUMMY_HASH`]. Always false.
///
/// Used when there is no stored hash to check, so an unknown account takes
/// as long to reject as a wrong password.
pub fn verify_dummy_password(password: &str) -> bool {
    verify_password(password, DUMMY_HASH)
}
