//! Authentication: bearer tokens, the identity guard and password hashing.

pub mod guard;
pub mod password;
pub mod token;

pub use guard::{AuthMode, Identity, IdentityGuard};
pub use password::{hash_password, verify_dummy_password, verify_password};
pub use token::{Claims, TokenSigner, DEFAULT_TOKEN_TTL_DAYS, MIN_SECRET_LEN};
