//! Registration and login.
//!
//! Both return a fresh bearer token together with the account summary.

use super::storage::QaStorage;
use super::types::{new_id, User};
use super::views::{AuthResponse, SessionUser};
use crate::auth::{hash_password, verify_dummy_password, verify_password, TokenSigner};
use crate::error::{EurekaError, Result};
use crate::validation::Validator;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default, alias = "ageGroup")]
    pub age_group: Option<String>,
    #[serde(default, alias = "userType")]
    pub user_type: Option<String>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AccountService {
    storage: Arc<QaStorage>,
    signer: TokenSigner,
}

impl AccountService {
    pub fn new(storage: Arc<QaStorage>, signer: TokenSigner) -> Self {
        Self { storage, signer }
    }

    #[instrument(skip(self, input))]
    pub fn register(&self, input: Registration) -> Result<AuthResponse> {
        const MISSING: &str = "Username, email, and password are required";
        let username = Validator::require(input.username.as_deref(), MISSING)?;
        let email = Validator::require(input.email.as_deref(), MISSING)?;
        let password = Validator::require(input.password.as_deref(), MISSING)?;
        Validator::validate_username(username)?;

        let display_name = input
            .display_name
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(username);
        Validator::validate_display_name(display_name)?;

        let user = User {
            id: new_id(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            display_name: display_name.to_string(),
            bio: None,
            age_group: input.age_group,
            user_type: input.user_type,
            avatar_url: None,
            created_at: self.storage.next_timestamp(),
        };
        self.storage.insert_user(&user)?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.session("User created successfully", &user)
    }

    #[instrument(skip(self, input))]
    pub fn login(&self, input: Credentials) -> Result<AuthResponse> {
        const MISSING: &str = "Email and password are required";
        let email = Validator::require(input.email.as_deref(), MISSING)?;
        let password = Validator::require(input.password.as_deref(), MISSING)?;

        let verified = match self.storage.find_user_by_email(email)? {
            Some(user) => verify_password(password, &user.password_hash).then_some(user),
            None => {
                verify_dummy_password(password);
                None
            }
        };
        let Some(user) = verified else {
            warn!("Login rejected");
            return Err(EurekaError::unauthorized("Invalid credentials"));
        };

        info!(user_id = %user.id, "User logged in");
        self.session("Login successful", &user)
    }

    fn session(&self, message: &str, user: &User) -> Result<AuthResponse> {
        let token = self.signer.issue(&user.id, &user.username, &user.email)?;
        Ok(AuthResponse {
            message: message.to_string(),
            token,
            user: SessionUser::from(user),
        })
    }
}
