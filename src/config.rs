//! Server configuration from command-line flags with environment fallbacks.
//!
//! | Flag               | Environment             | Default          |
//! |--------------------|-------------------------|------------------|
//! | `--bind`           | `EUREKA_BIND`           | `127.0.0.1:5000` |
//! | `--data-dir`       | `EUREKA_DATA_DIR`       | `eureka_data`    |
//! | `--token-secret`   | `EUREKA_TOKEN_SECRET`   | required         |
//! | `--token-ttl-days` | `EUREKA_TOKEN_TTL_DAYS` | `7` (max 3650)   |

use crate::auth::{TokenSigner, DEFAULT_TOKEN_TTL_DAYS, MIN_SECRET_LEN};
use crate::error::{EurekaError, Result};
use crate::qa::DEFAULT_DATA_DIR;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

/// Longest accepted token lifetime, ten years.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub token_secret: String,
    pub token_ttl_days: i64,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("data_dir", &self.data_dir)
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

impl ServerConfig {
    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Builds a configuration from explicit arguments and an environment lookup.
    ///
    /// A flag wins over its environment variable.
    pub fn from_sources<F>(args: &[String], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |flag: &str, var: &str| flag_value(args, flag).or_else(|| env(var));

        let bind = lookup("--bind", "EUREKA_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .map_err(|e| EurekaError::config(format!("Invalid bind address '{}': {}", bind, e)))?;

        let data_dir = lookup("--data-dir", "EUREKA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let token_secret = lookup("--token-secret", "EUREKA_TOKEN_SECRET").ok_or_else(|| {
            EurekaError::config("A token secret is required (--token-secret or EUREKA_TOKEN_SECRET)")
        })?;
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(EurekaError::config(format!(
                "Token secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        let token_ttl_days = match lookup("--token-ttl-days", "EUREKA_TOKEN_TTL_DAYS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=MAX_TOKEN_TTL_DAYS).contains(days))
                .ok_or_else(|| {
                    EurekaError::config(format!(
                        "Invalid token lifetime '{}' (1 to {} days)",
                        raw, MAX_TOKEN_TTL_DAYS
                    ))
                })?,
            None => DEFAULT_TOKEN_TTL_DAYS,
        };

        Ok(Self {
            bind_addr,
            data_dir,
            token_secret,
            token_ttl_days,
        })
    }

    /// Builds the token signer described by this configuration.
    pub fn token_signer(&self) -> Result<TokenSigner> {
        let ttl = chrono::Duration::try_days(self.token_ttl_days).ok_or_else(|| {
            EurekaError::config(format!("Invalid token lifetime '{}'", self.token_ttl_days))
        })?;
        TokenSigner::new(self.token_secret.as_bytes(), ttl)
    }
}

/// Value following `flag`, if the flag is present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}
