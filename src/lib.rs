//! # Eureka - community questions and answers
//!
//! Users group discussion under themes, post questions, submit competing
//! answers and attach flat comment threads to either a question or an answer.
//!
//! ## Core rules
//!
//! - A question is `open` until its owner selects an answer, then `answered`
//! - At most one answer per question is selected at any time
//! - Each upvote adds exactly one vote
//! - A comment's parent must exist in the collection its type names
//! - Only authors edit their answers and comments; only question owners select
//!
//! ## Layout
//!
//! - [`auth`]: bearer tokens, the identity guard and password hashing
//! - [`storage`]: RocksDB handle with atomic write batches
//! - [`qa`]: entities, persistence and the service engines
//! - [`api`]: axum router, extractors and error mapping
//!
//! ## Example
//!
//! ```rust,no_run
//! use eureka::api::{build_router, AppState};
//! use eureka::auth::TokenSigner;
//! use eureka::qa::QaStorage;
//! use std::sync::Arc;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = Arc::new(QaStorage::new("eureka_data")?);
//! let signer = TokenSigner::new(
//!     "a-server-secret-of-at-least-32-bytes!",
//!     chrono::Duration::days(7),
//! )?;
//! let app = build_router(AppState::new(storage, signer));
//! # let _ = app;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod qa;
pub mod storage;
pub mod validation;

pub use error::{EurekaError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
