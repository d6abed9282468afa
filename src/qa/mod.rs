//! The question and answer service.
//!
//! This module contains:
//! - Entity types and the polymorphic comment parent ([`types`])
//! - RocksDB persistence with atomic multi-key writes ([`storage`])
//! - The question lifecycle, answer selection and voting ([`resolution`])
//! - Flat comment threads on questions and answers ([`comments`])
//! - Listings and detail views with computed counts ([`query`])
//! - Themes ([`themes`]) and accounts ([`accounts`])
//!
//! ## Example
//!
//! ```ignore
//! use eureka::qa::{QaStorage, ResolutionEngine, NewQuestion};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(QaStorage::new("eureka_data")?);
//! let engine = ResolutionEngine::new(storage.clone());
//! let question = engine.create_question(&identity, NewQuestion {
//!     title: Some("Why is the sky blue?".into()),
//!     content: Some("Asking for a friend".into()),
//!     ..Default::default()
//! })?;
//! ```

pub mod accounts;
pub mod comments;
pub mod query;
pub mod resolution;
pub mod storage;
pub mod themes;
pub mod types;
pub mod views;

pub use accounts::{AccountService, Credentials, Registration};
pub use comments::{CommentEngine, NewComment};
pub use query::{display_order, QueryService, PROFILE_RECENT_LIMIT};
pub use resolution::{AnswerUpdate, NewAnswer, NewQuestion, QuestionUpdate, ResolutionEngine};
pub use storage::{QaStorage, QuestionFilter, DEFAULT_DATA_DIR};
pub use themes::{NewTheme, ThemeCatalog};
pub use types::{
    new_id, Answer, Comment, ParentRef, ParentType, Question, QuestionStatus, Theme, User,
};
pub use views::{
    AnswerView, AuthResponse, AuthorInfo, CommentView, ProfileView, PublicUser, QuestionDetail,
    QuestionView, SessionUser, ThemeDetail, ThemeView, UserStats,
};
