//! Stored entity types.
//!
//! These are the rows the persistence layer keeps. Read-shaped values with
//! joined author fields and computed counts live in `views`.

use crate::error::{EurekaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generates a fresh opaque identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Lifecycle state of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    /// No answer has been selected yet.
    Open,
    /// Exactly one answer is selected.
    Answered,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Open => "open",
            QuestionStatus::Answered => "answered",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionStatus {
    type Err = EurekaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(QuestionStatus::Open),
            "answered" => Ok(QuestionStatus::Answered),
            other => Err(EurekaError::bad_request(format!(
                "Unknown question status '{}'",
                other
            ))),
        }
    }
}

/// Kind of entity a comment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentType {
    Question,
    Answer,
}

impl ParentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParentType::Question => "question",
            ParentType::Answer => "answer",
        }
    }
}

impl fmt::Display for ParentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentType {
    type Err = EurekaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "question" => Ok(ParentType::Question),
            "answer" => Ok(ParentType::Answer),
            other => Err(EurekaError::bad_request(format!(
                "parent_type must be 'question' or 'answer', got '{}'",
                other
            ))),
        }
    }
}

/// The entity a comment is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRef {
    Question(String),
    Answer(String),
}

impl ParentRef {
    pub fn new(parent_type: ParentType, id: impl Into<String>) -> Self {
        match parent_type {
            ParentType::Question => ParentRef::Question(id.into()),
            ParentType::Answer => ParentRef::Answer(id.into()),
        }
    }

    /// Parses the `(parent_type, parent_id)` pair used on the wire.
    pub fn parse(parent_type: &str, parent_id: &str) -> Result<Self> {
        if parent_id.trim().is_empty() {
            return Err(EurekaError::bad_request("parent_id is required"));
        }
        Ok(Self::new(parent_type.parse()?, parent_id))
    }

    pub fn parent_type(&self) -> ParentType {
        match self {
            ParentRef::Question(_) => ParentType::Question,
            ParentRef::Answer(_) => ParentType::Answer,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ParentRef::Question(id) | ParentRef::Answer(id) => id,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent_type(), self.id())
    }
}

/// A registered account. The password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub age_group: Option<String>,
    pub user_type: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A topical grouping of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub theme_id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub content: String,
    pub source_info: Option<String>,
    pub is_selected: bool,
    pub upvotes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub parent: ParentRef,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
