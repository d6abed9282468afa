//! Read-shaped values returned to clients.
//!
//! Views join a stored row with its author's display fields and any computed
//! counts. Author fields are optional: a row whose author is gone still
//! renders, with the author fields set to null.

use super::types::{Answer, Comment, ParentType, Question, QuestionStatus, Theme, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author display fields joined onto authored rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthorInfo {
    pub fn from_user(user: Option<&User>) -> Self {
        match user {
            Some(user) => Self {
                username: Some(user.username.clone()),
                display_name: Some(user.display_name.clone()),
                avatar_url: user.avatar_url.clone(),
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub theme_id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub author: AuthorInfo,
    pub theme_title: Option<String>,
    pub theme_category: Option<String>,
    pub answer_count: usize,
}

impl QuestionView {
    pub fn new(
        question: Question,
        author: AuthorInfo,
        theme: Option<&Theme>,
        answer_count: usize,
    ) -> Self {
        Self {
            id: question.id,
            theme_id: question.theme_id,
            user_id: question.user_id,
            title: question.title,
            content: question.content,
            tags: question.tags,
            status: question.status,
            created_at: question.created_at,
            updated_at: question.updated_at,
            author,
            theme_title: theme.map(|t| t.title.clone()),
            theme_category: theme.and_then(|t| t.category.clone()),
            answer_count,
        }
    }
}

/// A question with its answers, selected first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: QuestionView,
    pub answers: Vec<AnswerView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerView {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub content: String,
    pub source_info: Option<String>,
    pub is_selected: bool,
    pub upvotes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub author: AuthorInfo,
}

impl AnswerView {
    pub fn new(answer: Answer, author: AuthorInfo) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            user_id: answer.user_id,
            content: answer.content,
            source_info: answer.source_info,
            is_selected: answer.is_selected,
            upvotes: answer.upvotes,
            created_at: answer.created_at,
            updated_at: answer.updated_at,
            author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub parent_type: ParentType,
    pub parent_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub author: AuthorInfo,
}

impl CommentView {
    pub fn new(comment: Comment, author: AuthorInfo) -> Self {
        Self {
            id: comment.id,
            parent_type: comment.parent.parent_type(),
            parent_id: comment.parent.id().to_string(),
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
            author,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub creator_username: Option<String>,
    pub creator_name: Option<String>,
    pub question_count: usize,
}

impl ThemeView {
    pub fn new(theme: Theme, creator: Option<&User>, question_count: usize) -> Self {
        Self {
            id: theme.id,
            title: theme.title,
            description: theme.description,
            category: theme.category,
            created_by: theme.created_by,
            created_at: theme.created_at,
            creator_username: creator.map(|u| u.username.clone()),
            creator_name: creator.map(|u| u.display_name.clone()),
            question_count,
        }
    }
}

/// A theme with its questions, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeDetail {
    #[serde(flatten)]
    pub theme: ThemeView,
    pub questions: Vec<QuestionView>,
}

/// A user as other users see them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub age_group: Option<String>,
    pub user_type: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            bio: user.bio,
            age_group: user.age_group,
            user_type: user.user_type,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub question_count: usize,
    pub answer_count: usize,
    pub total_upvotes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub stats: UserStats,
    #[serde(rename = "recentQuestions")]
    pub recent_questions: Vec<Question>,
    #[serde(rename = "recentAnswers")]
    pub recent_answers: Vec<Answer>,
}

/// Account summary returned alongside a freshly issued token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub age_group: Option<String>,
    pub user_type: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            age_group: user.age_group.clone(),
            user_type: user.user_type.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: SessionUser,
}
