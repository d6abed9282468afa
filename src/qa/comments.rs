//! Comment threads attached to questions and answers.
//!
//! Threads are flat and chronological. The parent is resolved into a
//! [`ParentRef`] at the boundary and checked against the collection its type
//! names before anything is stored.

use super::query::Lookup;
use super::storage::QaStorage;
use super::types::{new_id, Comment, ParentRef};
use super::views::CommentView;
use crate::auth::Identity;
use crate::error::{EurekaError, Result};
use crate::validation::Validator;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Input for creating a comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    #[serde(default, alias = "parentType")]
    pub parent_type: Option<String>,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentEngine {
    storage: Arc<QaStorage>,
}

impl CommentEngine {
    pub fn new(storage: Arc<QaStorage>) -> Self {
        Self { storage }
    }

    /// Comments on one parent, oldest first.
    #[instrument(skip(self))]
    pub fn list_comments(
        &self,
        parent_type: Option<&str>,
        parent_id: Option<&str>,
    ) -> Result<Vec<CommentView>> {
        const MISSING: &str = "parent_type and parent_id are required";
        let parent_type = Validator::require(parent_type, MISSING)?;
        let parent_id = Validator::require(parent_id, MISSING)?;
        let parent = ParentRef::parse(parent_type, parent_id)?;

        let comments = self.storage.comments_for(&parent)?;
        let mut lookup = Lookup::new(&self.storage);
        comments
            .into_iter()
            .map(|c| {
                let author = lookup.author(&c.user_id)?;
                Ok(CommentView::new(c, author))
            })
            .collect()
    }

    #[instrument(skip(self, input), fields(user_id = %author.user_id))]
    pub fn create_comment(&self, author: &Identity, input: NewComment) -> Result<CommentView> {
        const MISSING: &str = "parent_type, parent_id, and content are required";
        let parent_type = Validator::require(input.parent_type.as_deref(), MISSING)?;
        let parent_id = Validator::require(input.parent_id.as_deref(), MISSING)?;
        let content = input.content.as_deref().unwrap_or_default();
        Validator::validate_comment(content)?;
        let parent = ParentRef::parse(parent_type, parent_id)?;

        let comment = Comment {
            id: new_id(),
            parent,
            user_id: author.user_id.clone(),
            content: content.to_string(),
            created_at: self.storage.next_timestamp(),
        };
        self.storage.insert_comment(&comment)?;

        info!(comment_id = %comment.id, parent = %comment.parent, "Comment created");
        self.view(comment)
    }

    #[instrument(skip(self, content), fields(user_id = %actor.user_id))]
    pub fn update_comment(
        &self,
        actor: &Identity,
        comment_id: &str,
        content: Option<&str>,
    ) -> Result<CommentView> {
        let content = Validator::require(content, "Content is required")?;
        Validator::validate_comment(content)?;

        let comment = self.storage.update_comment(comment_id, |comment| {
            Self::check_author(actor, comment, "update")?;
            comment.content = content.to_string();
            Ok(())
        })?;

        info!(comment_id, "Comment updated");
        self.view(comment)
    }

    /// Permanently removes the caller's comment.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub fn delete_comment(&self, actor: &Identity, comment_id: &str) -> Result<()> {
        self.storage
            .delete_comment(comment_id, |comment| Self::check_author(actor, comment, "delete"))?;

        info!(comment_id, "Comment deleted");
        Ok(())
    }

    fn check_author(actor: &Identity, comment: &Comment, action: &str) -> Result<()> {
        if comment.user_id != actor.user_id {
            warn!(comment_id = %comment.id, action, "Rejected: caller is not the comment author");
            return Err(EurekaError::forbidden(format!(
                "Not authorized to {} this comment",
                action
            )));
        }
        Ok(())
    }

    fn view(&self, comment: Comment) -> Result<CommentView> {
        let author = Lookup::new(&self.storage).author(&comment.user_id)?;
        Ok(CommentView::new(comment, author))
    }
}
