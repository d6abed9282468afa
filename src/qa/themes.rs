//! Theme creation.

use super::query::Lookup;
use super::storage::QaStorage;
use super::types::{new_id, Theme};
use super::views::ThemeView;
use crate::auth::Identity;
use crate::error::Result;
use crate::validation::Validator;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Input for creating a theme.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTheme {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    storage: Arc<QaStorage>,
}

impl ThemeCatalog {
    pub fn new(storage: Arc<QaStorage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self, input), fields(user_id = %creator.user_id))]
    pub fn create_theme(&self, creator: &Identity, input: NewTheme) -> Result<ThemeView> {
        let title = Validator::require(input.title.as_deref(), "Title is required")?;
        Validator::validate_title(title)?;
        if let Some(description) = &input.description {
            Validator::validate_description(description)?;
        }

        let theme = Theme {
            id: new_id(),
            title: title.to_string(),
            description: input.description,
            category: input.category.filter(|c| !c.trim().is_empty()),
            created_by: creator.user_id.clone(),
            created_at: self.storage.next_timestamp(),
        };
        self.storage.insert_theme(&theme)?;

        info!(theme_id = %theme.id, "Theme created");
        Lookup::new(&self.storage).theme_view(theme)
    }
}
