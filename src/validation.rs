//! Input validation and content size limits for Eureka
//!
//! Every limit is checked before anything is written, and every violation is
//! reported as a `BadRequest`.

use crate::error::{EurekaError, Result};

/// Maximum allowed title length in characters (questions and themes)
pub const MAX_TITLE_LENGTH: usize = 512;

/// Maximum allowed question or answer body size (100KB)
pub const MAX_BODY_SIZE: usize = 100 * 1024;

/// Maximum allowed comment size (10KB)
pub const MAX_COMMENT_SIZE: usize = 10 * 1024;

/// Maximum allowed number of tags on a question
pub const MAX_TAGS: usize = 10;

/// Maximum allowed length of a single tag in characters
pub const MAX_TAG_LENGTH: usize = 64;

/// Maximum allowed username length in characters
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Maximum allowed display name length in characters
pub const MAX_DISPLAY_NAME_LENGTH: usize = 128;

/// Maximum allowed theme description size (10KB)
pub const MAX_DESCRIPTION_SIZE: usize = 10 * 1024;

/// Validation functions for user input
pub struct Validator;

impl Validator {
    /// Returns the value if it is present and not blank.
    pub fn require<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(EurekaError::bad_request(message)),
        }
    }

    /// Validate a question or theme title
    pub fn validate_title(title: &str) -> Result<()> {
        let length = title.chars().count();
        if length > MAX_TITLE_LENGTH {
            return Err(EurekaError::bad_request(format!(
                "Title too long: {} characters exceeds maximum of {}",
                length, MAX_TITLE_LENGTH
            )));
        }
        Ok(())
    }

    /// Validate a question or answer body
    pub fn validate_body(content: &str) -> Result<()> {
        if content.len() > MAX_BODY_SIZE {
            return Err(EurekaError::bad_request(format!(
                "Content too large: {} bytes exceeds maximum of {} bytes",
                content.len(),
                MAX_BODY_SIZE
            )));
        }
        Ok(())
    }

    /// Validate comment content
    pub fn validate_comment(content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(EurekaError::bad_request("Content cannot be empty"));
        }
        if content.len() > MAX_COMMENT_SIZE {
            return Err(EurekaError::bad_request(format!(
                "Comment too large: {} bytes exceeds maximum of {} bytes",
                content.len(),
                MAX_COMMENT_SIZE
            )));
        }
        Ok(())
    }

    /// Validate a theme description
    pub fn validate_description(description: &str) -> Result<()> {
        if description.len() > MAX_DESCRIPTION_SIZE {
            return Err(EurekaError::bad_request(format!(
                "Description too large: {} bytes exceeds maximum of {} bytes",
                description.len(),
                MAX_DESCRIPTION_SIZE
            )));
        }
        Ok(())
    }

    /// Validate a question's tag list
    pub fn validate_tags(tags: &[String]) -> Result<()> {
        if tags.len() > MAX_TAGS {
            return Err(EurekaError::bad_request(format!(
                "Too many tags: {} exceeds maximum of {}",
                tags.len(),
                MAX_TAGS
            )));
        }
        for tag in tags {
            if tag.trim().is_empty() {
                return Err(EurekaError::bad_request("Tags cannot be empty"));
            }
            if tag.chars().count() > MAX_TAG_LENGTH {
                return Err(EurekaError::bad_request(format!(
                    "Tag too long: maximum is {} characters",
                    MAX_TAG_LENGTH
                )));
            }
        }
        Ok(())
    }

    /// Validate a username
    pub fn validate_username(username: &str) -> Result<()> {
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(EurekaError::bad_request(format!(
                "Username too long: maximum is {} characters",
                MAX_USERNAME_LENGTH
            )));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(EurekaError::bad_request(
                "Username cannot contain whitespace",
            ));
        }
        Ok(())
    }

    /// Validate a display name
    pub fn validate_display_name(display_name: &str) -> Result<()> {
        if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(EurekaError::bad_request(format!(
                "Display name too long: maximum is {} characters",
                MAX_DISPLAY_NAME_LENGTH
            )));
        }
        Ok(())
    }
}
