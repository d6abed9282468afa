//! Question and answer persistence using RocksDB.
//!
//! ## Storage Layout
//!
//! Entity column families, keyed by id, values are bincode rows:
//! - `users`, `themes`, `questions`, `answers`, `comments`
//!
//! Index column families. Values are always the referenced entity id:
//! - `idx_usernames`: `{username}` (unique)
//! - `idx_emails`: `{email}` (unique)
//! - `idx_themes`: `{inverted_ts}{theme_id}` (newest first)
//! - `idx_questions`: `{inverted_ts}{question_id}` (newest first)
//! - `idx_theme_questions`: `{theme_id}:{inverted_ts}{question_id}`
//! - `idx_user_questions`: `{user_id}:{inverted_ts}{question_id}`
//! - `idx_question_answers`: `{question_id}:{ts}{answer_id}` (oldest first)
//! - `idx_user_answers`: `{user_id}:{inverted_ts}{answer_id}`
//! - `idx_comments`: `{parent_type}:{parent_id}:{ts}{comment_id}` (oldest first)
//!
//! ## Writes
//!
//! Every mutation that touches more than one key is committed as a single
//! `WriteBatch`. Mutations that read before they write (uniqueness checks,
//! parent existence checks, counters, answer selection) run while holding the
//! store's write lock, so two of them never interleave.

use super::types::{Answer, Comment, ParentRef, ParentType, Question, QuestionStatus, Theme, User};
use crate::error::{EurekaError, Result};
use crate::storage::{composite_key, newest_first, oldest_first, RocksDbConfig, RocksDbHandle};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Default data directory name.
pub const DEFAULT_DATA_DIR: &str = "eureka_data";

/// Database subdirectory.
const DB_DIR: &str = "qa_db";

/// Column family names.
const CF_USERS: &str = "users";
const CF_THEMES: &str = "themes";
const CF_QUESTIONS: &str = "questions";
const CF_ANSWERS: &str = "answers";
const CF_COMMENTS: &str = "comments";

const CF_IDX_USERNAMES: &str = "idx_usernames";
const CF_IDX_EMAILS: &str = "idx_emails";
const CF_IDX_THEMES: &str = "idx_themes";
const CF_IDX_QUESTIONS: &str = "idx_questions";
const CF_IDX_THEME_QUESTIONS: &str = "idx_theme_questions";
const CF_IDX_USER_QUESTIONS: &str = "idx_user_questions";
const CF_IDX_QUESTION_ANSWERS: &str = "idx_question_answers";
const CF_IDX_USER_ANSWERS: &str = "idx_user_answers";
const CF_IDX_COMMENTS: &str = "idx_comments";

const COLUMN_FAMILIES: &[&str] = &[
    CF_USERS,
    CF_THEMES,
    CF_QUESTIONS,
    CF_ANSWERS,
    CF_COMMENTS,
    CF_IDX_USERNAMES,
    CF_IDX_EMAILS,
    CF_IDX_THEMES,
    CF_IDX_QUESTIONS,
    CF_IDX_THEME_QUESTIONS,
    CF_IDX_USER_QUESTIONS,
    CF_IDX_QUESTION_ANSWERS,
    CF_IDX_USER_ANSWERS,
    CF_IDX_COMMENTS,
];

/// Filter for question listings. Every set field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub theme_id: Option<String>,
    pub status: Option<QuestionStatus>,
    pub user_id: Option<String>,
}

impl QuestionFilter {
    fn matches(&self, question: &Question) -> bool {
        self.theme_id
            .as_ref()
            .map_or(true, |t| question.theme_id.as_ref() == Some(t))
            && self.status.map_or(true, |s| question.status == s)
            && self.user_id.as_ref().map_or(true, |u| &question.user_id == u)
    }
}

/// RocksDB-backed storage for users, themes, questions, answers and comments.
pub struct QaStorage {
    db: RocksDbHandle,
    write_lock: Mutex<()>,
    last_timestamp_ms: AtomicU64,
}

impl QaStorage {
    /// Opens storage in a data directory with default RocksDB tuning.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(data_dir, &RocksDbConfig::default())
    }

    /// Opens storage in a data directory with explicit RocksDB tuning.
    pub fn open(data_dir: impl AsRef<Path>, config: &RocksDbConfig) -> Result<Self> {
        let db_path = data_dir.as_ref().join(DB_DIR);
        let db = RocksDbHandle::open(&db_path, config, COLUMN_FAMILIES)?;
        info!("Opened question store at {:?}", db_path);

        Ok(Self {
            db,
            write_lock: Mutex::new(()),
            last_timestamp_ms: AtomicU64::new(0),
        })
    }

    /// Acquires the write lock, recovering from poison if necessary.
    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|poisoned| {
            error!("Write lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns a timestamp strictly later than any previously handed out.
    ///
    /// Index keys embed millisecond timestamps, so two rows created within
    /// the same millisecond would otherwise have no defined order.
    pub fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let previous = self
            .last_timestamp_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        let millis = now.max(previous + 1);
        DateTime::<Utc>::from_timestamp_millis(millis as i64).unwrap_or_else(Utc::now)
    }

    // ========================================================================
    // Key Helpers
    // ========================================================================

    fn millis(timestamp: &DateTime<Utc>) -> u64 {
        timestamp.timestamp_millis().max(0) as u64
    }

    /// `{inverted_ts}{id}`
    fn newest_key(timestamp: &DateTime<Utc>, id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(8 + id.len());
        key.extend_from_slice(&newest_first(Self::millis(timestamp)));
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// `{owner}:{inverted_ts}{id}`
    fn owned_newest_key(owner: &str, timestamp: &DateTime<Utc>, id: &str) -> Vec<u8> {
        composite_key(owner.as_bytes(), &Self::newest_key(timestamp, id))
    }

    /// `{owner}:{ts}{id}`
    fn owned_oldest_key(owner: &str, timestamp: &DateTime<Utc>, id: &str) -> Vec<u8> {
        let mut suffix = Vec::with_capacity(8 + id.len());
        suffix.extend_from_slice(&oldest_first(Self::millis(timestamp)));
        suffix.extend_from_slice(id.as_bytes());
        composite_key(owner.as_bytes(), &suffix)
    }

    /// `{owner}:` prefix for scanning an owner's index range.
    fn owner_prefix(owner: &str) -> Vec<u8> {
        composite_key(owner.as_bytes(), &[])
    }

    fn comment_owner(parent: &ParentRef) -> String {
        format!("{}:{}", parent.parent_type(), parent.id())
    }

    /// Loads the rows referenced by a list of ids, skipping dangling index entries.
    fn load_many<T: DeserializeOwned>(&self, cf_name: &str, ids: &[String]) -> Result<Vec<T>> {
        let mut rows = Vec::with_capacity(ids.len());
        for id in ids {
            match self.db.get::<T>(cf_name, id.as_bytes())? {
                Some(row) => rows.push(row),
                None => warn!(cf = cf_name, id = %id, "Index points at a missing row"),
            }
        }
        Ok(rows)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Inserts a user, enforcing unique usernames and emails.
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock_writes();

        if self.db.exists(CF_IDX_USERNAMES, user.username.as_bytes())?
            || self.db.exists(CF_IDX_EMAILS, user.email.as_bytes())?
        {
            return Err(EurekaError::conflict("Username or email already exists"));
        }

        let mut batch = self.db.batch();
        batch.put(CF_USERS, user.id.as_bytes(), user)?;
        batch.put_raw(CF_IDX_USERNAMES, user.username.as_bytes(), user.id.as_bytes())?;
        batch.put_raw(CF_IDX_EMAILS, user.email.as_bytes(), user.id.as_bytes())?;
        batch.commit()?;

        debug!(user_id = %user.id, "Stored user");
        Ok(())
    }

    pub fn load_user(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get(CF_USERS, user_id.as_bytes())
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.db.get_raw(CF_IDX_EMAILS, email.as_bytes())? {
            Some(id) => self.load_user(&String::from_utf8_lossy(&id)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Themes
    // ========================================================================

    pub fn insert_theme(&self, theme: &Theme) -> Result<()> {
        let mut batch = self.db.batch();
        batch.put(CF_THEMES, theme.id.as_bytes(), theme)?;
        batch.put_raw(
            CF_IDX_THEMES,
            &Self::newest_key(&theme.created_at, &theme.id),
            theme.id.as_bytes(),
        )?;
        batch.commit()?;

        debug!(theme_id = %theme.id, "Stored theme");
        Ok(())
    }

    pub fn load_theme(&self, theme_id: &str) -> Result<Option<Theme>> {
        self.db.get(CF_THEMES, theme_id.as_bytes())
    }

    pub fn theme_exists(&self, theme_id: &str) -> Result<bool> {
        self.db.exists(CF_THEMES, theme_id.as_bytes())
    }

    /// All themes, newest first.
    pub fn list_themes(&self) -> Result<Vec<Theme>> {
        let ids = self.db.prefix_values(CF_IDX_THEMES, &[], None)?;
        self.load_many(CF_THEMES, &ids)
    }

    // ========================================================================
    // Questions
    // ========================================================================

    /// Inserts a question. A referenced theme must exist.
    pub fn insert_question(&self, question: &Question) -> Result<()> {
        let _guard = self.lock_writes();

        if let Some(theme_id) = &question.theme_id {
            if !self.theme_exists(theme_id)? {
                return Err(EurekaError::not_found("Theme not found"));
            }
        }

        let mut batch = self.db.batch();
        batch.put(CF_QUESTIONS, question.id.as_bytes(), question)?;
        batch.put_raw(
            CF_IDX_QUESTIONS,
            &Self::newest_key(&question.created_at, &question.id),
            question.id.as_bytes(),
        )?;
        if let Some(theme_id) = &question.theme_id {
            batch.put_raw(
                CF_IDX_THEME_QUESTIONS,
                &Self::owned_newest_key(theme_id, &question.created_at, &question.id),
                question.id.as_bytes(),
            )?;
        }
        batch.put_raw(
            CF_IDX_USER_QUESTIONS,
            &Self::owned_newest_key(&question.user_id, &question.created_at, &question.id),
            question.id.as_bytes(),
        )?;
        batch.commit()?;

        debug!(question_id = %question.id, "Stored question");
        Ok(())
    }

    pub fn load_question(&self, question_id: &str) -> Result<Option<Question>> {
        self.db.get(CF_QUESTIONS, question_id.as_bytes())
    }

    pub fn question_exists(&self, question_id: &str) -> Result<bool> {
        self.db.exists(CF_QUESTIONS, question_id.as_bytes())
    }

    /// Applies `apply` to a stored question and writes the result back.
    ///
    /// The read, the closure and the write all happen under the write lock.
    /// If the closure fails nothing is written.
    pub fn update_question<F>(&self, question_id: &str, apply: F) -> Result<Question>
    where
        F: FnOnce(&mut Question) -> Result<()>,
    {
        let _guard = self.lock_writes();

        let mut question = self
            .load_question(question_id)?
            .ok_or_else(|| EurekaError::not_found("Question not found"))?;
        apply(&mut question)?;
        self.db.put(CF_QUESTIONS, question.id.as_bytes(), &question)?;

        Ok(question)
    }

    /// Questions matching a filter, newest first.
    ///
    /// Uses the narrowest index the filter allows and checks every remaining
    /// condition on the loaded rows.
    pub fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>> {
        let ids = if let Some(theme_id) = &filter.theme_id {
            self.db
                .prefix_values(CF_IDX_THEME_QUESTIONS, &Self::owner_prefix(theme_id), None)?
        } else if let Some(user_id) = &filter.user_id {
            self.db
                .prefix_values(CF_IDX_USER_QUESTIONS, &Self::owner_prefix(user_id), None)?
        } else {
            self.db.prefix_values(CF_IDX_QUESTIONS, &[], None)?
        };

        let questions: Vec<Question> = self.load_many(CF_QUESTIONS, &ids)?;
        Ok(questions.into_iter().filter(|q| filter.matches(q)).collect())
    }

    /// A user's most recent questions, newest first.
    pub fn recent_questions_by_user(&self, user_id: &str, limit: usize) -> Result<Vec<Question>> {
        let ids = self.db.prefix_values(
            CF_IDX_USER_QUESTIONS,
            &Self::owner_prefix(user_id),
            Some(limit),
        )?;
        self.load_many(CF_QUESTIONS, &ids)
    }

    pub fn count_questions_by_user(&self, user_id: &str) -> Result<usize> {
        self.db
            .prefix_count(CF_IDX_USER_QUESTIONS, &Self::owner_prefix(user_id))
    }

    pub fn count_questions_in_theme(&self, theme_id: &str) -> Result<usize> {
        self.db
            .prefix_count(CF_IDX_THEME_QUESTIONS, &Self::owner_prefix(theme_id))
    }

    // ========================================================================
    // Answers
    // ========================================================================

    /// Inserts an answer. The question must exist.
    pub fn insert_answer(&self, answer: &Answer) -> Result<()> {
        let _guard = self.lock_writes();

        if !self.question_exists(&answer.question_id)? {
            return Err(EurekaError::not_found("Question not found"));
        }

        let mut batch = self.db.batch();
        batch.put(CF_ANSWERS, answer.id.as_bytes(), answer)?;
        batch.put_raw(
            CF_IDX_QUESTION_ANSWERS,
            &Self::owned_oldest_key(&answer.question_id, &answer.created_at, &answer.id),
            answer.id.as_bytes(),
        )?;
        batch.put_raw(
            CF_IDX_USER_ANSWERS,
            &Self::owned_newest_key(&answer.user_id, &answer.created_at, &answer.id),
            answer.id.as_bytes(),
        )?;
        batch.commit()?;

        debug!(answer_id = %answer.id, question_id = %answer.question_id, "Stored answer");
        Ok(())
    }

    pub fn load_answer(&self, answer_id: &str) -> Result<Option<Answer>> {
        self.db.get(CF_ANSWERS, answer_id.as_bytes())
    }

    pub fn answer_exists(&self, answer_id: &str) -> Result<bool> {
        self.db.exists(CF_ANSWERS, answer_id.as_bytes())
    }

    /// All answers to a question in creation order.
    pub fn answers_for_question(&self, question_id: &str) -> Result<Vec<Answer>> {
        let ids = self.db.prefix_values(
            CF_IDX_QUESTION_ANSWERS,
            &Self::owner_prefix(question_id),
            None,
        )?;
        self.load_many(CF_ANSWERS, &ids)
    }

    /// Number of answers referencing a question, counted from the index.
    pub fn count_answers(&self, question_id: &str) -> Result<usize> {
        self.db
            .prefix_count(CF_IDX_QUESTION_ANSWERS, &Self::owner_prefix(question_id))
    }

    /// A user's answers, newest first. `None` returns all of them.
    pub fn answers_by_user(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<Answer>> {
        let ids =
            self.db
                .prefix_values(CF_IDX_USER_ANSWERS, &Self::owner_prefix(user_id), limit)?;
        self.load_many(CF_ANSWERS, &ids)
    }

    /// Applies `apply` to a stored answer and writes it back under the write lock.
    pub fn update_answer<F>(&self, answer_id: &str, apply: F) -> Result<Answer>
    where
        F: FnOnce(&mut Answer) -> Result<()>,
    {
        let _guard = self.lock_writes();

        let mut answer = self
            .load_answer(answer_id)?
            .ok_or_else(|| EurekaError::not_found("Answer not found"))?;
        apply(&mut answer)?;
        self.db.put(CF_ANSWERS, answer.id.as_bytes(), &answer)?;

        Ok(answer)
    }

    /// Adds exactly one vote to an answer.
    pub fn increment_upvotes(&self, answer_id: &str) -> Result<Answer> {
        self.update_answer(answer_id, |answer| {
            answer.upvotes = answer.upvotes.saturating_add(1);
            Ok(())
        })
    }

    /// Makes `answer_id` the only selected answer of `question_id` and marks
    /// the question answered.
    ///
    /// Clearing the previous selection, setting the new one and updating the
    /// question status are committed as one batch, so no reader ever sees two
    /// selected answers or a half-applied selection.
    pub fn reassign_selected_answer(&self, question_id: &str, answer_id: &str) -> Result<Answer> {
        let _guard = self.lock_writes();

        let mut target = self
            .load_answer(answer_id)?
            .ok_or_else(|| EurekaError::not_found("Answer not found"))?;
        if target.question_id != question_id {
            return Err(EurekaError::bad_request(
                "Answer does not belong to this question",
            ));
        }
        let mut question = self
            .load_question(question_id)?
            .ok_or_else(|| EurekaError::not_found("Question not found"))?;

        let mut batch = self.db.batch();
        let mut cleared = 0usize;
        for mut other in self.answers_for_question(question_id)? {
            if other.id != target.id && other.is_selected {
                other.is_selected = false;
                batch.put(CF_ANSWERS, other.id.as_bytes(), &other)?;
                cleared += 1;
            }
        }

        target.is_selected = true;
        batch.put(CF_ANSWERS, target.id.as_bytes(), &target)?;

        question.status = QuestionStatus::Answered;
        question.updated_at = self.next_timestamp();
        batch.put(CF_QUESTIONS, question.id.as_bytes(), &question)?;

        batch.commit()?;

        debug!(
            question_id,
            answer_id,
            cleared_selections = cleared,
            "Reassigned selected answer"
        );
        Ok(target)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    pub fn parent_exists(&self, parent: &ParentRef) -> Result<bool> {
        match parent.parent_type() {
            ParentType::Question => self.question_exists(parent.id()),
            ParentType::Answer => self.answer_exists(parent.id()),
        }
    }

    /// Inserts a comment. The parent must exist in the collection its type names.
    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let _guard = self.lock_writes();

        if !self.parent_exists(&comment.parent)? {
            return Err(EurekaError::not_found("Parent object not found"));
        }

        let mut batch = self.db.batch();
        batch.put(CF_COMMENTS, comment.id.as_bytes(), comment)?;
        batch.put_raw(
            CF_IDX_COMMENTS,
            &Self::owned_oldest_key(
                &Self::comment_owner(&comment.parent),
                &comment.created_at,
                &comment.id,
            ),
            comment.id.as_bytes(),
        )?;
        batch.commit()?;

        debug!(comment_id = %comment.id, parent = %comment.parent, "Stored comment");
        Ok(())
    }

    pub fn load_comment(&self, comment_id: &str) -> Result<Option<Comment>> {
        self.db.get(CF_COMMENTS, comment_id.as_bytes())
    }

    /// Comments attached to a parent, oldest first.
    pub fn comments_for(&self, parent: &ParentRef) -> Result<Vec<Comment>> {
        let ids = self.db.prefix_values(
            CF_IDX_COMMENTS,
            &Self::owner_prefix(&Self::comment_owner(parent)),
            None,
        )?;
        let comments: Vec<Comment> = self.load_many(CF_COMMENTS, &ids)?;
        Ok(comments
            .into_iter()
            .filter(|c| &c.parent == parent)
            .collect())
    }

    /// Applies `apply` to a stored comment and writes it back under the write lock.
    pub fn update_comment<F>(&self, comment_id: &str, apply: F) -> Result<Comment>
    where
        F: FnOnce(&mut Comment) -> Result<()>,
    {
        let _guard = self.lock_writes();

        let mut comment = self
            .load_comment(comment_id)?
            .ok_or_else(|| EurekaError::not_found("Comment not found"))?;
        apply(&mut comment)?;
        self.db.put(CF_COMMENTS, comment.id.as_bytes(), &comment)?;

        Ok(comment)
    }

    /// Removes a comment and its index entry after `check` approves it.
    pub fn delete_comment<F>(&self, comment_id: &str, check: F) -> Result<Comment>
    where
        F: FnOnce(&Comment) -> Result<()>,
    {
        let _guard = self.lock_writes();

        let comment = self
            .load_comment(comment_id)?
            .ok_or_else(|| EurekaError::not_found("Comment not found"))?;
        check(&comment)?;

        let mut batch = self.db.batch();
        batch.delete(CF_COMMENTS, comment.id.as_bytes())?;
        batch.delete(
            CF_IDX_COMMENTS,
            &Self::owned_oldest_key(
                &Self::comment_owner(&comment.parent),
                &comment.created_at,
                &comment.id,
            ),
        )?;
        batch.commit()?;

        debug!(comment_id = %comment.id, "Deleted comment");
        Ok(comment)
    }
}

impl std::fmt::Debug for QaStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaStorage").field("db", &self.db).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qa::types::new_id;
    use tempfile::TempDir;

    fn create_test_storage() -> (QaStorage, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = QaStorage::new(temp_dir.path()).expect("Failed to open storage");
        (storage, temp_dir)
    }

    fn user(storage: &QaStorage, username: &str) -> User {
        User {
            id: new_id(),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
            display_name: username.to_string(),
            bio: None,
            age_group: None,
            user_type: None,
            avatar_url: None,
            created_at: storage.next_timestamp(),
        }
    }

    fn question(storage: &QaStorage, owner: &str, theme_id: Option<&str>) -> Question {
        let now = storage.next_timestamp();
        Question {
            id: new_id(),
            theme_id: theme_id.map(str::to_string),
            user_id: owner.to_string(),
            title: "How do tides work?".to_string(),
            content: "Explain like I'm five".to_string(),
            tags: vec!["science".to_string()],
            status: QuestionStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    fn answer(storage: &QaStorage, question_id: &str, author: &str) -> Answer {
        let now = storage.next_timestamp();
        Answer {
            id: new_id(),
            question_id: question_id.to_string(),
            user_id: author.to_string(),
            content: "The moon pulls the water".to_string(),
            source_info: None,
            is_selected: false,
            upvotes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let (storage, _temp) = create_test_storage();
        let mut last = storage.next_timestamp();
        for _ in 0..100 {
            let next = storage.next_timestamp();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn test_unique_username_and_email() {
        let (storage, _temp) = create_test_storage();
        let alice = user(&storage, "alice");
        storage.insert_user(&alice).unwrap();

        let mut same_name = user(&storage, "alice");
        same_name.email = "other@example.com".to_string();
        assert!(matches!(
            storage.insert_user(&same_name),
            Err(EurekaError::Conflict(_))
        ));

        let mut same_email = user(&storage, "alice2");
        same_email.email = alice.email.clone();
        assert!(matches!(
            storage.insert_user(&same_email),
            Err(EurekaError::Conflict(_))
        ));

        let found = storage.find_user_by_email("alice@example.com").unwrap();
        assert_eq!(found.map(|u| u.id), Some(alice.id));
    }

    #[test]
    fn test_question_with_missing_theme_rejected() {
        let (storage, _temp) = create_test_storage();
        let q = question(&storage, "u1", Some("no-such-theme"));
        assert!(matches!(
            storage.insert_question(&q),
            Err(EurekaError::NotFound(_))
        ));
        assert!(!storage.question_exists(&q.id).unwrap());
    }

    #[test]
    fn test_answer_requires_question() {
        let (storage, _temp) = create_test_storage();
        let a = answer(&storage, "missing-question", "u1");
        assert!(matches!(
            storage.insert_answer(&a),
            Err(EurekaError::NotFound(_))
        ));
        assert!(!storage.answer_exists(&a.id).unwrap());
    }

    #[test]
    fn test_list_questions_newest_first_and_filtered() {
        let (storage, _temp) = create_test_storage();
        let theme = Theme {
            id: new_id(),
            title: "History".to_string(),
            description: None,
            category: None,
            created_by: "u1".to_string(),
            created_at: storage.next_timestamp(),
        };
        storage.insert_theme(&theme).unwrap();

        let q1 = question(&storage, "u1", Some(&theme.id));
        storage.insert_question(&q1).unwrap();
        let q2 = question(&storage, "u2", None);
        storage.insert_question(&q2).unwrap();
        let q3 = question(&storage, "u1", Some(&theme.id));
        storage.insert_question(&q3).unwrap();

        let all = storage.list_questions(&QuestionFilter::default()).unwrap();
        let ids: Vec<_> = all.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids, vec![q3.id.clone(), q2.id.clone(), q1.id.clone()]);

        let in_theme = storage
            .list_questions(&QuestionFilter {
                theme_id: Some(theme.id.clone()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(in_theme.len(), 2);

        let by_u2 = storage
            .list_questions(&QuestionFilter {
                user_id: Some("u2".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_u2.len(), 1);
        assert_eq!(by_u2[0].id, q2.id);

        assert_eq!(storage.count_questions_in_theme(&theme.id).unwrap(), 2);
        assert_eq!(storage.count_questions_by_user("u1").unwrap(), 2);
    }

    #[test]
    fn test_reassign_selected_answer_keeps_single_selection() {
        let (storage, _temp) = create_test_storage();
        let q = question(&storage, "owner", None);
        storage.insert_question(&q).unwrap();
        let r1 = answer(&storage, &q.id, "b");
        let r2 = answer(&storage, &q.id, "b");
        storage.insert_answer(&r1).unwrap();
        storage.insert_answer(&r2).unwrap();

        storage.reassign_selected_answer(&q.id, &r1.id).unwrap();
        storage.reassign_selected_answer(&q.id, &r2.id).unwrap();

        let answers = storage.answers_for_question(&q.id).unwrap();
        let selected: Vec<_> = answers.iter().filter(|a| a.is_selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, r2.id);

        let stored = storage.load_question(&q.id).unwrap().unwrap();
        assert_eq!(stored.status, QuestionStatus::Answered);
    }

    #[test]
    fn test_reassign_rejects_answer_of_other_question() {
        let (storage, _temp) = create_test_storage();
        let q1 = question(&storage, "owner", None);
        let q2 = question(&storage, "owner", None);
        storage.insert_question(&q1).unwrap();
        storage.insert_question(&q2).unwrap();
        let a = answer(&storage, &q2.id, "b");
        storage.insert_answer(&a).unwrap();

        assert!(storage.reassign_selected_answer(&q1.id, &a.id).is_err());
        let untouched = storage.load_question(&q1.id).unwrap().unwrap();
        assert_eq!(untouched.status, QuestionStatus::Open);
    }

    #[test]
    fn test_increment_upvotes() {
        let (storage, _temp) = create_test_storage();
        let q = question(&storage, "owner", None);
        storage.insert_question(&q).unwrap();
        let a = answer(&storage, &q.id, "b");
        storage.insert_answer(&a).unwrap();

        for _ in 0..5 {
            storage.increment_upvotes(&a.id).unwrap();
        }
        assert_eq!(storage.load_answer(&a.id).unwrap().unwrap().upvotes, 5);
        assert!(matches!(
            storage.increment_upvotes("missing"),
            Err(EurekaError::NotFound(_))
        ));
    }

    #[test]
    fn test_count_answers_defaults_to_zero() {
        let (storage, _temp) = create_test_storage();
        let q = question(&storage, "owner", None);
        storage.insert_question(&q).unwrap();
        assert_eq!(storage.count_answers(&q.id).unwrap(), 0);

        storage.insert_answer(&answer(&storage, &q.id, "b")).unwrap();
        assert_eq!(storage.count_answers(&q.id).unwrap(), 1);
    }

    #[test]
    fn test_comment_lifecycle() {
        let (storage, _temp) = create_test_storage();
        let q = question(&storage, "owner", None);
        storage.insert_question(&q).unwrap();

        let parent = ParentRef::Question(q.id.clone());
        let comment = Comment {
            id: new_id(),
            parent: parent.clone(),
            user_id: "b".to_string(),
            content: "Nice question".to_string(),
            created_at: storage.next_timestamp(),
        };
        storage.insert_comment(&comment).unwrap();
        assert_eq!(storage.comments_for(&parent).unwrap().len(), 1);

        // Same id under the other parent type sees nothing
        let wrong_type = ParentRef::Answer(q.id.clone());
        assert!(storage.comments_for(&wrong_type).unwrap().is_empty());

        storage.delete_comment(&comment.id, |_| Ok(())).unwrap();
        assert!(storage.load_comment(&comment.id).unwrap().is_none());
        assert!(storage.comments_for(&parent).unwrap().is_empty());
    }

    #[test]
    fn test_comment_on_missing_parent_creates_nothing() {
        let (storage, _temp) = create_test_storage();
        let comment = Comment {
            id: new_id(),
            parent: ParentRef::Answer("missing".to_string()),
            user_id: "b".to_string(),
            content: "Hello".to_string(),
            created_at: storage.next_timestamp(),
        };
        assert!(matches!(
            storage.insert_comment(&comment),
            Err(EurekaError::NotFound(_))
        ));
        assert!(storage.load_comment(&comment.id).unwrap().is_none());
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let (storage, _temp) = create_test_storage();
        let q = question(&storage, "owner", None);
        storage.insert_question(&q).unwrap();

        let result = storage.update_question(&q.id, |question| {
            question.title = "changed".to_string();
            Err(EurekaError::forbidden("nope"))
        });
        assert!(result.is_err());
        assert_eq!(
            storage.load_question(&q.id).unwrap().unwrap().title,
            q.title
        );
    }
}
