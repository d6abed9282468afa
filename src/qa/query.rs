//! Read side: listings and detail views with joined author fields and
//! computed counts.
//!
//! Counts are never cached. Each view recounts from the storage indexes at
//! read time, and a parent with no children reports 0.

use super::storage::{QaStorage, QuestionFilter};
use super::types::{Answer, Question, Theme, User};
use super::views::{
    AnswerView, AuthorInfo, ProfileView, PublicUser, QuestionDetail, QuestionView, ThemeDetail,
    ThemeView, UserStats,
};
use crate::auth::Identity;
use crate::error::{EurekaError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Number of recent questions and answers shown on a profile.
pub const PROFILE_RECENT_LIMIT: usize = 10;

/// Per-call memo of user and theme rows, so a listing loads each author once.
pub(crate) struct Lookup<'a> {
    storage: &'a QaStorage,
    users: HashMap<String, Option<User>>,
    themes: HashMap<String, Option<Theme>>,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(storage: &'a QaStorage) -> Self {
        Self {
            storage,
            users: HashMap::new(),
            themes: HashMap::new(),
        }
    }

    pub(crate) fn user(&mut self, user_id: &str) -> Result<Option<&User>> {
        if !self.users.contains_key(user_id) {
            let user = self.storage.load_user(user_id)?;
            self.users.insert(user_id.to_string(), user);
        }
        Ok(self.users.get(user_id).and_then(Option::as_ref))
    }

    pub(crate) fn author(&mut self, user_id: &str) -> Result<AuthorInfo> {
        Ok(AuthorInfo::from_user(self.user(user_id)?))
    }

    fn theme(&mut self, theme_id: &str) -> Result<Option<&Theme>> {
        if !self.themes.contains_key(theme_id) {
            let theme = self.storage.load_theme(theme_id)?;
            self.themes.insert(theme_id.to_string(), theme);
        }
        Ok(self.themes.get(theme_id).and_then(Option::as_ref))
    }

    pub(crate) fn question_view(&mut self, question: Question) -> Result<QuestionView> {
        let author = self.author(&question.user_id)?;
        let answer_count = self.storage.count_answers(&question.id)?;
        let theme = match &question.theme_id {
            Some(theme_id) => self.theme(theme_id)?.cloned(),
            None => None,
        };
        Ok(QuestionView::new(question, author, theme.as_ref(), answer_count))
    }

    pub(crate) fn answer_view(&mut self, answer: Answer) -> Result<AnswerView> {
        let author = self.author(&answer.user_id)?;
        Ok(AnswerView::new(answer, author))
    }

    pub(crate) fn theme_view(&mut self, theme: Theme) -> Result<ThemeView> {
        let question_count = self.storage.count_questions_in_theme(&theme.id)?;
        let creator = self.user(&theme.created_by)?.cloned();
        Ok(ThemeView::new(theme, creator.as_ref(), question_count))
    }
}

/// Orders answers for display: the selected answer first, then by votes,
/// then oldest first.
pub fn display_order(a: &Answer, b: &Answer) -> Ordering {
    b.is_selected
        .cmp(&a.is_selected)
        .then_with(|| b.upvotes.cmp(&a.upvotes))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Aggregation and query service.
#[derive(Debug, Clone)]
pub struct QueryService {
    storage: Arc<QaStorage>,
}

impl QueryService {
    pub fn new(storage: Arc<QaStorage>) -> Self {
        Self { storage }
    }

    /// Questions matching the filter, newest first.
    #[instrument(skip(self))]
    pub fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<QuestionView>> {
        let questions = self.storage.list_questions(filter)?;
        let mut lookup = Lookup::new(&self.storage);
        let views = questions
            .into_iter()
            .map(|q| lookup.question_view(q))
            .collect::<Result<Vec<_>>>()?;

        debug!(count = views.len(), "Listed questions");
        Ok(views)
    }

    /// A question with all of its answers in display order.
    #[instrument(skip(self))]
    pub fn get_question(&self, question_id: &str) -> Result<QuestionDetail> {
        let question = self
            .storage
            .load_question(question_id)?
            .ok_or_else(|| EurekaError::not_found("Question not found"))?;

        let mut answers = self.storage.answers_for_question(question_id)?;
        answers.sort_by(display_order);

        let mut lookup = Lookup::new(&self.storage);
        let question = lookup.question_view(question)?;
        let answers = answers
            .into_iter()
            .map(|a| lookup.answer_view(a))
            .collect::<Result<Vec<_>>>()?;

        Ok(QuestionDetail { question, answers })
    }

    /// Themes newest first, optionally restricted to one category.
    #[instrument(skip(self))]
    pub fn list_themes(&self, category: Option<&str>) -> Result<Vec<ThemeView>> {
        let themes = self.storage.list_themes()?;
        let mut lookup = Lookup::new(&self.storage);
        themes
            .into_iter()
            .filter(|t| category.map_or(true, |c| t.category.as_deref() == Some(c)))
            .map(|t| lookup.theme_view(t))
            .collect()
    }

    /// A theme with its questions, newest first.
    #[instrument(skip(self))]
    pub fn get_theme(&self, theme_id: &str) -> Result<ThemeDetail> {
        let theme = self
            .storage
            .load_theme(theme_id)?
            .ok_or_else(|| EurekaError::not_found("Theme not found"))?;

        let questions = self.storage.list_questions(&QuestionFilter {
            theme_id: Some(theme_id.to_string()),
            ..Default::default()
        })?;

        let mut lookup = Lookup::new(&self.storage);
        let theme = lookup.theme_view(theme)?;
        let questions = questions
            .into_iter()
            .map(|q| lookup.question_view(q))
            .collect::<Result<Vec<_>>>()?;

        Ok(ThemeDetail { theme, questions })
    }

    /// Public profile with activity totals and recent activity.
    #[instrument(skip(self))]
    pub fn user_profile(&self, user_id: &str) -> Result<ProfileView> {
        let user = self
            .storage
            .load_user(user_id)?
            .ok_or_else(|| EurekaError::not_found("User not found"))?;

        let answers = self.storage.answers_by_user(user_id, None)?;
        let stats = UserStats {
            question_count: self.storage.count_questions_by_user(user_id)?,
            answer_count: answers.len(),
            total_upvotes: answers.iter().map(|a| a.upvotes).sum(),
        };

        let recent_questions = self
            .storage
            .recent_questions_by_user(user_id, PROFILE_RECENT_LIMIT)?;
        let recent_answers = answers.into_iter().take(PROFILE_RECENT_LIMIT).collect();

        Ok(ProfileView {
            user: PublicUser::from(user),
            stats,
            recent_questions,
            recent_answers,
        })
    }

    /// The caller's own account.
    pub fn my_profile(&self, identity: &Identity) -> Result<PublicUser> {
        self.storage
            .load_user(&identity.user_id)?
            .map(PublicUser::from)
            .ok_or_else(|| EurekaError::not_found("User not found"))
    }
}
