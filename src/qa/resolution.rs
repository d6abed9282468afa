//! Question and answer resolution engine.
//!
//! Owns the question lifecycle. A question starts `open` and becomes
//! `answered` when its owner selects one of its answers. There is no way back
//! to `open`: selection can move to a different answer but never be removed.
//! The selected answer and the question status always change together in one
//! storage batch (see [`QaStorage::reassign_selected_answer`]).

use super::query::Lookup;
use super::storage::QaStorage;
use super::types::{new_id, Answer, Question, QuestionStatus};
use super::views::{AnswerView, QuestionView};
use crate::auth::Identity;
use crate::error::{EurekaError, Result};
use crate::validation::Validator;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Input for creating a question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewQuestion {
    #[serde(default, alias = "themeId")]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

/// Partial update of a question. Blank strings count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<QuestionStatus>,
}

impl QuestionUpdate {
    fn normalized(mut self) -> Self {
        self.title = self.title.filter(|t| !t.trim().is_empty());
        self.content = self.content.filter(|c| !c.trim().is_empty());
        self
    }

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.tags.is_none() && self.status.is_none()
    }
}

/// Input for creating an answer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAnswer {
    #[serde(default, alias = "questionId")]
    pub question_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "sourceInfo")]
    pub source_info: Option<String>,
}

/// Partial update of an answer.
///
/// `source_info` distinguishes a missing key (`None`, unchanged) from an
/// explicit null (`Some(None)`, cleared).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnswerUpdate {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "sourceInfo", deserialize_with = "deserialize_some")]
    pub source_info: Option<Option<String>>,
}

impl AnswerUpdate {
    fn normalized(mut self) -> Self {
        self.content = self.content.filter(|c| !c.trim().is_empty());
        self
    }

    fn is_empty(&self) -> bool {
        self.content.is_none() && self.source_info.is_none()
    }
}

/// Tags arrive either as a JSON array or as a string holding one.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagsInput {
    List(Vec<String>),
    Encoded(String),
}

impl TagsInput {
    fn into_tags<E: serde::de::Error>(self) -> std::result::Result<Vec<String>, E> {
        match self {
            TagsInput::List(tags) => Ok(tags),
            TagsInput::Encoded(raw) if raw.trim().is_empty() => Ok(Vec::new()),
            TagsInput::Encoded(raw) => serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|_| E::custom("tags must be a JSON array of strings")),
        }
    }
}

fn deserialize_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<TagsInput>::deserialize(deserializer)? {
        Some(input) => input.into_tags(),
        None => Ok(Vec::new()),
    }
}

fn deserialize_optional_tags<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<TagsInput>::deserialize(deserializer)?
        .map(TagsInput::into_tags)
        .transpose()
}

/// Wraps any present value, including null, in `Some`.
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone)]
pub struct ResolutionEngine {
    storage: Arc<QaStorage>,
}

impl ResolutionEngine {
    pub fn new(storage: Arc<QaStorage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self, input), fields(user_id = %owner.user_id))]
    pub fn create_question(&self, owner: &Identity, input: NewQuestion) -> Result<QuestionView> {
        let title = Validator::require(input.title.as_deref(), "Title and content are required")?;
        let content =
            Validator::require(input.content.as_deref(), "Title and content are required")?;
        Validator::validate_title(title)?;
        Validator::validate_body(content)?;
        Validator::validate_tags(&input.tags)?;

        let now = self.storage.next_timestamp();
        let question = Question {
            id: new_id(),
            theme_id: input.theme_id.filter(|t| !t.trim().is_empty()),
            user_id: owner.user_id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            tags: input.tags,
            status: QuestionStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_question(&question)?;

        info!(question_id = %question.id, "Question created");
        Lookup::new(&self.storage).question_view(question)
    }

    /// Updates the owner's question.
    ///
    /// `status` is accepted only when it agrees with the current selection:
    /// the status itself is driven by [`select_answer`](Self::select_answer).
    #[instrument(skip(self, update), fields(user_id = %actor.user_id))]
    pub fn update_question(
        &self,
        actor: &Identity,
        question_id: &str,
        update: QuestionUpdate,
    ) -> Result<QuestionView> {
        let update = update.normalized();
        if let Some(title) = &update.title {
            Validator::validate_title(title)?;
        }
        if let Some(content) = &update.content {
            Validator::validate_body(content)?;
        }
        if let Some(tags) = &update.tags {
            Validator::validate_tags(tags)?;
        }

        let now = self.storage.next_timestamp();
        let question = self.storage.update_question(question_id, |question| {
            if question.user_id != actor.user_id {
                warn!(question_id, "Update rejected: caller does not own the question");
                return Err(EurekaError::forbidden(
                    "Not authorized to update this question",
                ));
            }
            if update.is_empty() {
                return Err(EurekaError::bad_request("No fields to update"));
            }
            if let Some(status) = update.status {
                if status != question.status {
                    return Err(EurekaError::bad_request(match status {
                        QuestionStatus::Answered => {
                            "A question becomes answered by selecting an answer"
                        }
                        QuestionStatus::Open => "A question with a selected answer cannot be reopened",
                    }));
                }
            }

            if let Some(title) = update.title {
                question.title = title;
            }
            if let Some(content) = update.content {
                question.content = content;
            }
            if let Some(tags) = update.tags {
                question.tags = tags;
            }
            question.updated_at = now;
            Ok(())
        })?;

        info!(question_id, "Question updated");
        Lookup::new(&self.storage).question_view(question)
    }

    #[instrument(skip(self, input), fields(user_id = %author.user_id))]
    pub fn create_answer(&self, author: &Identity, input: NewAnswer) -> Result<AnswerView> {
        const MISSING: &str = "Question ID and content are required";
        let question_id = Validator::require(input.question_id.as_deref(), MISSING)?;
        let content = Validator::require(input.content.as_deref(), MISSING)?;
        Validator::validate_body(content)?;
        if let Some(source) = &input.source_info {
            Validator::validate_body(source)?;
        }

        let now = self.storage.next_timestamp();
        let answer = Answer {
            id: new_id(),
            question_id: question_id.to_string(),
            user_id: author.user_id.clone(),
            content: content.to_string(),
            source_info: input.source_info,
            is_selected: false,
            upvotes: 0,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_answer(&answer)?;

        info!(answer_id = %answer.id, question_id = %answer.question_id, "Answer created");
        Lookup::new(&self.storage).answer_view(answer)
    }

    /// Selects an answer on behalf of the question's owner.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub fn select_answer(&self, actor: &Identity, answer_id: &str) -> Result<AnswerView> {
        let answer = self
            .storage
            .load_answer(answer_id)?
            .ok_or_else(|| EurekaError::not_found("Answer not found"))?;
        let question = self
            .storage
            .load_question(&answer.question_id)?
            .ok_or_else(|| EurekaError::not_found("Question not found"))?;

        if question.user_id != actor.user_id {
            warn!(
                answer_id,
                question_id = %question.id,
                "Selection rejected: caller does not own the question"
            );
            return Err(EurekaError::forbidden(
                "Only the question owner can select answers",
            ));
        }

        let selected = self
            .storage
            .reassign_selected_answer(&question.id, answer_id)?;

        info!(answer_id, question_id = %question.id, "Answer selected");
        Lookup::new(&self.storage).answer_view(selected)
    }

    /// Adds one vote. Repeat calls add repeat votes.
    #[instrument(skip(self), fields(user_id = %actor.user_id))]
    pub fn upvote_answer(&self, actor: &Identity, answer_id: &str) -> Result<AnswerView> {
        let answer = self.storage.increment_upvotes(answer_id)?;
        info!(answer_id, upvotes = answer.upvotes, "Answer upvoted");
        Lookup::new(&self.storage).answer_view(answer)
    }

    #[instrument(skip(self, update), fields(user_id = %actor.user_id))]
    pub fn update_answer(
        &self,
        actor: &Identity,
        answer_id: &str,
        update: AnswerUpdate,
    ) -> Result<AnswerView> {
        let update = update.normalized();
        if let Some(content) = &update.content {
            Validator::validate_body(content)?;
        }
        if let Some(Some(source)) = &update.source_info {
            Validator::validate_body(source)?;
        }

        let now = self.storage.next_timestamp();
        let answer = self.storage.update_answer(answer_id, |answer| {
            if answer.user_id != actor.user_id {
                warn!(answer_id, "Update rejected: caller does not own the answer");
                return Err(EurekaError::forbidden("Not authorized to update this answer"));
            }
            if update.is_empty() {
                return Err(EurekaError::bad_request("No fields to update"));
            }

            if let Some(content) = update.content {
                answer.content = content;
            }
            if let Some(source_info) = update.source_info {
                answer.source_info = source_info;
            }
            answer.updated_at = now;
            Ok(())
        })?;

        info!(answer_id, "Answer updated");
        Lookup::new(&self.storage).answer_view(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qa::types::User;
    use tempfile::TempDir;

    struct Fixture {
        engine: ResolutionEngine,
        storage: Arc<QaStorage>,
        _temp: TempDir,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(QaStorage::new(temp.path()).expect("Failed to open storage"));
        Fixture {
            engine: ResolutionEngine::new(storage.clone()),
            storage,
            _temp: temp,
        }
    }

    fn member(storage: &QaStorage, name: &str) -> Identity {
        let user = User {
            id: new_id(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "hash".to_string(),
            display_name: name.to_uppercase(),
            bio: None,
            age_group: None,
            user_type: None,
            avatar_url: None,
            created_at: storage.next_timestamp(),
        };
        storage.insert_user(&user).unwrap();
        Identity {
            user_id: user.id,
            username: user.username,
            email: user.email,
        }
    }

    fn ask(engine: &ResolutionEngine, owner: &Identity) -> QuestionView {
        engine
            .create_question(
                owner,
                NewQuestion {
                    title: Some("Why is the sky blue?".to_string()),
                    content: Some("Curious".to_string()),
                    tags: vec!["physics".to_string()],
                    ..Default::default()
                },
            )
            .unwrap()
    }

    fn reply(engine: &ResolutionEngine, author: &Identity, question_id: &str) -> AnswerView {
        engine
            .create_answer(
                author,
                NewAnswer {
                    question_id: Some(question_id.to_string()),
                    content: Some("Rayleigh scattering".to_string()),
                    source_info: None,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_create_question_defaults() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let q = ask(&f.engine, &alice);
        assert_eq!(q.status, QuestionStatus::Open);
        assert_eq!(q.answer_count, 0);
        assert_eq!(q.author.display_name.as_deref(), Some("ALICE"));
    }

    #[test]
    fn test_create_question_requires_title_and_content() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let result = f.engine.create_question(
            &alice,
            NewQuestion {
                title: Some("  ".to_string()),
                content: Some("body".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(EurekaError::BadRequest(_))));
    }

    #[test]
    fn test_create_question_unknown_theme() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let result = f.engine.create_question(
            &alice,
            NewQuestion {
                theme_id: Some("no-such-theme".to_string()),
                title: Some("t".to_string()),
                content: Some("c".to_string()),
                tags: vec![],
            },
        );
        assert!(matches!(result, Err(EurekaError::NotFound(_))));
    }

    #[test]
    fn test_answer_defaults_and_missing_question() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let bob = member(&f.storage, "bob");
        let q = ask(&f.engine, &alice);

        let a = reply(&f.engine, &bob, &q.id);
        assert!(!a.is_selected);
        assert_eq!(a.upvotes, 0);

        let missing = f.engine.create_answer(
            &bob,
            NewAnswer {
                question_id: Some("missing".to_string()),
                content: Some("x".to_string()),
                source_info: None,
            },
        );
        assert!(matches!(missing, Err(EurekaError::NotFound(_))));
    }

    #[test]
    fn test_select_moves_selection() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let bob = member(&f.storage, "bob");
        let q = ask(&f.engine, &alice);
        let r1 = reply(&f.engine, &bob, &q.id);
        let r2 = reply(&f.engine, &bob, &q.id);

        f.engine.select_answer(&alice, &r1.id).unwrap();
        let selected = f.engine.select_answer(&alice, &r2.id).unwrap();
        assert!(selected.is_selected);

        let answers = f.storage.answers_for_question(&q.id).unwrap();
        assert_eq!(answers.iter().filter(|a| a.is_selected).count(), 1);
        assert!(!f.storage.load_answer(&r1.id).unwrap().unwrap().is_selected);
        assert_eq!(
            f.storage.load_question(&q.id).unwrap().unwrap().status,
            QuestionStatus::Answered
        );
    }

    #[test]
    fn test_only_owner_selects() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let bob = member(&f.storage, "bob");
        let q = ask(&f.engine, &alice);
        let r1 = reply(&f.engine, &bob, &q.id);

        assert!(matches!(
            f.engine.select_answer(&bob, &r1.id),
            Err(EurekaError::Forbidden(_))
        ));
        assert!(matches!(
            f.engine.select_answer(&alice, "missing"),
            Err(EurekaError::NotFound(_))
        ));
        assert_eq!(
            f.storage.load_question(&q.id).unwrap().unwrap().status,
            QuestionStatus::Open
        );
    }

    #[test]
    fn test_upvotes_accumulate() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let bob = member(&f.storage, "bob");
        let q = ask(&f.engine, &alice);
        let a = reply(&f.engine, &bob, &q.id);

        for _ in 0..3 {
            f.engine.upvote_answer(&alice, &a.id).unwrap();
        }
        let last = f.engine.upvote_answer(&bob, &a.id).unwrap();
        assert_eq!(last.upvotes, 4);
    }

    #[test]
    fn test_update_answer_rules() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let bob = member(&f.storage, "bob");
        let q = ask(&f.engine, &alice);
        let a = reply(&f.engine, &bob, &q.id);

        let forbidden = f.engine.update_answer(
            &alice,
            &a.id,
            AnswerUpdate {
                content: Some("hijack".to_string()),
                source_info: None,
            },
        );
        assert!(matches!(forbidden, Err(EurekaError::Forbidden(_))));

        let empty = f.engine.update_answer(&bob, &a.id, AnswerUpdate::default());
        assert!(matches!(empty, Err(EurekaError::BadRequest(_))));

        let updated = f
            .engine
            .update_answer(
                &bob,
                &a.id,
                AnswerUpdate {
                    content: None,
                    source_info: Some(Some("Wikipedia".to_string())),
                },
            )
            .unwrap();
        assert_eq!(updated.content, "Rayleigh scattering");
        assert_eq!(updated.source_info.as_deref(), Some("Wikipedia"));

        let cleared = f
            .engine
            .update_answer(
                &bob,
                &a.id,
                AnswerUpdate {
                    content: None,
                    source_info: Some(None),
                },
            )
            .unwrap();
        assert_eq!(cleared.source_info, None);
    }

    #[test]
    fn test_answer_update_distinguishes_null_from_missing() {
        let missing: AnswerUpdate = serde_json::from_str(r#"{"content":"x"}"#).unwrap();
        assert_eq!(missing.source_info, None);

        let null: AnswerUpdate = serde_json::from_str(r#"{"sourceInfo":null}"#).unwrap();
        assert_eq!(null.source_info, Some(None));
    }

    #[test]
    fn test_update_question_rules() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let bob = member(&f.storage, "bob");
        let q = ask(&f.engine, &alice);

        let forbidden = f.engine.update_question(
            &bob,
            &q.id,
            QuestionUpdate {
                title: Some("mine now".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(forbidden, Err(EurekaError::Forbidden(_))));

        let empty = f.engine.update_question(
            &alice,
            &q.id,
            QuestionUpdate {
                title: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(matches!(empty, Err(EurekaError::BadRequest(_))));

        let premature = f.engine.update_question(
            &alice,
            &q.id,
            QuestionUpdate {
                status: Some(QuestionStatus::Answered),
                ..Default::default()
            },
        );
        assert!(matches!(premature, Err(EurekaError::BadRequest(_))));

        let missing = f.engine.update_question(
            &alice,
            "missing",
            QuestionUpdate {
                title: Some("x".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(missing, Err(EurekaError::NotFound(_))));

        let updated = f
            .engine
            .update_question(
                &alice,
                &q.id,
                QuestionUpdate {
                    title: Some("Why is the sky blue at noon?".to_string()),
                    tags: Some(vec!["optics".to_string()]),
                    status: Some(QuestionStatus::Open),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Why is the sky blue at noon?");
        assert_eq!(updated.tags, vec!["optics".to_string()]);
        assert_eq!(updated.content, "Curious");
        assert!(updated.updated_at > q.updated_at);
    }

    #[test]
    fn test_tags_accept_array_or_encoded_string() {
        let encoded: NewQuestion = serde_json::from_str(
            r#"{"title":"t","content":"c","themeId":null,"tags":"[\"history\",\"egypt\"]"}"#,
        )
        .unwrap();
        assert_eq!(encoded.tags, vec!["history".to_string(), "egypt".to_string()]);

        let listed: NewQuestion =
            serde_json::from_str(r#"{"title":"t","content":"c","tags":["history"]}"#).unwrap();
        assert_eq!(listed.tags, vec!["history".to_string()]);

        let absent: NewQuestion = serde_json::from_str(r#"{"title":"t","content":"c"}"#).unwrap();
        assert!(absent.tags.is_empty());

        let blank: NewQuestion =
            serde_json::from_str(r#"{"title":"t","content":"c","tags":""}"#).unwrap();
        assert!(blank.tags.is_empty());

        assert!(serde_json::from_str::<NewQuestion>(r#"{"tags":"history, egypt"}"#).is_err());
        assert!(serde_json::from_str::<NewQuestion>(r#"{"tags":"[1, 2]"}"#).is_err());

        let update: QuestionUpdate =
            serde_json::from_str(r#"{"tags":"[\"optics\"]"}"#).unwrap();
        assert_eq!(update.tags, Some(vec!["optics".to_string()]));
        let untouched: QuestionUpdate = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(untouched.tags, None);
    }

    #[test]
    fn test_blank_update_fields_are_absent() {
        let f = fixture();
        let alice = member(&f.storage, "alice");
        let q = ask(&f.engine, &alice);
        let a = reply(&f.engine, &alice, &q.id);

        let blank_question = f.engine.update_question(
            &alice,
            &q.id,
            QuestionUpdate {
                title: Some("   ".to_string()),
                content: Some("\n\t".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(blank_question, Err(EurekaError::BadRequest(_))));

        let blank_answer = f.engine.update_answer(
            &alice,
            &a.id,
            AnswerUpdate {
                content: Some("   ".to_string()),
                source_info: None,
            },
        );
        assert!(matches!(blank_answer, Err(EurekaError::BadRequest(_))));

        let stored = f.storage.load_question(&q.id).unwrap().unwrap();
        assert_eq!(stored.title, q.title);
        let stored = f.storage.load_answer(&a.id).unwrap().unwrap();
        assert_eq!(stored.content, a.content);
    }
}
