//! HTTP handlers. Each one resolves the caller, calls one service operation
//! and wraps the result.

use super::error::ApiResult;
use super::extract::{Authenticated, JsonBody, MaybeAuthenticated, QueryParams};
use super::AppState;
use crate::qa::{
    AnswerUpdate, AnswerView, AuthResponse, CommentView, Credentials, NewAnswer, NewComment,
    NewQuestion, NewTheme, ProfileView, PublicUser, QuestionDetail, QuestionFilter,
    QuestionStatus, QuestionUpdate, QuestionView, Registration, ThemeDetail, ThemeView,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

// ============================================================================
// Query and body shapes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct QuestionListQuery {
    pub theme_id: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<String>,
}

impl QuestionListQuery {
    /// Empty parameters are ignored, like missing ones.
    fn into_filter(self) -> crate::error::Result<QuestionFilter> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Ok(QuestionFilter {
            theme_id: non_empty(self.theme_id),
            status: non_empty(self.status)
                .map(|s| s.parse::<QuestionStatus>())
                .transpose()?,
            user_id: non_empty(self.user_id),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ThemeListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub parent_type: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentEdit {
    #[serde(default)]
    pub content: Option<String>,
}

// ============================================================================
// Health
// ============================================================================

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "eureka",
        "version": crate::VERSION,
    }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}

// ============================================================================
// Accounts
// ============================================================================

#[instrument(skip(state, input))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Registration>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let response = state.accounts.register(input)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, input))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<Credentials>,
) -> ApiResult<Json<AuthResponse>> {
    Ok(Json(state.accounts.login(input)?))
}

pub async fn my_profile(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
) -> ApiResult<Json<PublicUser>> {
    Ok(Json(state.query.my_profile(&identity)?))
}

pub async fn user_profile(
    State(state): State<AppState>,
    MaybeAuthenticated(_viewer): MaybeAuthenticated,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProfileView>> {
    Ok(Json(state.query.user_profile(&user_id)?))
}

// ============================================================================
// Themes
// ============================================================================

pub async fn list_themes(
    State(state): State<AppState>,
    MaybeAuthenticated(_viewer): MaybeAuthenticated,
    QueryParams(query): QueryParams<ThemeListQuery>,
) -> ApiResult<Json<Vec<ThemeView>>> {
    let category = query.category.filter(|c| !c.is_empty());
    Ok(Json(state.query.list_themes(category.as_deref())?))
}

pub async fn get_theme(
    State(state): State<AppState>,
    MaybeAuthenticated(_viewer): MaybeAuthenticated,
    Path(theme_id): Path<String>,
) -> ApiResult<Json<ThemeDetail>> {
    Ok(Json(state.query.get_theme(&theme_id)?))
}

#[instrument(skip(state, identity, input))]
pub async fn create_theme(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    JsonBody(input): JsonBody<NewTheme>,
) -> ApiResult<(StatusCode, Json<ThemeView>)> {
    let theme = state.themes.create_theme(&identity, input)?;
    Ok((StatusCode::CREATED, Json(theme)))
}

// ============================================================================
// Questions
// ============================================================================

pub async fn list_questions(
    State(state): State<AppState>,
    MaybeAuthenticated(_viewer): MaybeAuthenticated,
    QueryParams(query): QueryParams<QuestionListQuery>,
) -> ApiResult<Json<Vec<QuestionView>>> {
    let filter = query.into_filter()?;
    Ok(Json(state.query.list_questions(&filter)?))
}

pub async fn get_question(
    State(state): State<AppState>,
    MaybeAuthenticated(_viewer): MaybeAuthenticated,
    Path(question_id): Path<String>,
) -> ApiResult<Json<QuestionDetail>> {
    Ok(Json(state.query.get_question(&question_id)?))
}

#[instrument(skip(state, identity, input))]
pub async fn create_question(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    JsonBody(input): JsonBody<NewQuestion>,
) -> ApiResult<(StatusCode, Json<QuestionView>)> {
    let question = state.resolution.create_question(&identity, input)?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[instrument(skip(state, identity, update))]
pub async fn update_question(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(question_id): Path<String>,
    JsonBody(update): JsonBody<QuestionUpdate>,
) -> ApiResult<Json<QuestionView>> {
    Ok(Json(
        state
            .resolution
            .update_question(&identity, &question_id, update)?,
    ))
}

// ============================================================================
// Answers
// ============================================================================

#[instrument(skip(state, identity, input))]
pub async fn create_answer(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    JsonBody(input): JsonBody<NewAnswer>,
) -> ApiResult<(StatusCode, Json<AnswerView>)> {
    let answer = state.resolution.create_answer(&identity, input)?;
    Ok((StatusCode::CREATED, Json(answer)))
}

#[instrument(skip(state, identity, update))]
pub async fn update_answer(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(answer_id): Path<String>,
    JsonBody(update): JsonBody<AnswerUpdate>,
) -> ApiResult<Json<AnswerView>> {
    Ok(Json(
        state.resolution.update_answer(&identity, &answer_id, update)?,
    ))
}

#[instrument(skip(state, identity))]
pub async fn select_answer(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(answer_id): Path<String>,
) -> ApiResult<Json<AnswerView>> {
    Ok(Json(state.resolution.select_answer(&identity, &answer_id)?))
}

#[instrument(skip(state, identity))]
pub async fn upvote_answer(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(answer_id): Path<String>,
) -> ApiResult<Json<AnswerView>> {
    Ok(Json(state.resolution.upvote_answer(&identity, &answer_id)?))
}

// ============================================================================
// Comments
// ============================================================================

pub async fn list_comments(
    State(state): State<AppState>,
    MaybeAuthenticated(_viewer): MaybeAuthenticated,
    QueryParams(query): QueryParams<CommentListQuery>,
) -> ApiResult<Json<Vec<CommentView>>> {
    Ok(Json(state.comments.list_comments(
        query.parent_type.as_deref(),
        query.parent_id.as_deref(),
    )?))
}

#[instrument(skip(state, identity, input))]
pub async fn create_comment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    JsonBody(input): JsonBody<NewComment>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = state.comments.create_comment(&identity, input)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state, identity, edit))]
pub async fn update_comment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(comment_id): Path<String>,
    JsonBody(edit): JsonBody<CommentEdit>,
) -> ApiResult<Json<CommentView>> {
    Ok(Json(state.comments.update_comment(
        &identity,
        &comment_id,
        edit.content.as_deref(),
    )?))
}

#[instrument(skip(state, identity))]
pub async fn delete_comment(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    Path(comment_id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.comments.delete_comment(&identity, &comment_id)?;
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}
