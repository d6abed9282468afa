//! JSON-over-HTTP interface.
//!
//! All routes live under `/api`:
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | GET | `/health` | none |
//! | POST | `/auth/register`, `/auth/login` | none |
//! | GET | `/users/me/profile` | required |
//! | GET | `/users/:id` | optional |
//! | GET / POST | `/themes` | optional / required |
//! | GET | `/themes/:id` | optional |
//! | GET / POST | `/questions` | optional / required |
//! | GET / PUT | `/questions/:id` | optional / required |
//! | POST | `/answers` | required |
//! | PUT | `/answers/:id` | required |
//! | POST | `/answers/:id/select`, `/answers/:id/upvote` | required |
//! | GET / POST | `/comments` | optional / required |
//! | PUT / DELETE | `/comments/:id` | required |

pub mod error;
pub mod extract;
pub mod handlers;

use crate::auth::{IdentityGuard, TokenSigner};
use crate::qa::{AccountService, CommentEngine, QaStorage, QueryService, ResolutionEngine, ThemeCatalog};
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use extract::{Authenticated, JsonBody, MaybeAuthenticated, QueryParams};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub guard: IdentityGuard,
    pub accounts: AccountService,
    pub themes: ThemeCatalog,
    pub resolution: ResolutionEngine,
    pub comments: CommentEngine,
    pub query: QueryService,
}

impl AppState {
    pub fn new(storage: Arc<QaStorage>, signer: TokenSigner) -> Self {
        Self {
            guard: IdentityGuard::new(signer.clone()),
            accounts: AccountService::new(storage.clone(), signer),
            themes: ThemeCatalog::new(storage.clone()),
            resolution: ResolutionEngine::new(storage.clone()),
            comments: CommentEngine::new(storage.clone()),
            query: QueryService::new(storage),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("guard", &self.guard)
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

/// Builds the `/api` router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/users/me/profile", get(handlers::my_profile))
        .route("/users/:id", get(handlers::user_profile))
        .route(
            "/themes",
            get(handlers::list_themes).post(handlers::create_theme),
        )
        .route("/themes/:id", get(handlers::get_theme))
        .route(
            "/questions",
            get(handlers::list_questions).post(handlers::create_question),
        )
        .route(
            "/questions/:id",
            get(handlers::get_question).put(handlers::update_question),
        )
        .route("/answers", post(handlers::create_answer))
        .route("/answers/:id", put(handlers::update_answer))
        .route("/answers/:id/select", post(handlers::select_answer))
        .route("/answers/:id/upvote", post(handlers::upvote_answer))
        .route(
            "/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/comments/:id",
            put(handlers::update_comment).delete(handlers::delete_comment),
        );

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
