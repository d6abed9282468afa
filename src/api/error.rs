//! HTTP mapping of [`EurekaError`].
//!
//! Every failure is rendered as `{"error": "<message>"}`. Internal failures
//! are logged in full and reported with a generic message.

use crate::error::EurekaError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub EurekaError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            EurekaError::BadRequest(_) => StatusCode::BAD_REQUEST,
            EurekaError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            EurekaError::Forbidden(_) => StatusCode::FORBIDDEN,
            EurekaError::NotFound(_) => StatusCode::NOT_FOUND,
            EurekaError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            EurekaError::BadRequest(m)
            | EurekaError::Unauthorized(m)
            | EurekaError::Forbidden(m)
            | EurekaError::NotFound(m)
            | EurekaError::Conflict(m) => m.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<EurekaError> for ApiError {
    fn from(err: EurekaError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(EurekaError::bad_request(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(EurekaError::bad_request(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.0.is_internal() {
            error!("Request failed: {}", self.0);
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
