//! Request extractors: identity gates and JSON/query wrappers whose rejections
//! render as [`ApiError`].

use super::error::ApiError;
use super::AppState;
use crate::auth::Identity;
use crate::error::EurekaError;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// A caller that presented a valid bearer token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

/// A caller that may be anonymous. A token that is present but invalid is
/// still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Identity>);

/// Raw `Authorization` header. A value that is not visible ASCII counts as
/// a malformed credential.
fn authorization(parts: &Parts) -> Result<Option<&str>, ApiError> {
    match parts.headers.get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| ApiError(EurekaError::unauthorized("Malformed authorization header"))),
        None => Ok(None),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = authorization(parts)?;
        Ok(Self(state.guard.require(header)?))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = authorization(parts)?;
        Ok(Self(state.guard.optional(header)?))
    }
}

/// JSON body whose rejection is a `400` with the usual error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string whose rejection is a `400` with the usual error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
