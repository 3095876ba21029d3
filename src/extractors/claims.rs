use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::{StatusCode, request::Parts};

use crate::services::auth::{NoCustomClaims, ValidatedClaims};

/// Handler-side access to the `ValidatedClaims` set by the JWT gate.
///
/// The JWT gate must have inserted `ValidatedClaims<C>` into the request
/// extensions (that type is the lookup key). If it is missing (route not behind
/// the gate, excluded, or anonymous) this rejects with 401.
#[derive(Debug, Clone)]
pub struct Claims<C = NoCustomClaims>(pub ValidatedClaims<C>);

impl<S, C> FromRequestParts<S> for Claims<C>
where
    S: Send + Sync,
    C: Clone + Send + Sync + 'static,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ValidatedClaims<C>>()
            .cloned()
            .map(Claims)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

impl<S, C> OptionalFromRequestParts<S> for Claims<C>
where
    S: Send + Sync,
    C: Clone + Send + Sync + 'static,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<ValidatedClaims<C>>().cloned().map(Claims))
    }
}
