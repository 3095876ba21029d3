//! Denial responses.
//!
//! The default body is identical for every failure kind so a caller cannot
//! inspect which stage rejected the token. Overrides get the concrete error.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AuthError;

pub trait ErrorHandler: Send + Sync {
    fn handle(&self, parts: &Parts, error: &AuthError) -> Response;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Parts, &AuthError) -> Response + Send + Sync,
{
    fn handle(&self, parts: &Parts, error: &AuthError) -> Response {
        self(parts, error)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// `401` + `WWW-Authenticate: Bearer` + generic JSON body.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, _parts: &Parts, _error: &AuthError) -> Response {
        unauthorized()
    }
}

pub fn unauthorized() -> Response {
    let body = ErrorResponse {
        error: ErrorBody {
            code: "UNAUTHORIZED",
            message: "unauthorized".into(),
        },
    };

    let mut res = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    res.headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    res
}
