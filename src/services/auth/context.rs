//! Per-request state handed to key resolvers and custom-claims validation.

use axum::http::{HeaderMap, HeaderValue, Method, Uri, request::Parts};

/// Borrowed view of the request being authenticated.
///
/// Inside the middleware this always wraps the request `Parts`. Out-of-band
/// callers (background jobs, tests) use [`ValidationContext::detached`].
///
/// Cancellation: validation is a plain future, dropping it (e.g. on a host
/// timeout) stops any in-flight key resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    request: Option<&'a Parts>,
}

impl<'a> ValidationContext<'a> {
    pub fn for_request(parts: &'a Parts) -> Self {
        Self {
            request: Some(parts),
        }
    }

    pub fn detached() -> Self {
        Self { request: None }
    }

    pub fn request(&self) -> Option<&'a Parts> {
        self.request
    }

    pub fn method(&self) -> Option<&'a Method> {
        self.request.map(|p| &p.method)
    }

    pub fn uri(&self) -> Option<&'a Uri> {
        self.request.map(|p| &p.uri)
    }

    pub fn headers(&self) -> Option<&'a HeaderMap> {
        self.request.map(|p| &p.headers)
    }

    pub fn header(&self, name: &str) -> Option<&'a HeaderValue> {
        self.headers().and_then(|h| h.get(name))
    }
}
