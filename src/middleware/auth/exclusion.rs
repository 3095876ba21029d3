//! Routes that bypass authentication entirely.

use std::collections::HashSet;

use axum::extract::OriginalUri;
use axum::http::{Uri, request::Parts};

pub type ExclusionPredicate = dyn Fn(&Parts) -> bool + Send + Sync;

/// Exact-match exclusion list.
///
/// An entry matches when it equals one of:
/// - the request path (`/health`)
/// - the request target (`/health?check=1`)
/// - an absolute-form request URI (`http://gw.internal/ping`)
/// - the configured public base URL joined with the request target
///   (`https://api.example.com/health`), only when [`Self::public_base_url`] is set
///
/// `Host` and `X-Forwarded-*` are client-controlled and never consulted.
/// When the middleware sits under a nested router, the pre-nest URI is used.
#[derive(Debug, Clone, Default)]
pub struct ExclusionUrls {
    entries: HashSet<String>,
    public_base_url: Option<String>,
}

impl ExclusionUrls {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            public_base_url: None,
        }
    }

    /// Enable full-URL entries for origin-form requests, e.g. `https://api.example.com`.
    pub fn public_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        self.public_base_url = (!base.is_empty()).then(|| base.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matches(&self, parts: &Parts) -> bool {
        if self.entries.is_empty() {
            return false;
        }

        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|OriginalUri(u)| u)
            .unwrap_or(&parts.uri);

        if self.entries.contains(uri.path()) || self.entries.contains(&uri.to_string()) {
            return true;
        }

        self.public_url(uri)
            .is_some_and(|url| self.entries.contains(&url))
    }

    fn public_url(&self, uri: &Uri) -> Option<String> {
        // Absolute-form targets were already compared as-is.
        if uri.scheme().is_some() {
            return None;
        }

        let base = self.public_base_url.as_deref()?;
        let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Some(format!("{}{}", base, target))
    }
}
