//! Where the token comes from.
//!
//! Absence is not an error: extractors return `None` and the middleware decides
//! (credentials-optional or deny). Extractors never mutate the request.

use std::sync::Arc;

use axum::http::{header, request::Parts};

pub trait TokenExtractor: Send + Sync {
    fn extract(&self, parts: &Parts) -> Option<String>;
}

impl<F> TokenExtractor for F
where
    F: Fn(&Parts) -> Option<String> + Send + Sync,
{
    fn extract(&self, parts: &Parts) -> Option<String> {
        self(parts)
    }
}

/// `Authorization: Bearer <token>` (default extractor).
///
/// The scheme match is case-sensitive unless `case_insensitive()` is set.
/// A wrong scheme or an empty token is reported as absent.
#[derive(Debug, Clone)]
pub struct AuthHeaderExtractor {
    scheme: String,
    case_sensitive: bool,
}

impl Default for AuthHeaderExtractor {
    fn default() -> Self {
        Self {
            scheme: "Bearer".to_string(),
            case_sensitive: true,
        }
    }
}

impl AuthHeaderExtractor {
    pub fn with_scheme(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            case_sensitive: true,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

impl TokenExtractor for AuthHeaderExtractor {
    fn extract(&self, parts: &Parts) -> Option<String> {
        let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;

        let (scheme, token) = value.split_once(' ')?;
        let scheme_ok = if self.case_sensitive {
            scheme == self.scheme
        } else {
            scheme.eq_ignore_ascii_case(&self.scheme)
        };
        if !scheme_ok {
            return None;
        }

        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}

/// Token carried verbatim in a custom header (e.g. `X-Api-Token`).
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    name: String,
}

impl HeaderExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenExtractor for HeaderExtractor {
    fn extract(&self, parts: &Parts) -> Option<String> {
        let value = parts.headers.get(self.name.as_str())?.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Token in a cookie.
#[derive(Debug, Clone)]
pub struct CookieExtractor {
    name: String,
}

impl CookieExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenExtractor for CookieExtractor {
    fn extract(&self, parts: &Parts) -> Option<String> {
        parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    }
}

/// Token in a query parameter (e.g. `?access_token=`).
#[derive(Debug, Clone)]
pub struct QueryParamExtractor {
    name: String,
}

impl QueryParamExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenExtractor for QueryParamExtractor {
    fn extract(&self, parts: &Parts) -> Option<String> {
        let query = parts.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == self.name.as_str())
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    }
}

/// Tries each extractor in order; the first token found wins.
#[derive(Clone, Default)]
pub struct MultiExtractor {
    extractors: Vec<Arc<dyn TokenExtractor>>,
}

impl MultiExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }
}

impl TokenExtractor for MultiExtractor {
    fn extract(&self, parts: &Parts) -> Option<String> {
        self.extractors.iter().find_map(|e| e.extract(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(build: impl FnOnce(axum::http::request::Builder) -> axum::http::request::Builder) -> Parts {
        build(Request::builder().uri("/"))
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn bearer_header_is_extracted() {
        let p = parts(|b| b.header("authorization", "Bearer abc.def.ghi"));
        assert_eq!(AuthHeaderExtractor::default().extract(&p).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_malformed_header_is_absent() {
        let ex = AuthHeaderExtractor::default();
        assert_eq!(ex.extract(&parts(|b| b)), None);
        assert_eq!(ex.extract(&parts(|b| b.header("authorization", "Basic dXNlcg=="))), None);
        assert_eq!(ex.extract(&parts(|b| b.header("authorization", "Bearer"))), None);
        assert_eq!(ex.extract(&parts(|b| b.header("authorization", "Bearer   "))), None);
        assert_eq!(ex.extract(&parts(|b| b.header("authorization", "abc.def.ghi"))), None);
    }

    #[test]
    fn scheme_case_follows_configuration() {
        let p = parts(|b| b.header("authorization", "bearer abc"));
        assert_eq!(AuthHeaderExtractor::default().extract(&p), None);
        assert_eq!(
            AuthHeaderExtractor::default().case_insensitive().extract(&p).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn cookie_and_query_sources() {
        let p = parts(|b| b.header("cookie", "theme=dark; jwt=tok123; lang=en"));
        assert_eq!(CookieExtractor::new("jwt").extract(&p).as_deref(), Some("tok123"));
        assert_eq!(CookieExtractor::new("session").extract(&p), None);

        let p = parts(|b| b.uri("/ws?foo=1&access_token=tok%2E456"));
        assert_eq!(QueryParamExtractor::new("access_token").extract(&p).as_deref(), Some("tok.456"));
        assert_eq!(QueryParamExtractor::new("token").extract(&p), None);
    }

    #[test]
    fn custom_header_source() {
        let p = parts(|b| b.header("x-api-token", " tok789 "));
        assert_eq!(HeaderExtractor::new("x-api-token").extract(&p).as_deref(), Some("tok789"));
    }

    #[test]
    fn multi_extractor_uses_first_hit() {
        let ex = MultiExtractor::new()
            .with(AuthHeaderExtractor::default())
            .with(CookieExtractor::new("jwt"));

        let p = parts(|b| b.header("cookie", "jwt=from-cookie"));
        assert_eq!(ex.extract(&p).as_deref(), Some("from-cookie"));

        let p = parts(|b| {
            b.header("cookie", "jwt=from-cookie")
                .header("authorization", "Bearer from-header")
        });
        assert_eq!(ex.extract(&p).as_deref(), Some("from-header"));
    }

    #[test]
    fn closures_are_extractors() {
        let ex = |p: &Parts| p.headers.get("x-token").and_then(|v| v.to_str().ok()).map(String::from);
        assert_eq!(ex.extract(&parts(|b| b.header("x-token", "t"))).as_deref(), Some("t"));
    }
}
