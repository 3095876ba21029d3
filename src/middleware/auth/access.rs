//! Access token (JWT) gate: validate, then put the claims into request extensions.
//!
//! Decision order, each step short-circuits:
//! 1. exclusion match            -> pass through (Excluded)
//! 2. OPTIONS w/o validation     -> pass through (Bypassed)
//! 3. no token + optional        -> pass through, no claims (Anonymous)
//!    no token + required        -> ErrorHandler(MissingToken)
//! 4. validate                   -> Granted(claims) | ErrorHandler(InvalidToken)
//!
//! Exclusion and OPTIONS checks run before extraction, so those routes never pay
//! for (or get denied by) token parsing.

use std::{fmt, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Method, Request, request::Parts},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, warn};

use super::error_handler::{DefaultErrorHandler, ErrorHandler};
use super::exclusion::{ExclusionPredicate, ExclusionUrls};
use super::extractor::{AuthHeaderExtractor, TokenExtractor};
use crate::error::AuthError;
use crate::services::auth::{TokenValidator, ValidationContext};

/// Result of running the gate on one request.
#[derive(Debug)]
pub enum Outcome<T> {
    Excluded,
    Bypassed,
    Anonymous,
    Granted(T),
    Denied(AuthError),
}

/// Long-lived, read-only gate configuration. Build once, share via `Arc`.
pub struct JwtMiddleware<V: TokenValidator> {
    validator: V,
    credentials_optional: bool,
    validate_on_options: bool,
    exclusion: Option<Arc<ExclusionPredicate>>,
    token_extractor: Arc<dyn TokenExtractor>,
    error_handler: Arc<dyn ErrorHandler>,
}

impl<V: TokenValidator + fmt::Debug> fmt::Debug for JwtMiddleware<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtMiddleware")
            .field("validator", &self.validator)
            .field("credentials_optional", &self.credentials_optional)
            .field("validate_on_options", &self.validate_on_options)
            .field("exclusion", &self.exclusion.is_some())
            .finish_non_exhaustive()
    }
}

impl<V: TokenValidator> JwtMiddleware<V> {
    pub fn builder(validator: V) -> JwtMiddlewareBuilder<V> {
        JwtMiddlewareBuilder {
            inner: JwtMiddleware {
                validator,
                credentials_optional: false,
                validate_on_options: true,
                exclusion: None,
                token_extractor: Arc::new(AuthHeaderExtractor::default()),
                error_handler: Arc::new(DefaultErrorHandler),
            },
        }
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    pub fn credentials_optional(&self) -> bool {
        self.credentials_optional
    }

    pub fn validate_on_options(&self) -> bool {
        self.validate_on_options
    }

    /// Run the gate without touching the downstream handler.
    pub async fn authenticate(&self, parts: &Parts) -> Outcome<V::Claims> {
        if self.exclusion.as_ref().is_some_and(|excluded| excluded(parts)) {
            debug!(path = %parts.uri.path(), "excluded from jwt validation");
            return Outcome::Excluded;
        }

        if !self.validate_on_options && parts.method == Method::OPTIONS {
            debug!(path = %parts.uri.path(), "OPTIONS request bypasses jwt validation");
            return Outcome::Bypassed;
        }

        let Some(token) = self.token_extractor.extract(parts) else {
            if self.credentials_optional {
                debug!(path = %parts.uri.path(), "no token, credentials optional");
                return Outcome::Anonymous;
            }
            warn!(path = %parts.uri.path(), "no token, credentials required");
            return Outcome::Denied(AuthError::MissingToken);
        };

        let ctx = ValidationContext::for_request(parts);
        match self.validator.validate_token(&ctx, &token).await {
            Ok(claims) => Outcome::Granted(claims),
            Err(err) => {
                warn!(
                    path = %parts.uri.path(),
                    stage = err.stage(),
                    error = %err,
                    "access token verification failed"
                );
                Outcome::Denied(AuthError::InvalidToken(err))
            }
        }
    }

    pub fn deny(&self, parts: &Parts, error: &AuthError) -> Response {
        self.error_handler.handle(parts, error)
    }
}

/// Builder for [`JwtMiddleware`]. Every option keeps its default unless set.
pub struct JwtMiddlewareBuilder<V: TokenValidator> {
    inner: JwtMiddleware<V>,
}

impl<V: TokenValidator> JwtMiddlewareBuilder<V> {
    /// Default: false.
    pub fn credentials_optional(mut self, value: bool) -> Self {
        self.inner.credentials_optional = value;
        self
    }

    /// Default: true.
    pub fn validate_on_options(mut self, value: bool) -> Self {
        self.inner.validate_on_options = value;
        self
    }

    /// Default: [`DefaultErrorHandler`].
    pub fn error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.inner.error_handler = Arc::new(handler);
        self
    }

    /// Default: [`AuthHeaderExtractor`].
    pub fn token_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.inner.token_extractor = Arc::new(extractor);
        self
    }

    /// Exact path or target matches that skip authentication. Default: none.
    pub fn exclusion_urls<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions(ExclusionUrls::new(urls))
    }

    /// Prebuilt exclusion list, e.g. with a public base URL for full-URL entries.
    pub fn exclusions(mut self, urls: ExclusionUrls) -> Self {
        if urls.is_empty() {
            self.inner.exclusion = None;
        } else {
            let predicate: Arc<ExclusionPredicate> = Arc::new(move |parts: &Parts| urls.matches(parts));
            self.inner.exclusion = Some(predicate);
        }
        self
    }

    /// Arbitrary exclusion predicate. Replaces `exclusion_urls`.
    pub fn exclude_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        let predicate: Arc<ExclusionPredicate> = Arc::new(predicate);
        self.inner.exclusion = Some(predicate);
        self
    }

    pub fn build(self) -> JwtMiddleware<V> {
        self.inner
    }
}

/// Layer the gate onto `router`.
///
/// ```ignore
/// let mw = Arc::new(JwtMiddleware::builder(validator).build());
/// let v1 = middleware::auth::apply(api::v1::routes(), mw);
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply<S, V>(router: Router<S>, gate: Arc<JwtMiddleware<V>>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    V: TokenValidator,
{
    router.layer(middleware::from_fn_with_state(gate, check_jwt::<V>))
}

/// The axum middleware function behind [`apply`].
pub async fn check_jwt<V: TokenValidator>(
    State(gate): State<Arc<JwtMiddleware<V>>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    match gate.authenticate(&parts).await {
        Outcome::Excluded | Outcome::Bypassed | Outcome::Anonymous => {}
        Outcome::Granted(claims) => {
            // Picked up by the `Claims` extractor.
            parts.extensions.insert(claims);
        }
        Outcome::Denied(err) => return gate.deny(&parts, &err),
    }

    next.run(Request::from_parts(parts, body)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClaimsError, ValidationError};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts "good", rejects anything else; counts calls.
    #[derive(Default)]
    struct StubValidator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenValidator for StubValidator {
        type Claims = String;

        async fn validate_token(
            &self,
            _ctx: &ValidationContext<'_>,
            token: &str,
        ) -> Result<String, ValidationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token == "good" {
                Ok("alice".to_string())
            } else {
                Err(ClaimsError::Expired.into())
            }
        }
    }

    struct CountingExtractor(Arc<AtomicUsize>);

    impl TokenExtractor for CountingExtractor {
        fn extract(&self, parts: &Parts) -> Option<String> {
            self.0.fetch_add(1, Ordering::SeqCst);
            AuthHeaderExtractor::default().extract(parts)
        }
    }

    fn parts(method: Method, uri: &str, token: Option<&str>) -> Parts {
        let mut b = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            b = b.header("authorization", format!("Bearer {t}"));
        }
        b.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn excluded_routes_skip_extraction_and_validation() {
        let extracted = Arc::new(AtomicUsize::new(0));
        let gate = JwtMiddleware::builder(StubValidator::default())
            .token_extractor(CountingExtractor(extracted.clone()))
            .exclusion_urls(["/health"])
            .build();

        for token in [None, Some("good"), Some("garbage")] {
            let outcome = gate.authenticate(&parts(Method::GET, "/health", token)).await;
            assert!(matches!(outcome, Outcome::Excluded));
        }
        assert_eq!(extracted.load(Ordering::SeqCst), 0);
        assert_eq!(gate.validator().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn options_bypass_only_when_disabled() {
        let gate = JwtMiddleware::builder(StubValidator::default())
            .validate_on_options(false)
            .build();
        for token in [None, Some("garbage")] {
            let outcome = gate.authenticate(&parts(Method::OPTIONS, "/x", token)).await;
            assert!(matches!(outcome, Outcome::Bypassed));
        }
        assert_eq!(gate.validator().calls.load(Ordering::SeqCst), 0);

        let strict = JwtMiddleware::builder(StubValidator::default()).build();
        let outcome = strict.authenticate(&parts(Method::OPTIONS, "/x", None)).await;
        assert!(matches!(outcome, Outcome::Denied(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn missing_token_depends_on_credentials_optional() {
        let optional = JwtMiddleware::builder(StubValidator::default())
            .credentials_optional(true)
            .build();
        assert!(matches!(
            optional.authenticate(&parts(Method::GET, "/x", None)).await,
            Outcome::Anonymous
        ));

        let required = JwtMiddleware::builder(StubValidator::default()).build();
        assert!(matches!(
            required.authenticate(&parts(Method::GET, "/x", None)).await,
            Outcome::Denied(AuthError::MissingToken)
        ));
        assert_eq!(required.validator().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_token_is_denied_even_when_optional() {
        let gate = JwtMiddleware::builder(StubValidator::default())
            .credentials_optional(true)
            .build();
        let outcome = gate.authenticate(&parts(Method::GET, "/x", Some("garbage"))).await;
        assert!(matches!(
            outcome,
            Outcome::Denied(AuthError::InvalidToken(ValidationError::Claims(ClaimsError::Expired)))
        ));
    }

    #[tokio::test]
    async fn valid_token_is_granted() {
        let gate = JwtMiddleware::builder(StubValidator::default()).build();
        match gate.authenticate(&parts(Method::GET, "/x", Some("good"))).await {
            Outcome::Granted(sub) => assert_eq!(sub, "alice"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_predicate_and_error_handler() {
        let gate = JwtMiddleware::builder(StubValidator::default())
            .exclude_when(|p: &Parts| p.uri.path().starts_with("/public/"))
            .error_handler(|_: &Parts, _: &AuthError| {
                axum::response::IntoResponse::into_response(StatusCode::FORBIDDEN)
            })
            .build();

        assert!(matches!(
            gate.authenticate(&parts(Method::GET, "/public/a", None)).await,
            Outcome::Excluded
        ));

        let p = parts(Method::GET, "/private", None);
        let Outcome::Denied(err) = gate.authenticate(&p).await else {
            panic!("expected denial");
        };
        assert_eq!(gate.deny(&p, &err).status(), StatusCode::FORBIDDEN);
    }
}
