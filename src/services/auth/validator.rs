//! Bearer JWT validation pipeline.
//!
//! Steps, each failing closed with its own `ValidationError` variant:
//! parse -> algorithm check -> key resolution -> signature + decode ->
//! registered claims -> custom claims.

use std::{collections::HashSet, fmt, marker::PhantomData, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::Deserialize;
use tracing::debug;

use super::claims::{CustomClaims, NoCustomClaims, RawRegisteredClaims, RegisteredClaims, ValidatedClaims};
use super::clock::{Clock, SystemClock};
use super::context::ValidationContext;
use super::key_resolver::KeyResolver;
use crate::error::{ClaimsError, ConfigError, MalformedToken, ValidationError};

/// Capability the middleware depends on: turn a raw token into claims.
#[async_trait]
pub trait TokenValidator: Send + Sync + 'static {
    type Claims: Clone + Send + Sync + 'static;

    async fn validate_token(
        &self,
        ctx: &ValidationContext<'_>,
        token: &str,
    ) -> Result<Self::Claims, ValidationError>;
}

/// Expected registered-claim values. Reference time is not part of it: the
/// clock is sampled on every call.
#[derive(Debug, Clone)]
pub struct ExpectedClaims {
    pub issuer: String,
    /// Match-any. Empty set disables the audience check.
    pub audience: HashSet<String>,
    pub clock_skew: Duration,
}

impl ExpectedClaims {
    /// Check `claims` against the expectations at time `now` (Unix seconds).
    ///
    /// Boundaries are inclusive: a token with `exp == now - skew` is still valid.
    pub fn check(&self, claims: &RegisteredClaims, now: i64) -> Result<(), ClaimsError> {
        let skew = i64::try_from(self.clock_skew.as_secs()).unwrap_or(i64::MAX);

        if claims.issuer != self.issuer {
            return Err(ClaimsError::InvalidIssuer);
        }

        if !self.audience.is_empty() && !claims.audience.iter().any(|a| self.audience.contains(a)) {
            return Err(ClaimsError::InvalidAudience);
        }

        if let Some(nbf) = claims.not_before {
            if now.saturating_add(skew) < nbf {
                return Err(ClaimsError::NotValidYet);
            }
        }

        if let Some(exp) = claims.expiry {
            if now.saturating_sub(skew) > exp {
                return Err(ClaimsError::Expired);
            }
        }

        if let Some(iat) = claims.issued_at {
            if now.saturating_add(skew) < iat {
                return Err(ClaimsError::IssuedInFuture);
            }
        }

        Ok(())
    }
}

/// Long-lived, read-only validator shared across requests.
pub struct Validator<C = NoCustomClaims> {
    key_resolver: Arc<dyn KeyResolver>,
    algorithm: Algorithm,
    algorithm_id: String,
    expected: ExpectedClaims,
    clock: Arc<dyn Clock>,
    decode_custom: bool,
    _claims: PhantomData<fn() -> C>,
}

impl<C> fmt::Debug for Validator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Validator")
            .field("algorithm", &self.algorithm_id)
            .field("expected", &self.expected)
            .field("custom_claims", &self.decode_custom)
            .finish()
    }
}

impl Validator<NoCustomClaims> {
    pub fn builder() -> ValidatorBuilder<NoCustomClaims> {
        ValidatorBuilder::default()
    }
}

impl<C: CustomClaims> Validator<C> {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn expected_claims(&self) -> &ExpectedClaims {
        &self.expected
    }

    /// Run the full pipeline. No partial result is returned on any failure.
    pub async fn validate(
        &self,
        ctx: &ValidationContext<'_>,
        token: &str,
    ) -> Result<ValidatedClaims<C>, ValidationError> {
        // 1) Structure + header.
        let header = parse_header(token)?;

        // 2) Algorithm pinning. Exact string compare, so "none" or "hs256" never pass.
        if header.alg != self.algorithm_id {
            return Err(ValidationError::AlgorithmMismatch {
                expected: self.algorithm_id.clone(),
                found: header.alg,
            });
        }

        // 3) Key.
        let key = self
            .key_resolver
            .resolve(ctx)
            .await
            .map_err(ValidationError::KeyResolution)?;

        // 4) Signature, then payload shapes.
        let payload = jsonwebtoken::decode::<serde_json::Value>(token, &key, &self.signature_only())
            .map_err(map_jwt_error)?
            .claims;

        if !payload.is_object() {
            return Err(claims_decode(serde::de::Error::custom("claims must be a JSON object")));
        }
        let raw = RawRegisteredClaims::deserialize(&payload).map_err(claims_decode)?;
        let custom = if self.decode_custom {
            Some(C::deserialize(&payload).map_err(claims_decode)?)
        } else {
            None
        };

        // 5) Registered claims against a freshly sampled clock.
        let registered = RegisteredClaims::from(raw);
        let now = self.clock.now();
        self.expected.check(&registered, now)?;

        // 6) Custom claims.
        if let Some(custom) = &custom {
            custom
                .validate(ctx)
                .await
                .map_err(ValidationError::CustomClaims)?;
        }

        debug!(sub = %registered.subject, "token validated");
        Ok(ValidatedClaims::new(registered, custom))
    }

    // jsonwebtoken only verifies the signature; claim checks are ours.
    fn signature_only(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation
    }
}

#[async_trait]
impl<C: CustomClaims> TokenValidator for Validator<C> {
    type Claims = ValidatedClaims<C>;

    async fn validate_token(
        &self,
        ctx: &ValidationContext<'_>,
        token: &str,
    ) -> Result<Self::Claims, ValidationError> {
        self.validate(ctx, token).await
    }
}

#[derive(Debug, Deserialize)]
struct JoseHeader {
    alg: String,
}

fn parse_header(token: &str) -> Result<JoseHeader, MalformedToken> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(MalformedToken::SegmentCount(segments.len()));
    }

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(segments[0])?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn claims_decode(err: serde_json::Error) -> ValidationError {
    ValidationError::ClaimsDecode(Arc::new(err))
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> ValidationError {
    match err.kind() {
        // Payload that is not base64url is a structural problem.
        ErrorKind::Base64(_) | ErrorKind::Utf8(_) | ErrorKind::InvalidToken => {
            ValidationError::Parse(MalformedToken::Encoding(err))
        }
        // Claims are only decoded once the signature has verified.
        ErrorKind::Json(json) => ValidationError::ClaimsDecode(Arc::clone(json)),
        _ => ValidationError::Signature(err),
    }
}

/// Builder for [`Validator`]. Required: key resolver, algorithm, issuer, audience.
pub struct ValidatorBuilder<C = NoCustomClaims> {
    key_resolver: Option<Arc<dyn KeyResolver>>,
    algorithm: String,
    issuer: String,
    audience: Option<HashSet<String>>,
    clock_skew: Duration,
    clock: Arc<dyn Clock>,
    decode_custom: bool,
    _claims: PhantomData<fn() -> C>,
}

impl Default for ValidatorBuilder<NoCustomClaims> {
    fn default() -> Self {
        Self {
            key_resolver: None,
            algorithm: String::new(),
            issuer: String::new(),
            audience: None,
            clock_skew: Duration::ZERO,
            clock: Arc::new(SystemClock),
            decode_custom: false,
            _claims: PhantomData,
        }
    }
}

impl<C: CustomClaims> ValidatorBuilder<C> {
    pub fn key_resolver(mut self, resolver: impl KeyResolver + 'static) -> Self {
        let resolver: Arc<dyn KeyResolver> = Arc::new(resolver);
        self.key_resolver = Some(resolver);
        self
    }

    pub fn shared_key_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    /// Algorithm identifier as it appears in the JOSE header, e.g. "RS256".
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = Some(audience.into_iter().map(Into::into).collect());
        self
    }

    /// Default: zero.
    pub fn clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = skew;
        self
    }

    /// Default: [`SystemClock`].
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Also decode the payload into `T` and run its own validation.
    pub fn custom_claims<T: CustomClaims>(self) -> ValidatorBuilder<T> {
        ValidatorBuilder {
            key_resolver: self.key_resolver,
            algorithm: self.algorithm,
            issuer: self.issuer,
            audience: self.audience,
            clock_skew: self.clock_skew,
            clock: self.clock,
            decode_custom: true,
            _claims: PhantomData,
        }
    }

    pub fn build(self) -> Result<Validator<C>, ConfigError> {
        let key_resolver = self.key_resolver.ok_or(ConfigError::MissingKeyResolver)?;

        if self.algorithm.is_empty() {
            return Err(ConfigError::MissingAlgorithm);
        }
        let algorithm = Algorithm::from_str(&self.algorithm)
            .map_err(|_| ConfigError::UnsupportedAlgorithm(self.algorithm.clone()))?;

        if self.issuer.is_empty() {
            return Err(ConfigError::MissingIssuer);
        }
        let audience = self.audience.ok_or(ConfigError::MissingAudience)?;

        Ok(Validator {
            key_resolver,
            algorithm,
            algorithm_id: self.algorithm,
            expected: ExpectedClaims {
                issuer: self.issuer,
                audience,
                clock_skew: self.clock_skew,
            },
            clock: self.clock,
            decode_custom: self.decode_custom,
            _claims: PhantomData,
        })
    }
}
