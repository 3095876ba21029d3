use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};

use super::context::ValidationContext;
use crate::error::BoxError;

/// Registered (RFC 7519) claims as they appear in the token.
///
/// - `aud` may be a single string or an array of strings.
/// - NumericDate values may be fractional; they are truncated to whole seconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRegisteredClaims {
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "audience")]
    pub aud: Vec<String>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default, deserialize_with = "numeric_date")]
    pub exp: Option<i64>,
    #[serde(default, deserialize_with = "numeric_date")]
    pub nbf: Option<i64>,
    #[serde(default, deserialize_with = "numeric_date")]
    pub iat: Option<i64>,
}

/// Registered claims of a validated token.
///
/// Fields absent from the token stay empty / `None`; nothing is fabricated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegisteredClaims {
    pub issuer: String,
    pub subject: String,
    pub audience: Vec<String>,
    pub id: String,
    pub expiry: Option<i64>,
    pub not_before: Option<i64>,
    pub issued_at: Option<i64>,
}

impl From<RawRegisteredClaims> for RegisteredClaims {
    fn from(raw: RawRegisteredClaims) -> Self {
        Self {
            issuer: raw.iss.unwrap_or_default(),
            subject: raw.sub.unwrap_or_default(),
            audience: raw.aud,
            id: raw.jti.unwrap_or_default(),
            expiry: raw.exp,
            not_before: raw.nbf,
            issued_at: raw.iat,
        }
    }
}

/// Application-defined claims that can validate themselves.
///
/// ```ignore
/// #[derive(Clone, Deserialize)]
/// struct Scoped { scope: Option<String> }
///
/// #[async_trait]
/// impl CustomClaims for Scoped {
///     async fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), BoxError> {
///         self.scope.as_deref().map(|_| ()).ok_or_else(|| "scope is required".into())
///     }
/// }
/// ```
#[async_trait]
pub trait CustomClaims: DeserializeOwned + Clone + Send + Sync + 'static {
    async fn validate(&self, ctx: &ValidationContext<'_>) -> Result<(), BoxError>;
}

/// Placeholder used when no custom claims type is configured. Never decoded.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct NoCustomClaims {}

#[async_trait]
impl CustomClaims for NoCustomClaims {
    async fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Output of a successful validation, attached to the request extensions.
///
/// Only [`Validator`](super::Validator) constructs this; there are no public
/// constructors or mutable accessors.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedClaims<C = NoCustomClaims> {
    registered: RegisteredClaims,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom: Option<C>,
}

impl<C> ValidatedClaims<C> {
    pub(crate) fn new(registered: RegisteredClaims, custom: Option<C>) -> Self {
        Self { registered, custom }
    }

    pub fn registered(&self) -> &RegisteredClaims {
        &self.registered
    }

    /// `Some` only when a custom claims type was configured.
    pub fn custom(&self) -> Option<&C> {
        self.custom.as_ref()
    }

    pub fn subject(&self) -> &str {
        &self.registered.subject
    }
}

fn audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Some(secs) = n.as_i64() {
        return Ok(Some(secs));
    }

    // Fractional (or out of i64 range) seconds: truncate toward zero.
    match n.as_f64() {
        Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(Some(f.trunc() as i64)),
        _ => Err(serde::de::Error::custom("NumericDate out of range")),
    }
}
