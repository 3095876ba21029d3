//! Key resolution contract.
//!
//! The validator never owns keys: it asks a `KeyResolver` on every call. Fetching
//! a JWKS, caching and rotation belong to the resolver implementation.

use std::{fmt, future::Future, marker::PhantomData};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};

use super::context::ValidationContext;
use crate::error::{BoxError, ConfigError};

/// Supplies verification key material for the configured algorithm.
///
/// Must be safe for concurrent calls; may block on I/O.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    async fn resolve(&self, ctx: &ValidationContext<'_>) -> Result<DecodingKey, BoxError>;
}

/// A single, fixed verification key.
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct StaticKeyResolver {
    key: DecodingKey,
}

impl fmt::Debug for StaticKeyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeyResolver").finish_non_exhaustive()
    }
}

impl StaticKeyResolver {
    pub fn new(key: DecodingKey) -> Self {
        Self { key }
    }

    /// Shared secret for the HS* family.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::new(DecodingKey::from_secret(secret))
    }

    /// PEM public key, parsed according to the algorithm family.
    pub fn from_pem(algorithm: Algorithm, pem: &str) -> Result<Self, ConfigError> {
        let pem = pem.as_bytes();
        let key = match algorithm {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => DecodingKey::from_rsa_pem(pem),
            Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(pem),
            Algorithm::EdDSA => DecodingKey::from_ed_pem(pem),
            // HS* verifies with a shared secret, never a public key.
            _ => {
                return Err(ConfigError::KeyAlgorithmMismatch {
                    algorithm: format!("{algorithm:?}"),
                    key: "public key",
                });
            }
        }
        .map_err(|source| ConfigError::InvalidKey {
            algorithm: format!("{algorithm:?}"),
            source,
        })?;

        Ok(Self::new(key))
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, _ctx: &ValidationContext<'_>) -> Result<DecodingKey, BoxError> {
        Ok(self.key.clone())
    }
}

/// Adapter returned by [`key_resolver_fn`].
pub struct FnKeyResolver<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a resolver.
///
/// The returned future must not borrow the context; copy what it needs first.
///
/// ```ignore
/// let resolver = key_resolver_fn(|_ctx| async { Ok(DecodingKey::from_secret(b"k")) });
/// ```
pub fn key_resolver_fn<F, Fut>(f: F) -> FnKeyResolver<F, Fut>
where
    F: Fn(&ValidationContext<'_>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<DecodingKey, BoxError>> + Send,
{
    FnKeyResolver {
        f,
        _fut: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> KeyResolver for FnKeyResolver<F, Fut>
where
    F: Fn(&ValidationContext<'_>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<DecodingKey, BoxError>> + Send,
{
    async fn resolve(&self, ctx: &ValidationContext<'_>) -> Result<DecodingKey, BoxError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_resolver_propagates_errors() {
        let resolver = key_resolver_fn(|_: &ValidationContext<'_>| async {
            Err::<DecodingKey, BoxError>("jwks down".into())
        });
        let err = resolver
            .resolve(&ValidationContext::detached())
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "jwks down");
    }

    #[test]
    fn pem_rejected_for_hmac_family() {
        let err = StaticKeyResolver::from_pem(Algorithm::HS256, "irrelevant").unwrap_err();
        assert!(matches!(err, ConfigError::KeyAlgorithmMismatch { key: "public key", .. }));
        assert_eq!(err.to_string(), "public key cannot verify HS256 signatures");
    }

    #[test]
    fn garbage_pem_is_a_config_error() {
        let err = StaticKeyResolver::from_pem(Algorithm::RS256, "not a pem").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKey { .. }));
    }
}
