//! Shared helpers for integration tests: HS256 token minting and a test key resolver.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use base64::Engine as _;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{Value, json};

use jwt_gate::{BoxError, KeyResolver, ValidationContext};

pub const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes_long_12345678";
pub const ISSUER: &str = "https://issuer.example";
pub const AUDIENCE: &str = "svc-a";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Registered claims valid for five minutes.
pub fn valid_claims() -> Value {
    let now = now();
    json!({
        "iss": ISSUER,
        "sub": "user-123",
        "aud": [AUDIENCE],
        "jti": "tok-1",
        "iat": now,
        "nbf": now,
        "exp": now + 300,
    })
}

pub fn sign(claims: &Value) -> String {
    sign_with(Algorithm::HS256, SECRET, claims)
}

pub fn sign_with(alg: Algorithm, secret: &[u8], claims: &Value) -> String {
    jsonwebtoken::encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret))
        .expect("encode test token")
}

/// Unsigned token with an arbitrary header.
pub fn unsigned(header: &Value, claims: &Value) -> String {
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.",
        b64.encode(header.to_string()),
        b64.encode(claims.to_string())
    )
}

/// Resolver over the test secret that counts how often it is asked.
#[derive(Clone, Default)]
pub struct CountingResolver {
    pub calls: Arc<AtomicUsize>,
}

impl CountingResolver {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyResolver for CountingResolver {
    async fn resolve(&self, _ctx: &ValidationContext<'_>) -> Result<DecodingKey, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DecodingKey::from_secret(SECRET))
    }
}

/// Resolver that always fails, like an unreachable JWKS endpoint.
pub struct FailingResolver;

#[async_trait]
impl KeyResolver for FailingResolver {
    async fn resolve(&self, _ctx: &ValidationContext<'_>) -> Result<DecodingKey, BoxError> {
        Err("jwks endpoint unreachable".into())
    }
}
